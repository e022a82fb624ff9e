//! Duplicate detection against the destination store.
//!
//! A candidate is a duplicate when a stored record has exactly the same name,
//! or exactly the same (lat, lng) pair. There is no tolerance radius.

use crate::artist_store::{ArtistMatch, ArtistStore, Coordinates};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

pub struct DuplicateChecker {
    store: Arc<dyn ArtistStore>,
}

impl DuplicateChecker {
    pub fn new(store: Arc<dyn ArtistStore>) -> Self {
        Self { store }
    }

    /// Stored records matching the candidate. When `coordinates` is `None`
    /// (unparsable or sentinel) only the name is compared.
    pub fn find_matches(
        &self,
        name: &str,
        coordinates: Option<Coordinates>,
    ) -> Result<Vec<ArtistMatch>> {
        self.store.find_by_name_or_coordinates(name, coordinates)
    }

    pub fn is_duplicate(&self, name: &str, coordinates: Option<Coordinates>) -> Result<bool> {
        let matches = self.find_matches(name, coordinates)?;
        if let Some(first) = matches.first() {
            debug!(
                "{} matches existing artist #{} ({})",
                name, first.id, first.name
            );
        }
        Ok(!matches.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artist_store::MockArtistStore;
    use mockall::predicate::*;

    #[test]
    fn test_match_by_name_only_without_coordinates() {
        let mut store = MockArtistStore::new();
        store
            .expect_find_by_name_or_coordinates()
            .with(eq("Kohh"), eq(None::<Coordinates>))
            .times(1)
            .returning(|_, _| {
                Ok(vec![ArtistMatch {
                    id: 7,
                    name: "Kohh".to_string(),
                }])
            });
        let checker = DuplicateChecker::new(Arc::new(store));
        assert!(checker.is_duplicate("Kohh", None).unwrap());
    }

    #[test]
    fn test_coordinates_forwarded() {
        let coords = Coordinates::new(35.0, 139.0);
        let mut store = MockArtistStore::new();
        store
            .expect_find_by_name_or_coordinates()
            .with(eq("New"), eq(Some(coords)))
            .times(1)
            .returning(|_, _| Ok(vec![]));
        let checker = DuplicateChecker::new(Arc::new(store));
        assert!(!checker.is_duplicate("New", Some(coords)).unwrap());
    }

    #[test]
    fn test_store_error_propagates() {
        let mut store = MockArtistStore::new();
        store
            .expect_find_by_name_or_coordinates()
            .returning(|_, _| Err(anyhow::anyhow!("database is locked")));
        let checker = DuplicateChecker::new(Arc::new(store));
        assert!(checker.is_duplicate("Any", None).is_err());
    }
}
