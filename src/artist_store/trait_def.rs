//! ArtistStore trait definition.
//!
//! The ingestion pipeline only talks to storage through this trait, so the
//! runner and duplicate checker can be exercised against doubles.

use super::models::{ArtistMatch, ArtistRecord, AuditStamp, Coordinates, NewArtist};
use anyhow::Result;
use std::collections::HashSet;

/// Trait for artist storage backends.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait ArtistStore: Send + Sync {
    // =========================================================================
    // Connectivity
    // =========================================================================

    /// Run a trivial query to prove the store is reachable.
    fn ping(&self) -> Result<()>;

    /// Number of stored artists.
    fn count_artists(&self) -> Result<usize>;

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Records whose name matches exactly, or whose (lat, lng) matches exactly
    /// when `coordinates` is given.
    fn find_by_name_or_coordinates(
        &self,
        name: &str,
        coordinates: Option<Coordinates>,
    ) -> Result<Vec<ArtistMatch>>;

    fn get_artist(&self, id: i64) -> Result<Option<ArtistRecord>>;

    fn list_artists(&self) -> Result<Vec<ArtistRecord>>;

    /// Artists with a real location, i.e. excluding the (0, 0) sentinel.
    fn list_artists_with_location(&self) -> Result<Vec<ArtistRecord>>;

    fn list_artist_names(&self) -> Result<HashSet<String>>;

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert an artist and return it with its assigned id.
    fn insert_artist(&self, artist: &NewArtist, audit: AuditStamp) -> Result<ArtistRecord>;

    /// Replace both image locations of an artist, refreshing `updated_at`.
    /// Returns false if no artist has the given id.
    fn update_artist_images(
        &self,
        id: i64,
        original_image: Option<String>,
        small_image: Option<String>,
        updated_at: i64,
    ) -> Result<bool>;
}
