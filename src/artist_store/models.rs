//! Storage models for artist records.
//!
//! `NewArtist` is what the ingestion pipeline produces; `ArtistRecord` is what
//! the store hands back once an id and audit timestamps have been assigned.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// The reserved "no real location known" pair.
    pub const SENTINEL: Coordinates = Coordinates { lat: 0.0, lng: 0.0 };

    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_sentinel(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// An artist ready to be inserted, without id or audit fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArtist {
    pub name: String,
    pub city: String,
    pub prefecture: String,
    pub lat: f64,
    pub lng: f64,
    pub genres: Vec<String>,
    pub song_title: String,
    pub spotify_track_id: Option<String>,
    pub youtube_url: Option<String>,
    pub instagram_url: Option<String>,
    pub twitter_url: Option<String>,
    pub facebook_url: Option<String>,
    pub youtube_channel_url: Option<String>,
    pub tiktok_url: Option<String>,
    pub original_image: Option<String>,
    pub small_image: Option<String>,
    pub bio_summary: Option<String>,
    pub bio_url: Option<String>,
    pub birthdate: Option<String>,
    pub deathdate: Option<String>,
    pub years_active_start: Option<i32>,
    pub years_active_end: Option<i32>,
}

impl NewArtist {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

/// Creation and update timestamps, in unix seconds.
///
/// Always supplied by the caller performing the write, never by the input data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub created_at: i64,
    pub updated_at: i64,
}

impl AuditStamp {
    pub fn now() -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            created_at: now,
            updated_at: now,
        }
    }
}

/// A persisted artist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub id: i64,
    #[serde(flatten)]
    pub artist: NewArtist,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ArtistRecord {
    pub fn name(&self) -> &str {
        &self.artist.name
    }
}

/// Minimal view of an existing record returned by duplicate lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistMatch {
    pub id: i64,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_detection() {
        assert!(Coordinates::SENTINEL.is_sentinel());
        assert!(Coordinates::new(0.0, -0.0).is_sentinel());
        assert!(!Coordinates::new(0.0, 139.7).is_sentinel());
    }

    #[test]
    fn test_finite_check() {
        assert!(Coordinates::new(35.6, 139.7).is_finite());
        assert!(!Coordinates::new(f64::NAN, 139.7).is_finite());
        assert!(!Coordinates::new(35.6, f64::INFINITY).is_finite());
    }
}
