//! Shared constants for end-to-end tests
//!
//! When the test dataset changes, update only this file.

// ============================================================================
// Datasets
// ============================================================================

/// Three valid artists in the provided format.
pub const PROVIDED_DATASET: &str = r#"[
  {
    "name": "Kohh",
    "location": {"city": "Kita", "neighborhood": "Oji", "coordinates": "139.7365, 35.7528"},
    "categories": ["hip hop", "trap"],
    "bio": {"summary": "Rapper from Oji.", "url": "https://example.com/kohh", "birthdate": "1990-04-02", "yearsActiveStart": 2012, "yearsActiveEnd": 0},
    "spotify": {"trackId": "4uLU6hMCjMI75M1A2tKUQC"},
    "images": {"original": "https://i.scdn.co/image/kohh-large", "small": "https://i.scdn.co/image/kohh-small"},
    "socialMedia": {"instagram": "https://instagram.com/kohh", "twitter": ""}
  },
  {
    "name": "Anarchy",
    "location": {"city": "Kyoto", "coordinates": "135.7681, 34.9858"},
    "categories": ["gangsta rap"],
    "bio": {"summary": "Rapper from Mukojima."}
  },
  {
    "name": "Awich",
    "location": {"city": "Naha", "coordinates": "127.6809, 26.2124"},
    "categories": ["hip hop", "r&b", "trap"],
    "bio": {"summary": "Rapper from Okinawa."},
    "youtube": {"clipExampleUrl": "https://youtube.com/watch?v=awich"}
  }
]"#;

pub const ARTIST_A_NAME: &str = "Kohh";
pub const ARTIST_B_NAME: &str = "Anarchy";
pub const ARTIST_C_NAME: &str = "Awich";

/// Genres of the first artist, in dataset order.
pub const ARTIST_A_GENRES: &[&str] = &["hip hop", "trap"];

/// Genres of the third artist, in dataset order.
pub const ARTIST_C_GENRES: &[&str] = &["hip hop", "r&b", "trap"];

// ============================================================================
// Images
// ============================================================================

pub const CDN_BASE_URL: &str = "https://cdn.example.com";

pub const SOURCE_IMAGE_HOST: &str = "i.scdn.co";
