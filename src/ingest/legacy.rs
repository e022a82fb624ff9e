//! The flat legacy artist shape used by the seed data and the Spotify export.

use super::nullable::null_as_default;
use serde::{Deserialize, Serialize};

/// Flat artist record. Empty strings and `null` mean "absent". Coordinates
/// have no absent value, so a `null` lat or lng fails the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyArtistData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefecture: Option<String>,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub song_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spotify_track_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_image: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub small_image: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub youtube_url: String,
}
