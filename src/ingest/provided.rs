//! The nested "provided data" input shape.
//!
//! Required fields are still modelled as optional so that a record missing one
//! deserializes and is then reported by validation instead of failing the
//! whole dataset load.

use super::nullable::null_as_default;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedArtistData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<ProvidedLocation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub bio: Option<ProvidedBio>,
    #[serde(default)]
    pub youtube: Option<ProvidedYoutube>,
    #[serde(default)]
    pub spotify: Option<ProvidedSpotify>,
    #[serde(default)]
    pub images: Option<ProvidedImages>,
    #[serde(default)]
    pub social_media: Option<ProvidedSocialMedia>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedLocation {
    #[serde(default)]
    pub city: Option<String>,
    /// Not used by the mapper.
    #[serde(default)]
    pub neighborhood: Option<String>,
    /// `"<lng>, <lat>"`
    #[serde(default)]
    pub coordinates: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedBio {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub birthdate: Option<String>,
    #[serde(default)]
    pub deathdate: Option<String>,
    #[serde(default)]
    pub years_active_start: Option<i32>,
    #[serde(default)]
    pub years_active_end: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedYoutube {
    #[serde(default)]
    pub clip_example_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedSpotify {
    #[serde(default)]
    pub track_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedImages {
    #[serde(default)]
    pub original: Option<String>,
    #[serde(default)]
    pub small: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedSocialMedia {
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub youtube_channel: Option<String>,
    #[serde(default)]
    pub tiktok: Option<String>,
}

impl ProvidedArtistData {
    /// The record's name, or an empty string when absent.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn city(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.city.as_deref())
    }

    pub fn raw_coordinates(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.coordinates.as_deref())
    }

    pub fn bio_summary(&self) -> Option<&str> {
        self.bio.as_ref().and_then(|b| b.summary.as_deref())
    }
}
