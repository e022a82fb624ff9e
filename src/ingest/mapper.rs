//! Mapping from input shapes to the storage shape.
//!
//! Mapping is pure and total: it never fails, and it never touches storage.
//! Audit timestamps are attached later by whoever performs the insert.

use super::coordinates::{parse_coordinates, CoordinateParseError};
use super::legacy::LegacyArtistData;
use super::provided::ProvidedArtistData;
use crate::artist_store::{Coordinates, NewArtist};
use chrono::{DateTime, NaiveDate};
use std::fmt;

/// Something the mapper had to paper over.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingWarning {
    /// Coordinates did not parse; the record was mapped to the (0, 0) sentinel.
    UnparsableCoordinates {
        raw: String,
        error: CoordinateParseError,
    },
}

impl fmt::Display for MappingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingWarning::UnparsableCoordinates { raw, error } => write!(
                f,
                "unparsable coordinates {:?} ({}), using (0, 0)",
                raw, error
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappedArtist {
    pub artist: NewArtist,
    pub warnings: Vec<MappingWarning>,
}

/// Empty strings count as absent.
fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Year 0 counts as absent.
fn non_zero_year(value: Option<i32>) -> Option<i32> {
    value.filter(|y| *y != 0)
}

/// Reduce ISO timestamps and plain dates to `YYYY-MM-DD`. Other text is kept.
pub fn normalize_date(value: Option<&str>) -> Option<String> {
    let raw = value.map(str::trim).filter(|v| !v.is_empty())?;
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive().format("%Y-%m-%d").to_string());
    }
    Some(raw.to_string())
}

pub fn map_provided(data: &ProvidedArtistData) -> MappedArtist {
    let mut warnings = Vec::new();

    let raw_coordinates = data.raw_coordinates().unwrap_or("");
    let coordinates = match parse_coordinates(raw_coordinates) {
        Ok(coordinates) => coordinates,
        Err(error) => {
            warnings.push(MappingWarning::UnparsableCoordinates {
                raw: raw_coordinates.to_string(),
                error,
            });
            Coordinates::SENTINEL
        }
    };

    let city = data.city().unwrap_or("").to_string();
    let bio = data.bio.as_ref();
    let social = data.social_media.as_ref();

    let artist = NewArtist {
        name: data.display_name().to_string(),
        prefecture: city.clone(),
        city,
        lat: coordinates.lat,
        lng: coordinates.lng,
        genres: data.categories.clone(),
        song_title: String::new(),
        spotify_track_id: non_empty(
            data.spotify.as_ref().and_then(|s| s.track_id.as_deref()),
        ),
        youtube_url: non_empty(
            data.youtube
                .as_ref()
                .and_then(|y| y.clip_example_url.as_deref()),
        ),
        instagram_url: non_empty(social.and_then(|s| s.instagram.as_deref())),
        twitter_url: non_empty(social.and_then(|s| s.twitter.as_deref())),
        facebook_url: non_empty(social.and_then(|s| s.facebook.as_deref())),
        youtube_channel_url: non_empty(social.and_then(|s| s.youtube_channel.as_deref())),
        tiktok_url: non_empty(social.and_then(|s| s.tiktok.as_deref())),
        original_image: non_empty(data.images.as_ref().and_then(|i| i.original.as_deref())),
        small_image: non_empty(data.images.as_ref().and_then(|i| i.small.as_deref())),
        bio_summary: non_empty(bio.and_then(|b| b.summary.as_deref())),
        bio_url: non_empty(bio.and_then(|b| b.url.as_deref())),
        birthdate: normalize_date(bio.and_then(|b| b.birthdate.as_deref())),
        deathdate: normalize_date(bio.and_then(|b| b.deathdate.as_deref())),
        years_active_start: non_zero_year(bio.and_then(|b| b.years_active_start)),
        years_active_end: non_zero_year(bio.and_then(|b| b.years_active_end)),
    };

    MappedArtist { artist, warnings }
}

pub fn map_legacy(data: &LegacyArtistData) -> MappedArtist {
    let prefecture = non_empty(data.prefecture.as_deref()).unwrap_or_else(|| data.city.clone());
    let artist = NewArtist {
        name: data.name.clone(),
        city: data.city.clone(),
        prefecture,
        lat: data.lat,
        lng: data.lng,
        genres: data.genres.clone(),
        song_title: data.song_title.clone(),
        spotify_track_id: non_empty(Some(data.spotify_track_id.as_str())),
        youtube_url: non_empty(Some(data.youtube_url.as_str())),
        instagram_url: None,
        twitter_url: None,
        facebook_url: None,
        youtube_channel_url: None,
        tiktok_url: None,
        original_image: non_empty(Some(data.original_image.as_str())),
        small_image: non_empty(Some(data.small_image.as_str())),
        bio_summary: None,
        bio_url: None,
        birthdate: None,
        deathdate: None,
        years_active_start: None,
        years_active_end: None,
    };
    MappedArtist {
        artist,
        warnings: Vec::new(),
    }
}
