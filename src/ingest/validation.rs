//! Structural validation of input records before mapping.
//!
//! Every rule is evaluated so the caller sees all problems at once.

use super::coordinates::parse_coordinates;
use super::legacy::LegacyArtistData;
use super::provided::ProvidedArtistData;

fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

/// Check a provided record for its required fields. An empty result means valid.
///
/// Coordinates are only checked structurally (present and comma-delimited);
/// numeric validity is left to the mapper unless [`strict_coordinate_error`]
/// is consulted as well.
pub fn validate_provided(data: &ProvidedArtistData) -> Vec<String> {
    let mut errors = Vec::new();

    if is_blank(data.name.as_deref()) {
        errors.push("name is required".to_string());
    }

    if is_blank(data.city()) {
        errors.push("location.city is required".to_string());
    }

    match data.raw_coordinates() {
        Some(coords) if coords.contains(',') => {}
        _ => errors.push("location.coordinates must be given as 'lng, lat'".to_string()),
    }

    if data.categories.is_empty() {
        errors.push("at least one category is required".to_string());
    }

    if is_blank(data.bio_summary()) {
        errors.push("bio.summary is required".to_string());
    }

    errors
}

/// Error for coordinates that are structurally present but do not parse.
///
/// Used when unparsable coordinates should reject the record instead of
/// falling back to the (0, 0) sentinel.
pub fn strict_coordinate_error(data: &ProvidedArtistData) -> Option<String> {
    let raw = data.raw_coordinates().filter(|c| c.contains(','))?;
    parse_coordinates(raw)
        .err()
        .map(|e| format!("location.coordinates could not be parsed: {}", e))
}

pub fn validate_legacy(data: &LegacyArtistData) -> Vec<String> {
    let mut errors = Vec::new();
    if data.name.trim().is_empty() {
        errors.push("name is required".to_string());
    }
    if !data.lat.is_finite() || !data.lng.is_finite() {
        errors.push(format!(
            "coordinates must be finite (lat={}, lng={})",
            data.lat, data.lng
        ));
    }
    errors
}
