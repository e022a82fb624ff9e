//! Loading a static batch of input records and summarizing it.

use super::coordinates::parse_coordinates;
use super::legacy::LegacyArtistData;
use super::mapper::{map_legacy, map_provided, MappedArtist};
use super::provided::ProvidedArtistData;
use super::validation::{strict_coordinate_error, validate_legacy, validate_provided};
use crate::artist_store::Coordinates;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;

const TOP_CITIES: usize = 10;

/// Which input shape a dataset file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    /// Nested records with location, bio and social blocks.
    #[default]
    Provided,
    /// Flat records as produced by the seed data and the Spotify export.
    Legacy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatasetRecord {
    Provided(ProvidedArtistData),
    Legacy(LegacyArtistData),
    /// An array element that does not have the dataset's shape. It fails
    /// validation like any other invalid record.
    Malformed { name: String, error: String },
}

impl DatasetRecord {
    pub fn name(&self) -> &str {
        match self {
            DatasetRecord::Provided(data) => data.display_name(),
            DatasetRecord::Legacy(data) => &data.name,
            DatasetRecord::Malformed { name, .. } => name,
        }
    }

    pub fn city(&self) -> &str {
        match self {
            DatasetRecord::Provided(data) => data.city().unwrap_or(""),
            DatasetRecord::Legacy(data) => &data.city,
            DatasetRecord::Malformed { .. } => "",
        }
    }

    pub fn categories(&self) -> &[String] {
        match self {
            DatasetRecord::Provided(data) => &data.categories,
            DatasetRecord::Legacy(data) => &data.genres,
            DatasetRecord::Malformed { .. } => &[],
        }
    }

    /// All validation errors for this record; empty means valid.
    pub fn validate(&self, strict_coordinates: bool) -> Vec<String> {
        match self {
            DatasetRecord::Provided(data) => {
                let mut errors = validate_provided(data);
                if strict_coordinates {
                    errors.extend(strict_coordinate_error(data));
                }
                errors
            }
            DatasetRecord::Legacy(data) => validate_legacy(data),
            DatasetRecord::Malformed { error, .. } => vec![format!("malformed record: {}", error)],
        }
    }

    /// Coordinates to use for duplicate matching, if the record has a real
    /// location. Unparsable coordinates and the sentinel yield `None`.
    pub fn match_coordinates(&self) -> Option<Coordinates> {
        let coordinates = match self {
            DatasetRecord::Provided(data) => parse_coordinates(data.raw_coordinates()?).ok()?,
            DatasetRecord::Legacy(data) => Coordinates::new(data.lat, data.lng),
            DatasetRecord::Malformed { .. } => return None,
        };
        (coordinates.is_finite() && !coordinates.is_sentinel()).then_some(coordinates)
    }

    /// The storage shape of this record. `None` for a malformed record.
    pub fn map(&self) -> Option<MappedArtist> {
        match self {
            DatasetRecord::Provided(data) => Some(map_provided(data)),
            DatasetRecord::Legacy(data) => Some(map_legacy(data)),
            DatasetRecord::Malformed { .. } => None,
        }
    }
}

/// Convert one array element, keeping a conversion failure as a
/// `Malformed` record instead of failing the whole dataset.
fn parse_record<T: DeserializeOwned>(
    value: Value,
    wrap: impl FnOnce(T) -> DatasetRecord,
) -> DatasetRecord {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    match serde_json::from_value::<T>(value) {
        Ok(data) => wrap(data),
        Err(e) => DatasetRecord::Malformed {
            name,
            error: e.to_string(),
        },
    }
}

/// Parse a JSON array of records. Only a document that is not a JSON array
/// is an error; elements of the wrong shape become `Malformed` records.
pub fn parse_dataset(content: &str, format: DatasetFormat) -> Result<Vec<DatasetRecord>> {
    let values: Vec<Value> = serde_json::from_str(content)?;
    let records = values
        .into_iter()
        .map(|value| match format {
            DatasetFormat::Provided => parse_record(value, DatasetRecord::Provided),
            DatasetFormat::Legacy => parse_record(value, DatasetRecord::Legacy),
        })
        .collect();
    Ok(records)
}

/// Load a JSON array of records from `path`.
pub fn load_dataset(path: &Path, format: DatasetFormat) -> Result<Vec<DatasetRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {:?}", path))?;
    parse_dataset(&content, format)
        .with_context(|| format!("Failed to parse {:?} dataset: {:?}", format, path))
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub total: usize,
    /// Every category with its record count, most frequent first.
    pub categories: Vec<(String, usize)>,
    /// The most frequent cities, most frequent first.
    pub top_cities: Vec<(String, usize)>,
}

/// Count occurrences, keeping first-seen order among equal counts.
fn ranked_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<&'a str, usize> = HashMap::new();
    for value in values {
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            order.push(value.to_string());
        }
        *count += 1;
    }
    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|value| {
            let count = counts.get(value.as_str()).copied().unwrap_or(0);
            (value, count)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

pub fn summarize(records: &[DatasetRecord]) -> DatasetSummary {
    let categories = ranked_counts(
        records
            .iter()
            .flat_map(|r| r.categories().iter().map(String::as_str)),
    );
    let mut top_cities = ranked_counts(records.iter().map(|r| r.city()));
    top_cities.truncate(TOP_CITIES);

    DatasetSummary {
        total: records.len(),
        categories,
        top_cities,
    }
}

/// Names that occur more than once within the dataset, in first-repeat order.
pub fn find_duplicate_names(records: &[DatasetRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for record in records {
        let name = record.name();
        if !seen.insert(name) && reported.insert(name) {
            duplicates.push(name.to_string());
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROVIDED: &str = r#"[
        {"name": "A", "location": {"city": "Tokyo", "coordinates": "139.7, 35.6"}, "categories": ["hip hop", "trap"], "bio": {"summary": "a"}},
        {"name": "B", "location": {"city": "Osaka", "coordinates": "135.5, 34.7"}, "categories": ["trap"], "bio": {"summary": "b"}},
        {"name": "A", "location": {"city": "Tokyo", "coordinates": "bad, data"}, "categories": ["trap", "drill"], "bio": {"summary": "c"}}
    ]"#;

    #[test]
    fn test_parse_provided_dataset() {
        let records = parse_dataset(PROVIDED, DatasetFormat::Provided).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].name(), "B");
        assert_eq!(
            records[0].match_coordinates(),
            Some(Coordinates::new(35.6, 139.7))
        );
        assert_eq!(records[2].match_coordinates(), None);
    }

    #[test]
    fn test_parse_legacy_dataset() {
        let json = r#"[{"name": "C", "city": "", "lat": 0, "lng": 0, "genres": ["j-rap"]}]"#;
        let records = parse_dataset(json, DatasetFormat::Legacy).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].validate(false).is_empty());
        assert_eq!(records[0].match_coordinates(), None);
    }

    #[test]
    fn test_strict_coordinates_adds_error() {
        let records = parse_dataset(PROVIDED, DatasetFormat::Provided).unwrap();
        assert!(records[2].validate(false).is_empty());
        assert_eq!(records[2].validate(true).len(), 1);
    }

    #[test]
    fn test_summary_ordering() {
        let records = parse_dataset(PROVIDED, DatasetFormat::Provided).unwrap();
        let summary = summarize(&records);
        assert_eq!(summary.total, 3);
        assert_eq!(
            summary.categories,
            vec![
                ("trap".to_string(), 3),
                ("hip hop".to_string(), 1),
                ("drill".to_string(), 1),
            ]
        );
        assert_eq!(
            summary.top_cities,
            vec![("Tokyo".to_string(), 2), ("Osaka".to_string(), 1)]
        );
    }

    #[test]
    fn test_top_cities_truncated() {
        let records: Vec<DatasetRecord> = (0..15)
            .map(|i| {
                DatasetRecord::Legacy(LegacyArtistData {
                    name: format!("artist{}", i),
                    city: format!("city{}", i),
                    ..Default::default()
                })
            })
            .collect();
        assert_eq!(summarize(&records).top_cities.len(), TOP_CITIES);
    }

    #[test]
    fn test_find_duplicate_names() {
        let records = parse_dataset(PROVIDED, DatasetFormat::Provided).unwrap();
        assert_eq!(find_duplicate_names(&records), vec!["A".to_string()]);
        assert!(find_duplicate_names(&records[..2]).is_empty());
    }

    #[test]
    fn test_null_categories_is_a_validation_error() {
        let json = r#"[
            {"name": "A", "location": {"city": "Tokyo", "coordinates": "139.7, 35.6"}, "categories": ["hip hop"], "bio": {"summary": "a"}},
            {"name": "B", "location": {"city": "Osaka", "coordinates": "135.5, 34.7"}, "categories": null, "bio": {"summary": "b"}}
        ]"#;
        let records = parse_dataset(json, DatasetFormat::Provided).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].validate(false).is_empty());
        assert_eq!(
            records[1].validate(false),
            vec!["at least one category is required".to_string()]
        );
    }

    #[test]
    fn test_malformed_element_does_not_fail_the_dataset() {
        let json = r#"[
            {"name": "C", "city": "Sendai", "lat": 38.26, "lng": 140.87, "genres": ["j-rap"]},
            {"name": "D", "city": "Sendai", "lat": null, "lng": 140.87},
            42
        ]"#;
        let records = parse_dataset(json, DatasetFormat::Legacy).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records[0].validate(false).is_empty());

        assert_eq!(records[1].name(), "D");
        let errors = records[1].validate(false);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("malformed record:"));
        assert!(records[1].map().is_none());
        assert_eq!(records[1].match_coordinates(), None);

        assert_eq!(records[2].name(), "");
        assert_eq!(records[2].validate(false).len(), 1);
    }

    #[test]
    fn test_non_array_document_errors() {
        assert!(parse_dataset(r#"{"name": "A"}"#, DatasetFormat::Provided).is_err());
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = load_dataset(Path::new("/nonexistent/artists.json"), DatasetFormat::Provided);
        assert!(result.is_err());
    }
}
