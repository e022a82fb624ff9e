//! Parsing of free-form `"<lng>, <lat>"` coordinate strings.

use crate::artist_store::Coordinates;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateParseError {
    #[error("expected \"<lng>, <lat>\" but found {0:?}")]
    MissingComponent(String),

    #[error("coordinate component {0:?} is not a number")]
    NotANumber(String),

    #[error("coordinate component {0:?} is not finite")]
    NotFinite(String),
}

/// Parse `"<lng>, <lat>"` into coordinates.
///
/// All whitespace is removed before splitting on `,`. At least two components
/// are required; anything after the second is ignored.
pub fn parse_coordinates(raw: &str) -> Result<Coordinates, CoordinateParseError> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let mut parts = compact.split(',');

    let (lng, lat) = match (parts.next(), parts.next()) {
        (Some(lng), Some(lat)) => (lng, lat),
        _ => return Err(CoordinateParseError::MissingComponent(raw.to_string())),
    };

    Ok(Coordinates {
        lat: parse_component(lat)?,
        lng: parse_component(lng)?,
    })
}

fn parse_component(token: &str) -> Result<f64, CoordinateParseError> {
    let value: f64 = token
        .parse()
        .map_err(|_| CoordinateParseError::NotANumber(token.to_string()))?;
    if value.is_nan() {
        return Err(CoordinateParseError::NotANumber(token.to_string()));
    }
    if !value.is_finite() {
        return Err(CoordinateParseError::NotFinite(token.to_string()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_variants_parse_identically() {
        let expected = Coordinates::new(36.1146, -95.9553);
        for raw in [
            "-95.9553, 36.1146",
            "-95.9553,36.1146",
            "  -95.9553 ,\t36.1146 ",
            "-95.9553,\n 36.1146",
        ] {
            assert_eq!(parse_coordinates(raw).unwrap(), expected, "input {:?}", raw);
        }
    }

    #[test]
    fn test_longitude_comes_first() {
        let coords = parse_coordinates("139.6917, 35.6895").unwrap();
        assert_eq!(coords.lng, 139.6917);
        assert_eq!(coords.lat, 35.6895);
    }

    #[test]
    fn test_extra_components_ignored() {
        let coords = parse_coordinates("135.5, 34.7, 12").unwrap();
        assert_eq!(coords, Coordinates::new(34.7, 135.5));
    }

    #[test]
    fn test_malformed_inputs_fail() {
        assert!(matches!(
            parse_coordinates("12.3"),
            Err(CoordinateParseError::MissingComponent(_))
        ));
        assert!(matches!(
            parse_coordinates(""),
            Err(CoordinateParseError::MissingComponent(_))
        ));
        assert!(matches!(
            parse_coordinates("abc, def"),
            Err(CoordinateParseError::NotANumber(_))
        ));
        assert!(matches!(
            parse_coordinates("139.7,"),
            Err(CoordinateParseError::NotANumber(_))
        ));
        assert!(matches!(
            parse_coordinates("NaN, 1.0"),
            Err(CoordinateParseError::NotANumber(_))
        ));
        assert!(matches!(
            parse_coordinates("inf, 1.0"),
            Err(CoordinateParseError::NotFinite(_))
        ));
    }
}
