//! Serde helpers for input fields that may be `null`.

use serde::{Deserialize, Deserializer};

/// Deserialize `null` as the type's default value, so `"categories": null`
/// reads the same as a missing field.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
