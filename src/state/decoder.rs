use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::{ScraperError, ScraperResult};

/// Longest payload prefix quoted back in a decode error
pub const EXCERPT_CHARS: usize = 500;

/// A record type the page state can be decoded into.
pub trait Record: DeserializeOwned {
    /// Name used in decode errors
    const SHAPE: &'static str;
}

/// Decode a single record
pub fn decode_record<T: Record>(payload: &str) -> ScraperResult<T> {
    decode(payload, T::SHAPE.to_string())
}

/// Decode a JSON array of records, keeping their order
pub fn decode_list<T: Record>(payload: &str) -> ScraperResult<Vec<T>> {
    decode(payload, format!("list of {}", T::SHAPE))
}

fn decode<T: DeserializeOwned>(payload: &str, shape: String) -> ScraperResult<T> {
    serde_json::from_str(payload).map_err(|source| {
        let excerpt = excerpt(payload);
        tracing::error!(
            shape = %shape,
            payload_len = payload.len(),
            excerpt = %excerpt,
            "Failed to decode page state"
        );
        ScraperError::Decode {
            shape,
            excerpt,
            source,
        }
    })
}

/// First [`EXCERPT_CHARS`] characters of `payload`, cut on a char boundary
pub fn excerpt(payload: &str) -> String {
    payload.chars().take(EXCERPT_CHARS).collect()
}

/// Deserialize `null` as the field's zero value.
///
/// Pair with `#[serde(default)]` so absent fields are covered too.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let value = Option::<T>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
