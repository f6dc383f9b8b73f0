//! Flat key-value record encoding and collision-resistant key generation.
//!
//! Callers pass field values that may be plain strings or pre-serialized
//! JSON sub-objects (e.g. a judge's scoring payload). The codec normalizes
//! both into one coherent tree so downstream dotted-path extraction works
//! regardless of which form the producer used.

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::StoreError;

/// Generates a collision-resistant storage key for a record.
///
/// Format: `<timestamp-to-seconds>_<uuid-v4>_<tag>.json`. The timestamp aids
/// human browsing; the random identifier guarantees uniqueness under
/// concurrent writers without coordination.
pub fn make_record_key(tag: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let unique_id = Uuid::new_v4();
    format!("{timestamp}_{unique_id}_{tag}.json")
}

/// Reinterprets a raw field value: pre-serialized JSON documents are
/// re-nested, anything else becomes a plain string leaf.
pub fn normalize_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(parsed) => parsed,
        Err(_) => Value::String(raw.to_string()),
    }
}

/// Encodes a flat mapping of fields into a pretty-printed JSON document,
/// re-nesting any value that parses as JSON.
pub fn encode<'a, I>(fields: I) -> Result<String, StoreError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut document = Map::new();
    for (key, value) in fields {
        document.insert(key.to_string(), normalize_value(value));
    }
    Ok(serde_json::to_string_pretty(&Value::Object(document))?)
}

/// Decodes a persisted JSON document into a key-value mapping.
///
/// Fails with [`StoreError::Decode`] on malformed input; batch scans treat
/// that as "skip this record, log, continue".
pub fn decode(text: &str) -> Result<Map<String, Value>, StoreError> {
    Ok(serde_json::from_str(text)?)
}
