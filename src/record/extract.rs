//! Dotted-path extraction from nested JSON documents.

use serde_json::Value;

/// Extracts a value from a nested document by a dot-separated path.
///
/// Walks the document one segment at a time. If any segment is missing, or
/// an intermediate value is not an object, extraction stops and returns
/// `None`. Never panics.
pub fn extract<'a>(document: &'a Value, dotted_path: &str) -> Option<&'a Value> {
    let mut current = document;
    for segment in dotted_path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
