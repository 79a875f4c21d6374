//! Response envelope handling.
//!
//! The store API answers the same call as a bare array, a keyed object
//! (`{"product": {...}}`, `{"products": [...]}`) or the bare record.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Picks the single record out of a response: the first element of an array,
/// the value under `key`, or the object itself.
pub fn single(value: Value, key: &str) -> Option<Value> {
    match value {
        Value::Array(items) => items.into_iter().find(|item| item.is_object()),
        Value::Object(mut map) => match map.remove(key) {
            Some(inner @ Value::Object(_)) => Some(inner),
            Some(Value::Null) => None,
            Some(other) => single(other, key),
            None if map.is_empty() => None,
            None => Some(Value::Object(map)),
        },
        _ => None,
    }
}

/// Picks the record list out of a response: the array itself or the array
/// under `key`. `None` when the shape is not a list at all.
pub fn list(value: Value, key: &str) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// Decodes each element, skipping the ones that do not fit.
pub fn records<T: DeserializeOwned>(values: Vec<Value>, source: &str) -> Vec<T> {
    let total = values.len();
    let decoded: Vec<T> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(source, error = %e, "Skipping undecodable record");
                None
            }
        })
        .collect();

    if decoded.len() < total {
        warn!(source, skipped = total - decoded.len(), "Some records were skipped");
    }
    decoded
}
