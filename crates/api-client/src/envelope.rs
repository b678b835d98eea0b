//! Response envelope normalization. The backend is inconsistent about where
//! it puts payloads: lists may arrive bare, under the resource name, or
//! under `data`; single records likewise.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Extracts a list from a bare array, `{<key>: [...]}` or `{data: [...]}`.
/// Any other shape is logged and read as an empty list.
pub fn list_from_envelope<T: DeserializeOwned>(
    body: Value,
    key: &str,
) -> Result<Vec<T>, serde_json::Error> {
    let items = match body {
        Value::Array(_) => body,
        Value::Object(mut map) => {
            let wrapped = map
                .remove(key)
                .filter(Value::is_array)
                .or_else(|| map.remove("data").filter(Value::is_array));
            match wrapped {
                Some(items) => items,
                None => {
                    warn!(resource = key, "Unexpected list response format");
                    return Ok(Vec::new());
                }
            }
        }
        _ => {
            warn!(resource = key, "Unexpected list response format");
            return Ok(Vec::new());
        }
    };
    serde_json::from_value(items)
}

/// Extracts a record from `{<key>: {...}}`, `{data: {...}}` or the body
/// itself.
pub fn item_from_envelope<T: DeserializeOwned>(
    body: Value,
    key: &str,
) -> Result<T, serde_json::Error> {
    let item = match body {
        Value::Object(mut map) => {
            if let Some(inner) = map.remove(key).filter(|v| !v.is_null()) {
                inner
            } else if let Some(inner) = map.remove("data").filter(|v| !v.is_null()) {
                inner
            } else {
                Value::Object(map)
            }
        }
        other => other,
    };
    serde_json::from_value(item)
}

/// Error text for a failed response: the body's `error` or `message` field,
/// else a generic status line.
pub fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "message"]
                .iter()
                .find_map(|k| v.get(k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| format!("HTTP error! status: {status}"))
}
