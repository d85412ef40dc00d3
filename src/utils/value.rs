// src/utils/value.rs

//! Typed accessors over loosely-shaped JSON records.
//!
//! Catalog records mix plain strings with `{"content": ...}` wrappers and
//! single objects with lists. These helpers normalize both so the extractor
//! only ever sees `Option<String>` and slices of values.

use serde_json::Value;

/// Follow `keys` through nested objects.
///
/// An array met on the way is entered through its first element. Any missing
/// container yields `None`.
pub fn path<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in keys {
        current = first(current)?.get(key)?;
    }
    Some(current)
}

/// Normalize a text-ish value to a trimmed, non-empty string.
///
/// Accepts a plain string, a number, a `{"content": ...}` wrapper, or a list
/// whose first element is one of those.
pub fn as_text(value: Option<&Value>) -> Option<String> {
    let text = match first(value?)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => return as_text(map.get("content")),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Normalize a single-or-many value to a list. Null and absent become empty.
pub fn as_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter(|v| !v.is_null()).collect(),
        Some(other) => vec![other],
    }
}

fn first(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        Value::Null => None,
        other => Some(other),
    }
}
