//! Lenient coercion of loosely-typed tool output
//!
//! CV parsers and scrapers return JSON whose field types drift (a string
//! where a list is expected, a numeric string for a year). These helpers
//! normalize such values instead of rejecting the whole record.

use serde_json::Value;

/// Coerce a value to a string. Lists are joined with `"; "`; null yields
/// `None`.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(scalar_to_string)
                .collect::<Vec<_>>()
                .join("; "),
        ),
        other => Some(scalar_to_string(other)),
    }
}

/// Coerce a value to a list of strings. A bare string is split on commas;
/// null yields an empty list.
pub fn value_to_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(scalar_to_string).collect(),
        Value::String(s) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        other => vec![scalar_to_string(other)],
    }
}

/// Coerce a value to an integer, defaulting to zero.
pub fn value_to_i32(value: &Value) -> i32 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or(0) as i32,
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
