//! Canonical JSON encoding and numeric normalization.
//!
//! Two values are the same JSON value when their canonical encodings match:
//! object keys are sorted and integral floats are written as integers, so
//! `0` and `0.0` compare equal.

use std::collections::HashSet;
use std::fmt::Write as _;

use serde_json::{Number, Value as JsonValue};

const MAX_EXACT_INTEGER: f64 = 9_223_372_036_854_775_807.0;

/// Rewrites integral floats as integers, recursively.
pub fn normalize_numbers(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Number(number) => JsonValue::Number(normalize_number(number)),
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(normalize_numbers).collect()),
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), normalize_numbers(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn normalize_number(number: &Number) -> Number {
    if number.is_i64() || number.is_u64() {
        return number.clone();
    }
    match number.as_f64() {
        Some(float) if float.fract() == 0.0 && float.abs() < MAX_EXACT_INTEGER => {
            Number::from(float as i64)
        }
        _ => number.clone(),
    }
}

/// Builds a JSON number from a float, preferring the integer form when exact.
pub(crate) fn json_number(value: f64) -> JsonValue {
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        JsonValue::from(value as i64)
    } else {
        JsonValue::from(value)
    }
}

/// Encodes a value with sorted keys and normalized numbers.
pub fn canonical_encoding(value: &JsonValue) -> String {
    let mut out = String::new();
    write_canonical(&mut out, value);
    out
}

fn write_canonical(out: &mut String, value: &JsonValue) {
    match value {
        JsonValue::Null => out.push_str("null"),
        JsonValue::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        JsonValue::Number(number) => {
            let _ = write!(out, "{}", normalize_number(number));
        }
        JsonValue::String(text) => write_string(out, text),
        JsonValue::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        JsonValue::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (idx, key) in keys.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_canonical(out, &map[key]);
            }
            out.push('}');
        }
    }
}

fn write_string(out: &mut String, text: &str) {
    match serde_json::to_string(text) {
        Ok(encoded) => out.push_str(&encoded),
        Err(_) => out.push_str("\"\""),
    }
}

/// JSON equality where numbers compare by value.
pub fn json_equal(left: &JsonValue, right: &JsonValue) -> bool {
    canonical_encoding(left) == canonical_encoding(right)
}

/// Sorts values by their canonical encoding and drops duplicates.
pub(crate) fn sorted_unique(values: Vec<JsonValue>) -> Vec<JsonValue> {
    let mut keyed: Vec<(String, JsonValue)> = values
        .into_iter()
        .map(|value| (canonical_encoding(&value), value))
        .collect();
    keyed.sort_by(|left, right| left.0.cmp(&right.0));
    keyed.dedup_by(|left, right| left.0 == right.0);
    keyed.into_iter().map(|(_, value)| value).collect()
}

/// Sorts values by canonical encoding, keeping duplicates.
pub(crate) fn sorted(values: Vec<JsonValue>) -> Vec<JsonValue> {
    let mut keyed: Vec<(String, JsonValue)> = values
        .into_iter()
        .map(|value| (canonical_encoding(&value), value))
        .collect();
    keyed.sort_by(|left, right| left.0.cmp(&right.0));
    keyed.into_iter().map(|(_, value)| value).collect()
}

/// Keeps the first occurrence of every distinct value, in order.
pub(crate) fn dedup_preserving_order(values: Vec<JsonValue>) -> Vec<JsonValue> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(canonical_encoding(value)))
        .collect()
}

pub(crate) fn all_unique(values: &[JsonValue]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|value| seen.insert(canonical_encoding(value)))
}

#[cfg(test)]
#[path = "../../tests/internal/json_unit_tests.rs"]
mod tests;
