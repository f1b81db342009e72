//! Small accessors for loosely-typed platform payloads.

use ash_core::ParseError;
use serde_json::Value;

/// Non-empty string at `key`.
pub(crate) fn str_at<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Non-empty string at a `/`-separated JSON pointer, e.g. `"/user/id"`.
pub(crate) fn str_ptr<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

pub(crate) fn required<'a>(
    value: &'a Value,
    key: &'static str,
) -> Result<&'a str, ParseError> {
    str_at(value, key).ok_or(ParseError::MissingField(key))
}

pub(crate) fn ensure_object(value: &Value) -> Result<(), ParseError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(ParseError::NotAnObject)
    }
}

/// Epoch milliseconds given either as a number or a numeric string.
pub(crate) fn millis_at(value: &Value, key: &str) -> Option<i64> {
    match value.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
