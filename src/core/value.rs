//! Dynamic value rules shared by the accessor layer, the applier and validation.
//!
//! Change detection uses *loose* equality so that a rendered string such as
//! `"12"` matches a numeric model value `12` and no redundant write or change
//! notification happens:
//!
//! - `null` only equals `null`;
//! - booleans compare as `1`/`0`;
//! - a number and a string compare numerically, where a blank string is `0`
//!   and an unparsable one never matches (so `0 == ""` holds);
//! - arrays and objects compare structurally with each other and by their
//!   display string against scalars.

use serde_json::Value;

pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Bool(x), other) | (other, Value::Bool(x)) => {
            loose_eq(&Value::from(if *x { 1 } else { 0 }), other)
        }
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(_), Value::Number(_)) => to_number(a) == to_number(b),
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            to_number(a) == to_number(b)
        }
        (Value::Array(_) | Value::Object(_), Value::Array(_) | Value::Object(_)) => a == b,
        (composite @ (Value::Array(_) | Value::Object(_)), scalar)
        | (scalar, composite @ (Value::Array(_) | Value::Object(_))) => {
            loose_eq(&Value::String(display(composite)), scalar)
        }
    }
}

/// Numeric reading of a value; `NaN` when it has none.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Array(_) | Value::Object(_) => to_number(&Value::String(display(value))),
    }
}

/// The string an element shows for a value.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", f as i64)
                } else {
                    f.to_string()
                }
            }
        }
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// `null`, or nothing but whitespace once displayed.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        other => display(other).trim().is_empty(),
    }
}
