// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Helpers for the dynamic values moving through queues.

use serde_json::{Map, Value};

/// Loose truthiness: `null`, `false`, `0`, `NaN` and `""` are false, everything else true.
///
/// ```
/// use queueflow::utils::values::truthy;
/// use serde_json::json;
///
/// assert!(!truthy(&json!(0)));
/// assert!(truthy(&json!([])));
/// ```
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Convert a mapping into `[key, value]` pairs, keeping insertion order.
///
/// ```
/// use queueflow::utils::values::tuple;
/// use serde_json::json;
///
/// let pairs = tuple(json!({"a": 1, "b": 2}).as_object().unwrap());
/// assert_eq!(pairs, vec![json!(["a", 1]), json!(["b", 2])]);
/// ```
pub fn tuple(map: &Map<String, Value>) -> Vec<Value> {
    map.iter()
        .map(|(key, value)| Value::Array(vec![Value::String(key.clone()), value.clone()]))
        .collect()
}

/// Positional arguments for `exec`: arrays spread into their elements, anything
/// else becomes the single argument.
pub fn unpack_args(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}
