//! Runtime kind tags and structural equality for instance values

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of value kinds, computed once per value before kind-specific checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// Compute the kind of a value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Lowercase name used in messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric view of a value; `None` for non-numbers and NaN
pub fn as_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| !n.is_nan())
}

/// Whether a number has no fractional part
pub fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().map_or(false, |f| f.is_finite() && f.fract() == 0.0)
        }
        _ => false,
    }
}

/// Length of a string in code points
pub fn char_length(s: &str) -> u64 {
    s.chars().count() as u64
}

/// Deep equality where `1` and `1.0` are the same number
pub fn json_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                return a == b;
            }
            if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                return a == b;
            }
            match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, x)| b.get(key).map_or(false, |y| json_equal(x, y)))
        }
        _ => left == right,
    }
}

/// Whether every element of the array is distinct under [`json_equal`]
pub fn all_unique(items: &[Value]) -> bool {
    for (i, item) in items.iter().enumerate() {
        if items[i + 1..].iter().any(|other| json_equal(item, other)) {
            return false;
        }
    }
    true
}

/// Remainder-based `multipleOf` check
pub fn is_multiple_of(value: f64, divisor: f64) -> bool {
    if divisor == 0.0 || !value.is_finite() {
        return false;
    }
    if value.fract() == 0.0 && divisor.fract() == 0.0 && value.abs() < 9.0e15 && divisor.abs() < 9.0e15 {
        return (value as i64) % (divisor as i64) == 0;
    }
    let remainder = (value % divisor).abs();
    let tolerance = divisor.abs() * 1e-9;
    remainder <= tolerance || (divisor.abs() - remainder) <= tolerance
}

/// Short rendering of a value for error messages
pub fn describe(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() > 64 {
        let head: String = rendered.chars().take(61).collect();
        format!("{}...", head)
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_kind() {
        assert_eq!(ValueKind::of(&json!(null)), ValueKind::Null);
        assert_eq!(ValueKind::of(&json!(1.5)), ValueKind::Number);
        assert_eq!(ValueKind::of(&json!({"a": 1})), ValueKind::Object);
        assert_eq!(ValueKind::Array.to_string(), "array");
    }

    #[test]
    fn test_is_integer() {
        assert!(is_integer(&json!(3)));
        assert!(is_integer(&json!(3.0)));
        assert!(!is_integer(&json!(3.5)));
        assert!(!is_integer(&json!("3")));
    }

    #[test]
    fn test_json_equal_numbers() {
        assert!(json_equal(&json!(1), &json!(1.0)));
        assert!(json_equal(&json!({"a": [1, 2]}), &json!({"a": [1.0, 2]})));
        assert!(!json_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(!json_equal(&json!(1), &json!("1")));
    }

    #[test]
    fn test_all_unique() {
        assert!(all_unique(&[json!(1), json!(2), json!("1")]));
        assert!(!all_unique(&[json!({"a": 1}), json!({"a": 1.0})]));
        assert!(all_unique(&[]));
    }

    #[test]
    fn test_is_multiple_of() {
        assert!(is_multiple_of(10.0, 5.0));
        assert!(!is_multiple_of(7.0, 5.0));
        assert!(is_multiple_of(0.3, 0.1));
        assert!(is_multiple_of(4.5, 1.5));
        assert!(!is_multiple_of(0.35, 0.1));
        assert!(!is_multiple_of(1.0, 0.0));
    }

    #[test]
    fn test_char_length_counts_code_points() {
        assert_eq!(char_length("héllo"), 5);
        assert_eq!(char_length("💩"), 1);
    }
}
