//! Normalization of the store's high-precision decimal wire format.
//!
//! The document store returns every number as an arbitrary-precision
//! decimal string. For JSON responses these must become plain integers
//! when exactly whole and floating-point numbers otherwise, applied
//! recursively through nested maps and lists.

use serde_json::Value;

/// Parses a decimal string from the store into a JSON number.
///
/// Whole values become integers, everything else a float. Returns `None`
/// when the string is not a number at all.
#[must_use]
pub fn parse_decimal(raw: &str) -> Option<Value> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::from(int));
    }
    let float: f64 = raw.parse().ok()?;
    if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        return Some(Value::from(float as i64));
    }
    Some(Value::from(float))
}

/// Recursively rewrites whole floats to integers through a JSON tree.
///
/// Applied to already-decoded values (e.g. records round-tripped through
/// `serde_json`) so that `3.0` serializes as `3`.
#[must_use]
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, normalize(v))).collect())
        }
        Value::Number(n) => {
            if let Some(float) = n.as_f64() {
                if n.as_i64().is_none()
                    && n.as_u64().is_none()
                    && float.fract() == 0.0
                    && float.abs() < i64::MAX as f64
                {
                    return Value::from(float as i64);
                }
            }
            Value::Number(n)
        }
        other => other,
    }
}

/// Lenient numeric coercion: accepts JSON numbers and numeric strings.
///
/// Used when reading coordinates and counters from schemaless records,
/// where the ingestion process has stored both representations.
#[must_use]
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_decimal_becomes_integer() {
        assert_eq!(parse_decimal("12"), Some(json!(12)));
        assert_eq!(parse_decimal("12.0"), Some(json!(12)));
        assert_eq!(parse_decimal("-3.000"), Some(json!(-3)));
    }

    #[test]
    fn fractional_decimal_becomes_float() {
        assert_eq!(parse_decimal("12.5"), Some(json!(12.5)));
        assert_eq!(parse_decimal("-0.25"), Some(json!(-0.25)));
    }

    #[test]
    fn non_numeric_decimal_is_rejected() {
        assert_eq!(parse_decimal("twelve"), None);
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn normalize_recurses_through_nested_values() {
        let input = json!({
            "counts": {"Flood": 3.0, "Wildfire": 1.5},
            "scores": [2.0, 2.5],
            "name": "Atlanta"
        });
        let expected = json!({
            "counts": {"Flood": 3, "Wildfire": 1.5},
            "scores": [2, 2.5],
            "name": "Atlanta"
        });
        assert_eq!(normalize(input), expected);
    }

    #[test]
    fn as_f64_accepts_numbers_and_numeric_strings() {
        assert_eq!(as_f64(&json!(4.5)), Some(4.5));
        assert_eq!(as_f64(&json!("33.7")), Some(33.7));
        assert_eq!(as_f64(&json!("not a number")), None);
        assert_eq!(as_f64(&json!(null)), None);
        assert_eq!(as_f64(&json!({"S": "1"})), None);
    }
}
