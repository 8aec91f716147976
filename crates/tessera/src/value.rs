//! Classification and comparison of data values.
//!
//! Render data is a [`serde_json::Value`]. The engine sorts every value into
//! one of four shapes:
//!
//! - **scalar**: string, number or boolean
//! - **list**: a JSON array, used positionally when formatting
//! - **temporal**: an object of the form `{"$datetime": "..."}`, formatted
//!   with strftime patterns
//! - **map**: any other object, addressable by selector but never printed
//!
//! `null` is treated as absent everywhere.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Number, Value};

/// Object key marking a temporal value.
pub const TEMPORAL_KEY: &str = "$datetime";

/// Returns true for strings, numbers and booleans.
pub fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// Wraps an RFC 3339 timestamp (or `YYYY-MM-DD`) as a temporal value.
pub fn temporal_value(timestamp: impl Into<String>) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(TEMPORAL_KEY.to_string(), Value::String(timestamp.into()));
    Value::Object(map)
}

/// Parses a temporal value.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` (read as UTC) and `YYYY-MM-DD`
/// (midnight UTC).
pub fn temporal(value: &Value) -> Option<DateTime<FixedOffset>> {
    let Value::Object(map) = value else {
        return None;
    };
    if map.len() != 1 {
        return None;
    }
    let raw = map.get(TEMPORAL_KEY)?.as_str()?.trim();

    if let Ok(moment) = DateTime::parse_from_rfc3339(raw) {
        return Some(moment);
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    Some(Utc.from_utc_datetime(&naive).into())
}

/// Formats a moment with a strftime pattern.
///
/// Returns `None` when the pattern contains an invalid specifier.
pub fn format_temporal(moment: &DateTime<FixedOffset>, pattern: &str) -> Option<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }
    let mut out = String::new();
    write!(out, "{}", moment.format_with_items(items.iter())).ok()?;
    Some(out)
}

/// Emptiness as used by conditions: absent, `false`, `0`, `0.0`, `""`,
/// `"0"`, and empty arrays or objects are empty.
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty() || s == "0",
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
    }
}

/// Loose equality between a datum and a literal attribute value.
///
/// Numeric text on both sides compares by number, so `"1.0"` equals `1`.
/// Booleans compare by the literal's truthiness. Absent data equals only
/// the empty literal; containers equal nothing.
pub fn loosely_equals(value: Option<&Value>, literal: &str) -> bool {
    match value {
        None | Some(Value::Null) => literal.is_empty(),
        Some(Value::Bool(b)) => *b == !(literal.is_empty() || literal == "0"),
        Some(Value::Number(n)) => match (n.as_f64(), parse_numeric(literal)) {
            (Some(a), Some(b)) => a == b,
            _ => number_text(n) == literal,
        },
        Some(Value::String(s)) => match (parse_numeric(s), parse_numeric(literal)) {
            (Some(a), Some(b)) => a == b,
            _ => s == literal,
        },
        Some(Value::Array(_)) | Some(Value::Object(_)) => false,
    }
}

/// Text form of a scalar; `None` for everything else.
///
/// `true` prints as `1` and `false` as the empty string. Integral floats
/// print without a fraction.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_text(n)),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some(String::new()),
        _ => None,
    }
}

/// Prints a JSON number the way it reads in a document.
pub fn number_text(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Parses text that looks entirely like a decimal number.
///
/// Surrounding whitespace is allowed; `inf`, `nan` and hex are not numbers.
pub fn parse_numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        || !trimmed.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Numeric value of the longest numeric prefix of `text`, or 0.
///
/// `"12px"` reads as 12, `"abc"` as 0.
pub fn leading_number(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &trimmed[digits_start..end] == "." {
        return 0.0;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    trimmed[..end].parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =========================================================================
    // Shapes
    // =========================================================================

    #[test]
    fn test_scalar_shapes() {
        assert!(is_scalar(&json!("a")));
        assert!(is_scalar(&json!(1)));
        assert!(is_scalar(&json!(false)));
        assert!(!is_scalar(&json!(null)));
        assert!(!is_scalar(&json!([1])));
        assert!(!is_scalar(&json!({"a": 1})));
    }

    #[test]
    fn test_temporal_rfc3339() {
        let moment = temporal(&temporal_value("2021-03-04T05:06:07+02:00")).unwrap();
        assert_eq!(format_temporal(&moment, "%Y-%m-%d %H:%M").unwrap(), "2021-03-04 05:06");
    }

    #[test]
    fn test_temporal_date_only() {
        let moment = temporal(&json!({"$datetime": "2020-01-02"})).unwrap();
        assert_eq!(format_temporal(&moment, "%d.%m.%Y").unwrap(), "02.01.2020");
    }

    #[test]
    fn test_temporal_rejects_other_objects() {
        assert!(temporal(&json!({"$datetime": "2020-01-02", "x": 1})).is_none());
        assert!(temporal(&json!({"$datetime": "yesterday"})).is_none());
        assert!(temporal(&json!({"when": "2020-01-02"})).is_none());
    }

    #[test]
    fn test_format_temporal_invalid_pattern() {
        let moment = temporal(&temporal_value("2020-01-02")).unwrap();
        assert!(format_temporal(&moment, "%Q").is_none());
    }

    // =========================================================================
    // Emptiness and equality
    // =========================================================================

    #[test]
    fn test_empty_values() {
        for v in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!("0"), json!([]), json!({})] {
            assert!(is_empty(Some(&v)), "{v} should be empty");
        }
        assert!(is_empty(None));
    }

    #[test]
    fn test_non_empty_values() {
        for v in [json!(true), json!(1), json!("a"), json!("0.0"), json!([0]), json!({"a": null})] {
            assert!(!is_empty(Some(&v)), "{v} should not be empty");
        }
    }

    #[test]
    fn test_loose_equality_numbers() {
        assert!(loosely_equals(Some(&json!(1)), "1"));
        assert!(loosely_equals(Some(&json!(1)), "1.0"));
        assert!(loosely_equals(Some(&json!("01")), "1"));
        assert!(!loosely_equals(Some(&json!(2)), "1"));
        assert!(!loosely_equals(Some(&json!(1)), "one"));
    }

    #[test]
    fn test_loose_equality_strings() {
        assert!(loosely_equals(Some(&json!("red")), "red"));
        assert!(!loosely_equals(Some(&json!("red")), "Red"));
        assert!(loosely_equals(Some(&json!("")), ""));
    }

    #[test]
    fn test_loose_equality_bools_and_absent() {
        assert!(loosely_equals(Some(&json!(true)), "yes"));
        assert!(loosely_equals(Some(&json!(false)), "0"));
        assert!(loosely_equals(Some(&json!(false)), ""));
        assert!(!loosely_equals(Some(&json!(true)), ""));
        assert!(loosely_equals(None, ""));
        assert!(!loosely_equals(None, "0"));
        assert!(!loosely_equals(Some(&json!([1])), "1"));
    }

    // =========================================================================
    // Text
    // =========================================================================

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&json!("a")).as_deref(), Some("a"));
        assert_eq!(scalar_text(&json!(42)).as_deref(), Some("42"));
        assert_eq!(scalar_text(&json!(2.0)).as_deref(), Some("2"));
        assert_eq!(scalar_text(&json!(2.5)).as_deref(), Some("2.5"));
        assert_eq!(scalar_text(&json!(true)).as_deref(), Some("1"));
        assert_eq!(scalar_text(&json!(false)).as_deref(), Some(""));
        assert_eq!(scalar_text(&json!([1])), None);
        assert_eq!(scalar_text(&json!(null)), None);
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric(" 12 "), Some(12.0));
        assert_eq!(parse_numeric("-1.5e3"), Some(-1500.0));
        assert_eq!(parse_numeric("inf"), None);
        assert_eq!(parse_numeric("12px"), None);
        assert_eq!(parse_numeric("."), None);
        assert_eq!(parse_numeric(""), None);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("12px"), 12.0);
        assert_eq!(leading_number("  -3.5kg"), -3.5);
        assert_eq!(leading_number("1e3x"), 1000.0);
        assert_eq!(leading_number("2e"), 2.0);
        assert_eq!(leading_number("abc"), 0.0);
        assert_eq!(leading_number("."), 0.0);
        assert_eq!(leading_number(""), 0.0);
    }
}
