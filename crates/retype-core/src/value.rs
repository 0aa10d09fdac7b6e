//! Cell value shapes as they arrive from the backend

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// One cell of a row record
///
/// Row payloads are loosely typed JSON, so a column of any logical type may
/// hold any of these shapes. Formatters accept all of them.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Missing value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Number (integers included)
    Number(f64),
    /// String, possibly encoding a number, date or duration
    Text(String),
    /// Complex number pair
    Complex { real: f64, imag: f64 },
    /// Pre-parsed instant (date columns are materialized into this)
    DateTime(DateTime<Utc>),
    /// A date column value that could not be parsed
    InvalidDate,
    /// Any other JSON shape (arrays, objects without `real`)
    Json(Value),
}

impl CellValue {
    /// Create a new text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellValue::Text(s.into())
    }

    /// Decode a JSON cell
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => CellValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Object(map) if map.contains_key("real") => CellValue::Complex {
                real: json_part(map.get("real")),
                imag: json_part(map.get("imag")),
            },
            other => CellValue::Json(other.clone()),
        }
    }

    /// JavaScript truthiness, inverted: null, false, 0, NaN and "" are falsy.
    ///
    /// Zero counts as absent. This conflates a legitimate zero with a
    /// missing value and is kept for display compatibility.
    pub fn is_falsy(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Bool(b) => !b,
            CellValue::Number(n) => *n == 0.0 || n.is_nan(),
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Check whether this is a complex pair
    pub fn is_complex(&self) -> bool {
        matches!(self, CellValue::Complex { .. })
    }

    /// Numeric coercion with ECMAScript `Number()` semantics
    pub fn to_number(&self) -> f64 {
        match self {
            CellValue::Null => 0.0,
            CellValue::Bool(b) => f64::from(u8::from(*b)),
            CellValue::Number(n) => *n,
            CellValue::Text(s) => parse_js_number(s),
            CellValue::DateTime(dt) => dt.timestamp_millis() as f64,
            CellValue::Complex { .. } | CellValue::InvalidDate | CellValue::Json(_) => f64::NAN,
        }
    }

    /// Get the type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Bool(_) => "boolean",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::Complex { .. } => "complex",
            CellValue::DateTime(_) => "datetime",
            CellValue::InvalidDate => "invalid_date",
            CellValue::Json(_) => "json",
        }
    }
}

fn json_part(part: Option<&Value>) -> f64 {
    match part {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_js_number(s),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(_) => f64::NAN,
    }
}

/// Parse a string the way ECMAScript `Number()` does.
///
/// Whitespace is trimmed, an empty string is zero, `0x`/`0o`/`0b` prefixes
/// select a radix, and anything else that is not a decimal literal is NaN.
pub fn parse_js_number(text: &str) -> f64 {
    let s = text.trim();
    if s.is_empty() {
        return 0.0;
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefixes, radix) in [(["0x", "0X"], 16), (["0o", "0O"], 8), (["0b", "0B"], 2)] {
        for prefix in prefixes {
            if let Some(digits) = s.strip_prefix(prefix) {
                return u64::from_str_radix(digits, radix)
                    .map(|v| v as f64)
                    .unwrap_or(f64::NAN);
            }
        }
    }

    // Rust accepts "inf" and "nan" spellings that Number() rejects
    if s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        s.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// Render a number the way ECMAScript `String()` does for common values
pub(crate) fn js_number_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => f.write_str(&js_number_string(*n)),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Complex { real, imag } => write!(
                f,
                "{}+{}j",
                js_number_string(*real),
                js_number_string(*imag)
            ),
            CellValue::DateTime(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            CellValue::InvalidDate => f.write_str("Invalid Date"),
            CellValue::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(dt: DateTime<Utc>) -> Self {
        CellValue::DateTime(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_shapes() {
        assert_eq!(CellValue::from_json(&json!(null)), CellValue::Null);
        assert_eq!(CellValue::from_json(&json!(75)), CellValue::Number(75.0));
        assert_eq!(CellValue::from_json(&json!("A")), CellValue::text("A"));
        assert_eq!(
            CellValue::from_json(&json!({"real": 2.0, "imag": 3.0})),
            CellValue::Complex {
                real: 2.0,
                imag: 3.0
            }
        );
        assert_eq!(
            CellValue::from_json(&json!({"real": 8})),
            CellValue::Complex {
                real: 8.0,
                imag: 0.0
            }
        );
        assert!(matches!(
            CellValue::from_json(&json!({"x": 1})),
            CellValue::Json(_)
        ));
    }

    #[test]
    fn test_falsy() {
        assert!(CellValue::Null.is_falsy());
        assert!(CellValue::Number(0.0).is_falsy());
        assert!(CellValue::Number(f64::NAN).is_falsy());
        assert!(CellValue::text("").is_falsy());
        assert!(CellValue::Bool(false).is_falsy());

        assert!(!CellValue::text("0").is_falsy());
        assert!(!CellValue::Number(-1.0).is_falsy());
        assert!(!CellValue::InvalidDate.is_falsy());
        assert!(!CellValue::Complex {
            real: 0.0,
            imag: 0.0
        }
        .is_falsy());
    }

    #[test]
    fn test_parse_js_number() {
        assert_eq!(parse_js_number("5"), 5.0);
        assert_eq!(parse_js_number("  1500 "), 1500.0);
        assert_eq!(parse_js_number(""), 0.0);
        assert_eq!(parse_js_number("1e3"), 1000.0);
        assert_eq!(parse_js_number("-2.5"), -2.5);
        assert_eq!(parse_js_number("0x10"), 16.0);
        assert_eq!(parse_js_number("Infinity"), f64::INFINITY);
        assert!(parse_js_number("abc").is_nan());
        assert!(parse_js_number("inf").is_nan());
        assert!(parse_js_number("nan").is_nan());
        assert!(parse_js_number("1+2j").is_nan());
        assert!(parse_js_number("1,500").is_nan());
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Number(75.0).to_string(), "75");
        assert_eq!(CellValue::Number(3.33).to_string(), "3.33");
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Bool(true).to_string(), "true");
        assert_eq!(
            CellValue::Complex {
                real: 1.0,
                imag: 2e7
            }
            .to_string(),
            "1+20000000j"
        );
    }

    #[test]
    fn test_to_number() {
        assert_eq!(CellValue::text("1709991489000").to_number(), 1709991489000.0);
        assert_eq!(CellValue::Bool(true).to_number(), 1.0);
        assert!(CellValue::InvalidDate.to_number().is_nan());
    }
}
