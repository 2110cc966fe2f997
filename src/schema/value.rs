//! Typed attribute values and expression coercion
//!
//! Every expression embedded in a query is first coerced into the
//! schema's declared type here. No implicit cross-type coercion happens
//! afterwards, except that Long and Double compare numerically.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{ValueError, ValueResult};
use super::types::{AttributeSchema, ValueColumn, ValueType};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single typed value, as stored in one type-specific column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AttrValue {
    Boolean(bool),
    Long(i64),
    Double(f64),
    Date(DateTime<Utc>),
    String(String),
}

impl AttrValue {
    /// Column this value is stored in
    pub fn column(&self) -> ValueColumn {
        match self {
            AttrValue::Boolean(_) => ValueColumn::Boolean,
            AttrValue::Long(_) => ValueColumn::Long,
            AttrValue::Double(_) => ValueColumn::Double,
            AttrValue::Date(_) => ValueColumn::Date,
            AttrValue::String(_) => ValueColumn::String,
        }
    }

    /// Returns the textual value, if any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Compares two values of compatible columns.
    ///
    /// Returns None for incompatible columns (a string never orders
    /// against a date, for instance).
    pub fn compare(&self, other: &AttrValue) -> Option<Ordering> {
        match (self, other) {
            (AttrValue::Boolean(a), AttrValue::Boolean(b)) => Some(a.cmp(b)),
            (AttrValue::Long(a), AttrValue::Long(b)) => Some(a.cmp(b)),
            (AttrValue::Double(a), AttrValue::Double(b)) => a.partial_cmp(b),
            (AttrValue::Long(a), AttrValue::Double(b)) => (*a as f64).partial_cmp(b),
            (AttrValue::Double(a), AttrValue::Long(b)) => a.partial_cmp(&(*b as f64)),
            (AttrValue::Date(a), AttrValue::Date(b)) => Some(a.cmp(b)),
            (AttrValue::String(a), AttrValue::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Coerces a raw expression string into the schema's declared type
    pub fn parse_expression(schema: &AttributeSchema, expression: &str) -> ValueResult<Self> {
        let invalid = || ValueError::InvalidLiteral {
            expression: expression.to_string(),
            expected: schema.value_type.type_name(),
        };
        let trimmed = expression.trim();

        match schema.value_type {
            ValueType::Boolean => {
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(AttrValue::Boolean(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(AttrValue::Boolean(false))
                } else {
                    Err(invalid())
                }
            }
            ValueType::Long => trimmed.parse().map(AttrValue::Long).map_err(|_| invalid()),
            ValueType::Double => match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(AttrValue::Double(v)),
                _ => Err(invalid()),
            },
            ValueType::Date => parse_date(trimmed, schema.conversion_pattern.as_deref())
                .map(AttrValue::Date)
                .ok_or_else(invalid),
            ValueType::String => Ok(AttrValue::String(expression.to_string())),
            ValueType::Enum => {
                if schema.enum_values.is_empty()
                    || schema.enum_values.iter().any(|v| v == expression)
                {
                    Ok(AttrValue::String(expression.to_string()))
                } else {
                    Err(ValueError::NotEnumerated {
                        expression: expression.to_string(),
                        schema: schema.name.clone(),
                    })
                }
            }
        }
    }

    /// Coerces a stored JSON value into the schema's declared type
    pub fn from_json(schema: &AttributeSchema, value: &Value) -> ValueResult<Self> {
        let mismatch = || ValueError::JsonMismatch {
            value: value.to_string(),
            expected: schema.value_type.type_name(),
            schema: schema.name.clone(),
        };

        match (schema.value_type, value) {
            (_, Value::String(s)) => Self::parse_expression(schema, s),
            (ValueType::Boolean, Value::Bool(b)) => Ok(AttrValue::Boolean(*b)),
            (ValueType::Long, Value::Number(n)) => {
                n.as_i64().map(AttrValue::Long).ok_or_else(mismatch)
            }
            (ValueType::Double, Value::Number(n)) => {
                n.as_f64().map(AttrValue::Double).ok_or_else(mismatch)
            }
            _ => Err(mismatch()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Boolean(b) => write!(f, "{}", b),
            AttrValue::Long(v) => write!(f, "{}", v),
            AttrValue::Double(v) => write!(f, "{}", v),
            AttrValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            AttrValue::String(s) => write!(f, "'{}'", s),
        }
    }
}

fn parse_date(expression: &str, pattern: Option<&str>) -> Option<DateTime<Utc>> {
    if let Some(pattern) = pattern {
        return parse_naive(expression, pattern);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(expression) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_naive(expression, DATETIME_FORMAT).or_else(|| parse_naive(expression, DATE_FORMAT))
}

fn parse_naive(expression: &str, format: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(expression, format) {
        return Some(Utc.from_utc_datetime(&dt));
    }
    NaiveDate::parse_from_str(expression, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_long() {
        let schema = AttributeSchema::new("age", ValueType::Long);
        assert_eq!(
            AttrValue::parse_expression(&schema, "30").unwrap(),
            AttrValue::Long(30)
        );
        assert!(AttrValue::parse_expression(&schema, "thirty").is_err());
    }

    #[test]
    fn test_parse_boolean_case_insensitive() {
        let schema = AttributeSchema::new("active", ValueType::Boolean);
        assert_eq!(
            AttrValue::parse_expression(&schema, "TRUE").unwrap(),
            AttrValue::Boolean(true)
        );
        assert!(AttrValue::parse_expression(&schema, "yes").is_err());
    }

    #[test]
    fn test_parse_double_rejects_nan() {
        let schema = AttributeSchema::new("score", ValueType::Double);
        assert_eq!(
            AttrValue::parse_expression(&schema, "2.5").unwrap(),
            AttrValue::Double(2.5)
        );
        assert!(AttrValue::parse_expression(&schema, "NaN").is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let schema = AttributeSchema::new("hired", ValueType::Date);
        let expected = Utc.with_ymd_and_hms(2020, 1, 15, 0, 0, 0).unwrap();

        for expr in ["2020-01-15", "2020-01-15 00:00:00", "2020-01-15T00:00:00Z"] {
            assert_eq!(
                AttrValue::parse_expression(&schema, expr).unwrap(),
                AttrValue::Date(expected),
                "{}",
                expr
            );
        }
        assert!(AttrValue::parse_expression(&schema, "15/01/2020").is_err());
    }

    #[test]
    fn test_parse_date_with_conversion_pattern() {
        let schema =
            AttributeSchema::new("hired", ValueType::Date).with_conversion_pattern("%d/%m/%Y");
        let expected = Utc.with_ymd_and_hms(2020, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(
            AttrValue::parse_expression(&schema, "15/01/2020").unwrap(),
            AttrValue::Date(expected)
        );
        assert!(AttrValue::parse_expression(&schema, "2020-01-15").is_err());
    }

    #[test]
    fn test_enum_restricted_values() {
        let schema =
            AttributeSchema::new("color", ValueType::Enum).with_enum_values(["red", "blue"]);
        assert!(AttrValue::parse_expression(&schema, "red").is_ok());
        assert!(matches!(
            AttrValue::parse_expression(&schema, "green"),
            Err(ValueError::NotEnumerated { .. })
        ));
    }

    #[test]
    fn test_numeric_cross_compare() {
        assert_eq!(
            AttrValue::Long(3).compare(&AttrValue::Double(2.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            AttrValue::String("a".into()).compare(&AttrValue::Long(1)),
            None
        );
    }

    #[test]
    fn test_from_json() {
        let schema = AttributeSchema::new("age", ValueType::Long);
        assert_eq!(
            AttrValue::from_json(&schema, &json!(41)).unwrap(),
            AttrValue::Long(41)
        );
        assert_eq!(
            AttrValue::from_json(&schema, &json!("41")).unwrap(),
            AttrValue::Long(41)
        );
        assert!(AttrValue::from_json(&schema, &json!(true)).is_err());
    }
}
