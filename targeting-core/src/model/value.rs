//! Attribute values as they come out of the population store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single attribute value on a household or individual record.
///
/// Enum-typed fields carry their value as `Text`; multi-enum fields as
/// `List`. Equality for filter purposes is type-aware, never naive
/// string comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Date(NaiveDate),
    Text(String),
    List(Vec<String>),
}

impl AttributeValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Parse an attribute value out of a JSON value, using the shapes the
    /// store writes: bools, numbers, ISO dates or plain text as strings,
    /// arrays of strings for multi-enum fields.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::String(s) => {
                match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    Ok(d) => Some(Self::Date(d)),
                    Err(_) => Some(Self::Text(s.clone())),
                }
            }
            serde_json::Value::Array(items) => {
                let strings: Option<Vec<String>> = items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect();
                strings.map(Self::List)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_string_parses_as_date_when_iso() {
        let v = AttributeValue::from_json(&serde_json::json!("1999-02-28")).unwrap();
        assert_eq!(
            v,
            AttributeValue::Date(NaiveDate::from_ymd_opt(1999, 2, 28).unwrap())
        );
    }

    #[test]
    fn json_string_falls_back_to_text() {
        let v = AttributeValue::from_json(&serde_json::json!("MARRIED")).unwrap();
        assert_eq!(v, AttributeValue::Text("MARRIED".to_string()));
    }

    #[test]
    fn json_array_becomes_list() {
        let v = AttributeValue::from_json(&serde_json::json!(["SEEING", "HEARING"])).unwrap();
        assert_eq!(
            v,
            AttributeValue::List(vec!["SEEING".to_string(), "HEARING".to_string()])
        );
    }
}
