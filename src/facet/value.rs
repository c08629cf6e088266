//! Typed facet values
//!
//! Stored values are text; a facet fixes one element type when its cache is
//! built and parses every stored value into it.

use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::config::ValueType;

/// Element type of a value dictionary
pub trait FacetValue: Clone + Ord + Send + Sync + fmt::Debug + 'static {
    const VALUE_TYPE: ValueType;

    /// Parse a stored value; `None` when the text is not of this type
    fn parse(raw: &str) -> Option<Self>;

    /// Canonical text form
    fn format(&self) -> String;

    fn to_raw(&self) -> RawValue;
}

impl FacetValue for String {
    const VALUE_TYPE: ValueType = ValueType::Text;

    fn parse(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }

    fn format(&self) -> String {
        self.clone()
    }

    fn to_raw(&self) -> RawValue {
        RawValue::Text(self.clone())
    }
}

impl FacetValue for i64 {
    const VALUE_TYPE: ValueType = ValueType::Int;

    fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }

    fn format(&self) -> String {
        self.to_string()
    }

    fn to_raw(&self) -> RawValue {
        RawValue::Int(*self)
    }
}

impl FacetValue for OrderedFloat<f64> {
    const VALUE_TYPE: ValueType = ValueType::Float;

    fn parse(raw: &str) -> Option<Self> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| !v.is_nan())
            .map(OrderedFloat)
    }

    fn format(&self) -> String {
        self.0.to_string()
    }

    fn to_raw(&self) -> RawValue {
        RawValue::Float(self.0)
    }
}

/// Type-erased facet value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            RawValue::Text(_) => ValueType::Text,
            RawValue::Int(_) => ValueType::Int,
            RawValue::Float(_) => ValueType::Float,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Float(v) => Some(*v),
            RawValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(s) => f.write_str(s),
            RawValue::Int(v) => write!(f, "{}", v),
            RawValue::Float(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format() {
        assert_eq!(String::parse("red"), Some("red".to_string()));
        assert_eq!(i64::parse("42"), Some(42));
        assert_eq!(i64::parse(" -7 "), Some(-7));
        assert_eq!(i64::parse("4.2"), None);
        assert_eq!(OrderedFloat::<f64>::parse("2.5"), Some(OrderedFloat(2.5)));
        assert_eq!(OrderedFloat::<f64>::parse("NaN"), None);

        assert_eq!(42i64.format(), "42");
        assert_eq!(OrderedFloat(2.5).format(), "2.5");
    }

    #[test]
    fn test_non_canonical_int() {
        let parsed = i64::parse("010").unwrap();
        assert_eq!(parsed, 10);
        assert_ne!(parsed.format(), "010");
    }

    #[test]
    fn test_raw_value() {
        assert_eq!(7i64.to_raw(), RawValue::Int(7));
        assert_eq!(RawValue::Int(7).as_f64(), Some(7.0));
        assert_eq!(RawValue::Text("x".into()).value_type(), ValueType::Text);
        assert_eq!(RawValue::Float(1.5).to_string(), "1.5");
        assert_eq!(
            serde_json::to_string(&RawValue::Text("red".into())).unwrap(),
            "\"red\""
        );
    }
}
