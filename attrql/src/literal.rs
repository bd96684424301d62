use crate::error::FilterError;
use crate::kind::JsonValueKind;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A value supplied by the caller for comparison against stored JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<FixedOffset>),
    Array(Vec<Literal>),
    Object(BTreeMap<String, Literal>),
}

impl Literal {
    /// Classify this literal into the JSON kind a stored value must have to be comparable with it.
    ///
    /// Datetimes classify as strings: they are stored as ISO 8601 text.
    pub fn kind(&self) -> JsonValueKind {
        match self {
            Literal::Bool(_) => JsonValueKind::Boolean,
            Literal::Integer(_) | Literal::Float(_) => JsonValueKind::Number,
            Literal::Object(_) => JsonValueKind::Object,
            Literal::Array(_) => JsonValueKind::Array,
            Literal::String(_) | Literal::DateTime(_) => JsonValueKind::String,
            Literal::Null => JsonValueKind::Null,
        }
    }

    pub fn is_datetime(&self) -> bool { matches!(self, Literal::DateTime(_)) }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Integer(i) => Some(*i as f64),
            Literal::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Literal::Null => serde_json::Value::Null,
            Literal::Bool(b) => serde_json::Value::Bool(*b),
            Literal::Integer(i) => serde_json::Value::from(*i),
            // NaN and infinities have no JSON form
            Literal::Float(f) => serde_json::Number::from_f64(*f).map(serde_json::Value::Number).unwrap_or(serde_json::Value::Null),
            Literal::String(s) => serde_json::Value::String(s.clone()),
            Literal::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            Literal::Array(items) => serde_json::Value::Array(items.iter().map(Literal::to_json).collect()),
            Literal::Object(map) => serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
        }
    }
}

impl TryFrom<serde_json::Value> for Literal {
    type Error = FilterError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        Ok(match value {
            serde_json::Value::Null => Literal::Null,
            serde_json::Value::Bool(b) => Literal::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Literal::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Literal::Float(f)
                } else {
                    return Err(FilterError::UnclassifiableValueKind(n.to_string()));
                }
            }
            serde_json::Value::String(s) => Literal::String(s),
            serde_json::Value::Array(items) => Literal::Array(items.into_iter().map(Literal::try_from).collect::<Result<_, _>>()?),
            serde_json::Value::Object(map) => {
                Literal::Object(map.into_iter().map(|(k, v)| Ok((k, Literal::try_from(v)?))).collect::<Result<_, FilterError>>()?)
            }
        })
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self { Literal::Bool(b) }
}

impl From<i32> for Literal {
    fn from(i: i32) -> Self { Literal::Integer(i as i64) }
}

impl From<i64> for Literal {
    fn from(i: i64) -> Self { Literal::Integer(i) }
}

impl From<f64> for Literal {
    fn from(f: f64) -> Self { Literal::Float(f) }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self { Literal::String(s.to_owned()) }
}

impl From<String> for Literal {
    fn from(s: String) -> Self { Literal::String(s) }
}

impl From<DateTime<FixedOffset>> for Literal {
    fn from(dt: DateTime<FixedOffset>) -> Self { Literal::DateTime(dt) }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(items: Vec<T>) -> Self { Literal::Array(items.into_iter().map(Into::into).collect()) }
}

/// An absent value and a JSON `null` are the same literal.
impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self { value.map(Into::into).unwrap_or(Literal::Null) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classification() {
        assert_eq!(Literal::from(true).kind(), JsonValueKind::Boolean);
        assert_eq!(Literal::from(1).kind(), JsonValueKind::Number);
        assert_eq!(Literal::from(1.5).kind(), JsonValueKind::Number);
        assert_eq!(Literal::from("a").kind(), JsonValueKind::String);
        assert_eq!(Literal::from(vec![1, 2]).kind(), JsonValueKind::Array);
        assert_eq!(Literal::Object(BTreeMap::new()).kind(), JsonValueKind::Object);
        assert_eq!(Literal::Null.kind(), JsonValueKind::Null);
    }

    #[test]
    fn test_none_is_null() {
        assert_eq!(Literal::from(None::<i64>), Literal::Null);
        assert_eq!(Literal::from(Some(3)), Literal::Integer(3));
    }

    #[test]
    fn test_datetime_classifies_as_string() {
        let dt = DateTime::parse_from_rfc3339("2016-04-01T12:00:00.5+02:00").unwrap();
        let literal = Literal::from(dt);
        assert!(literal.is_datetime());
        assert_eq!(literal.kind(), JsonValueKind::String);
        assert_eq!(literal.to_json(), json!("2016-04-01T12:00:00.500+02:00"));
    }

    #[test]
    fn test_from_json() {
        let literal = Literal::try_from(json!({"a": [1, 2.5, "x", null, false]})).unwrap();
        let expected = Literal::Object(BTreeMap::from([(
            "a".to_string(),
            Literal::Array(vec![Literal::Integer(1), Literal::Float(2.5), Literal::String("x".into()), Literal::Null, Literal::Bool(false)]),
        )]));
        assert_eq!(literal, expected);
        assert_eq!(expected.to_json(), json!({"a": [1, 2.5, "x", null, false]}));
    }

    #[test]
    fn test_large_unsigned_becomes_float() {
        let literal = Literal::try_from(json!(u64::MAX)).unwrap();
        assert_eq!(literal.kind(), JsonValueKind::Number);
        assert!(matches!(literal, Literal::Float(_)));
    }
}
