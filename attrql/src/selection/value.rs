use crate::ast::NativeType;
use crate::literal::Literal;
use crate::selection::json::json_cmp;
use crate::selection::EvaluationError;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use std::cmp::Ordering;

/// A non-NULL result of evaluating an expression. SQL NULL is represented by `None` around it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Json(serde_json::Value),
    Text(String),
    Float(f64),
    Integer(i64),
    Boolean(bool),
    Timestamp(DateTime<FixedOffset>),
    List(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Json(_) => "jsonb",
            Value::Text(_) => "text",
            Value::Float(_) => "float8",
            Value::Integer(_) => "bigint",
            Value::Boolean(_) => "boolean",
            Value::Timestamp(_) => "timestamptz",
            Value::List(_) => "list",
        }
    }

    /// Ordering under the native comparison of the shared type. Mismatched types are an error, as they would be
    /// when planning the SQL.
    pub fn compare(&self, other: &Value) -> Result<Option<Ordering>, EvaluationError> {
        Ok(match (self, other) {
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Json(a), Value::Json(b)) => Some(json_cmp(a, b)),
            (a, b) => return Err(EvaluationError::IncomparableTypes { left: a.type_name(), right: b.type_name() }),
        })
    }

    /// Convert to `target` following PostgreSQL's cast rules for the text and jsonb forms.
    pub fn cast_to(self, target: NativeType) -> Result<Value, EvaluationError> {
        match (self, target) {
            (Value::Json(json), NativeType::Json) => Ok(Value::Json(json)),
            (Value::Json(serde_json::Value::String(s)), NativeType::Text) => Ok(Value::Text(s)),
            (Value::Json(json), NativeType::Text) => Ok(Value::Text(json.to_string())),
            (Value::Json(json), target) => match json {
                serde_json::Value::String(s) => Value::Text(s).cast_to(target),
                serde_json::Value::Number(n) => Value::Text(n.to_string()).cast_to(target),
                serde_json::Value::Bool(b) => Value::Text(b.to_string()).cast_to(target),
                other => Err(EvaluationError::InvalidCast { value: other.to_string(), target }),
            },

            (Value::Text(s), NativeType::Text) => Ok(Value::Text(s)),
            (Value::Text(s), NativeType::Float) => parse_float(&s).map(Value::Float),
            (Value::Text(s), NativeType::Integer) => parse_integer(&s).map(Value::Integer),
            (Value::Text(s), NativeType::Boolean) => parse_boolean(&s).map(Value::Boolean),
            (Value::Text(s), NativeType::Json) => {
                serde_json::from_str(&s).map(Value::Json).map_err(|_| EvaluationError::InvalidCast { value: s, target: NativeType::Json })
            }
            (Value::Text(s), NativeType::Timestamp) => parse_timestamp(&s).map(Value::Timestamp),

            (Value::Float(f), NativeType::Float) => Ok(Value::Float(f)),
            (Value::Float(f), NativeType::Integer) => truncate_to_i64(f, &f.to_string()).map(Value::Integer),
            (Value::Integer(i), NativeType::Integer) => Ok(Value::Integer(i)),
            (Value::Integer(i), NativeType::Float) => Ok(Value::Float(i as f64)),
            (Value::Boolean(b), NativeType::Boolean) => Ok(Value::Boolean(b)),
            (Value::Timestamp(t), NativeType::Timestamp) => Ok(Value::Timestamp(t)),
            (Value::Float(f), NativeType::Text) => Ok(Value::Text(f.to_string())),
            (Value::Integer(i), NativeType::Text) => Ok(Value::Text(i.to_string())),
            (Value::Boolean(b), NativeType::Text) => Ok(Value::Text(b.to_string())),

            (value, target) => Err(EvaluationError::InvalidCast { value: format!("{:?}", value), target }),
        }
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Bool(b) => Value::Boolean(*b),
            Literal::Integer(i) => Value::Integer(*i),
            Literal::Float(f) => Value::Float(*f),
            Literal::String(s) => Value::Text(s.clone()),
            Literal::DateTime(dt) => Value::Timestamp(*dt),
            // null, arrays and objects are bound as jsonb
            Literal::Null | Literal::Array(_) | Literal::Object(_) => Value::Json(literal.to_json()),
        }
    }
}

fn parse_float(s: &str) -> Result<f64, EvaluationError> {
    s.trim().parse::<f64>().map_err(|_| EvaluationError::InvalidCast { value: s.to_owned(), target: NativeType::Float })
}

/// Integers are read through `numeric` and truncated toward zero.
fn parse_integer(s: &str) -> Result<i64, EvaluationError> {
    let trimmed = s.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(i);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => truncate_to_i64(f, s),
        Ok(_) => Err(EvaluationError::NumericOverflow { value: s.to_owned() }),
        Err(_) => Err(EvaluationError::InvalidCast { value: s.to_owned(), target: NativeType::Integer }),
    }
}

fn truncate_to_i64(f: f64, original: &str) -> Result<i64, EvaluationError> {
    let truncated = f.trunc();
    // i64::MAX is not representable as f64; 2^63 is the first value out of range
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < 9_223_372_036_854_775_808.0 {
        Ok(truncated as i64)
    } else {
        Err(EvaluationError::NumericOverflow { value: original.to_owned() })
    }
}

fn parse_boolean(s: &str) -> Result<bool, EvaluationError> {
    match s.trim().to_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => Ok(true),
        "f" | "false" | "n" | "no" | "off" | "0" => Ok(false),
        _ => Err(EvaluationError::InvalidCast { value: s.to_owned(), target: NativeType::Boolean }),
    }
}

/// Timestamps without an offset are taken as UTC.
fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>, EvaluationError> {
    let trimmed = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    Err(EvaluationError::InvalidCast { value: s.to_owned(), target: NativeType::Timestamp })
}
