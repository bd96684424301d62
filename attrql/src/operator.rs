use crate::error::FilterError;
use crate::kind::JsonValueKind;
use crate::literal::Literal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    Like,
    ILike,
    In,
    Contains,
    HasKey,
    OfType,
    OfLength,
    Longer,
    Shorter,
}

impl FilterOperator {
    pub fn name(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "==",
            FilterOperator::Gt => ">",
            FilterOperator::Lt => "<",
            FilterOperator::Gte => ">=",
            FilterOperator::Lte => "<=",
            FilterOperator::Like => "like",
            FilterOperator::ILike => "ilike",
            FilterOperator::In => "in",
            FilterOperator::Contains => "contains",
            FilterOperator::HasKey => "has_key",
            FilterOperator::OfType => "of_type",
            FilterOperator::OfLength => "of_length",
            FilterOperator::Longer => "longer",
            FilterOperator::Shorter => "shorter",
        }
    }

    /// Operators that infer the stored kind from the value and guard the comparison with it.
    pub fn is_type_guarded(&self) -> bool {
        matches!(
            self,
            FilterOperator::Eq
                | FilterOperator::Gt
                | FilterOperator::Lt
                | FilterOperator::Gte
                | FilterOperator::Lte
                | FilterOperator::Like
                | FilterOperator::ILike
                | FilterOperator::In
        )
    }

    /// Check the value against the shape this operator accepts.
    pub fn accepts(&self, value: &Literal) -> Result<(), FilterError> {
        let name = self.name();
        match self {
            // null, arrays and objects order as jsonb
            FilterOperator::Eq
            | FilterOperator::Gt
            | FilterOperator::Lt
            | FilterOperator::Gte
            | FilterOperator::Lte
            | FilterOperator::Contains => Ok(()),
            FilterOperator::Like | FilterOperator::ILike => match value {
                Literal::String(_) => Ok(()),
                _ => Err(FilterError::invalid_value(name, "pattern must be a string")),
            },
            FilterOperator::In => match value {
                Literal::Array(candidates) if !candidates.is_empty() => Ok(()),
                Literal::Array(_) => Err(FilterError::invalid_value(name, "candidate list is empty")),
                _ => Err(FilterError::invalid_value(name, "expected a list of candidates")),
            },
            FilterOperator::HasKey => match value {
                Literal::String(_) => Ok(()),
                _ => Err(FilterError::invalid_value(name, "key must be a string")),
            },
            FilterOperator::OfType => match value {
                Literal::String(s) if s.parse::<JsonValueKind>().is_ok() => Ok(()),
                _ => Err(FilterError::invalid_value(
                    name,
                    format!("expected one of {}", JsonValueKind::ALL.map(|k| k.as_str()).join(", ")),
                )),
            },
            FilterOperator::OfLength | FilterOperator::Longer | FilterOperator::Shorter => match value {
                Literal::Integer(n) if *n >= 0 => Ok(()),
                _ => Err(FilterError::invalid_value(name, "length must be a non-negative integer")),
            },
        }
    }
}

impl Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.name()) }
}

impl FromStr for FilterOperator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "==" | "=" | "eq" => FilterOperator::Eq,
            ">" | "gt" => FilterOperator::Gt,
            "<" | "lt" => FilterOperator::Lt,
            ">=" | "=>" | "gte" => FilterOperator::Gte,
            "<=" | "=<" | "lte" => FilterOperator::Lte,
            "like" => FilterOperator::Like,
            "ilike" => FilterOperator::ILike,
            "in" => FilterOperator::In,
            "contains" => FilterOperator::Contains,
            "has_key" => FilterOperator::HasKey,
            "of_type" => FilterOperator::OfType,
            "of_length" => FilterOperator::OfLength,
            "longer" => FilterOperator::Longer,
            "shorter" => FilterOperator::Shorter,
            other => return Err(FilterError::UnsupportedOperator(other.to_owned())),
        })
    }
}

/// Explicit native type a projection is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastTag {
    Float,
    Integer,
    Boolean,
    Text,
    RawJson,
    DateTime,
}

impl FromStr for CastTag {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "f" | "float" => CastTag::Float,
            "i" | "integer" => CastTag::Integer,
            "b" | "boolean" => CastTag::Boolean,
            "t" | "text" => CastTag::Text,
            "j" | "json" => CastTag::RawJson,
            "d" | "datetime" => CastTag::DateTime,
            other => return Err(FilterError::UnknownCastTag(other.to_owned())),
        })
    }
}
