use thiserror::Error;

/// Errors raised while translating a filter or projection request into an expression tree.
///
/// Every variant is detected at build time; nothing here is deferred to query execution.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    #[error("Malformed attribute path: {0}")]
    MalformedPath(String),
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),
    #[error("Invalid value for operator {operator}: {reason}")]
    InvalidOperatorValue { operator: &'static str, reason: String },
    #[error("Unknown cast tag: {0}")]
    UnknownCastTag(String),
    #[error("Cannot classify value as a JSON kind: {0}")]
    UnclassifiableValueKind(String),
}

impl FilterError {
    pub(crate) fn invalid_value(operator: &'static str, reason: impl Into<String>) -> Self {
        FilterError::InvalidOperatorValue { operator, reason: reason.into() }
    }
}
