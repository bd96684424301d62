pub mod filter;
pub(crate) mod json;
pub mod value;

use crate::ast::NativeType;
use crate::kind::JsonValueKind;
use thiserror::Error;

pub use filter::{evaluate_expr, evaluate_nullable, evaluate_predicate, FilterIterator, FilterResult, Filterable};
pub use value::Value;

/// Errors raised while evaluating an expression against a record. These mirror the failures the database would
/// report for the same expression.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
    #[error("Table mismatch: expected {expected}, got {actual}")]
    TableMismatch { expected: String, actual: String },
    #[error("Invalid input for {target:?}: {value}")]
    InvalidCast { value: String, target: NativeType },
    #[error("Value out of range: {value}")]
    NumericOverflow { value: String },
    #[error("Cannot get array length of a {0}")]
    NotAnArray(JsonValueKind),
    #[error("Cannot compare {left} with {right}")]
    IncomparableTypes { left: &'static str, right: &'static str },
    #[error("Invalid regular expression: {0}")]
    InvalidPattern(String),
}
