//! The capabilities the builders need from a JSON column.
//!
//! Builders never construct column reads themselves; they ask a [`ColumnHandle`] for them. [`JsonColumn`] is
//! the standard handle producing [`Expr`]/[`Predicate`] nodes that the evaluators and SQL renderers understand.

use crate::ast::{Column, Expr, JsonRef, NativeType, Predicate};
use crate::literal::Literal;
use crate::path::AttributePath;

pub trait ColumnHandle {
    /// Runtime kind of the value at `path`, as a kind-name expression.
    fn kind_of(&self, path: &AttributePath) -> Expr;

    /// The value at `path` as an untyped JSON handle.
    fn json(&self, path: &AttributePath) -> Expr;

    /// The value at `path` converted to a native type. `Text` extracts the unquoted string.
    fn cast(&self, path: &AttributePath, to: NativeType) -> Expr;

    fn contains(&self, path: &AttributePath, value: &Literal) -> Predicate;

    fn has_key(&self, path: &AttributePath, key: &str) -> Predicate;

    fn array_length(&self, path: &AttributePath) -> Expr;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonColumn {
    column: Column,
}

impl JsonColumn {
    pub fn new(name: impl Into<String>) -> Self { Self { column: Column { table: None, name: name.into() } } }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.column.table = Some(table.into());
        self
    }

    pub fn column(&self) -> &Column { &self.column }

    pub fn at(&self, path: &AttributePath) -> JsonRef { JsonRef { column: self.column.clone(), path: path.clone() } }
}

impl ColumnHandle for JsonColumn {
    fn kind_of(&self, path: &AttributePath) -> Expr { Expr::KindOf(self.at(path)) }

    fn json(&self, path: &AttributePath) -> Expr { Expr::Json(self.at(path)) }

    fn cast(&self, path: &AttributePath, to: NativeType) -> Expr {
        match to {
            NativeType::Text => Expr::Text(self.at(path)),
            NativeType::Json => Expr::Json(self.at(path)).cast(NativeType::Json),
            // scalar conversions go through the text form; JSON numbers and booleans print as their literals
            _ => Expr::Text(self.at(path)).cast(to),
        }
    }

    fn contains(&self, path: &AttributePath, value: &Literal) -> Predicate {
        Predicate::Contains { target: self.at(path), value: value.clone() }
    }

    fn has_key(&self, path: &AttributePath, key: &str) -> Predicate { Predicate::HasKey { target: self.at(path), key: key.to_owned() } }

    fn array_length(&self, path: &AttributePath) -> Expr { Expr::ArrayLength(self.at(path)) }
}
