//! Filters and projections over schemaless JSON attribute columns.
//!
//! A filter is a `(path, operator, value)` triple. [`build_filter_expression`] turns it into a [`Predicate`] whose
//! comparisons only run once the stored value has been checked to be of a compatible JSON kind, so a row whose
//! attribute has an unexpected kind drops out of the result instead of failing the query.
//!
//! ```
//! use attrql::{build_filter_expression, FilterOperator, JsonColumn};
//!
//! let attributes = JsonColumn::new("attributes");
//! let predicate = build_filter_expression(&attributes, &"metadata.count".into(), FilterOperator::Gt, 5).unwrap();
//! ```

pub mod ast;
pub mod builder;
pub mod column;
pub mod conditions;
pub mod error;
pub mod kind;
pub mod literal;
pub mod operator;
pub mod path;
pub mod projection;
pub mod selection;

pub use ast::{ComparisonOperator, Expr, JsonRef, NativeType, Predicate};
pub use builder::{build_filter_expression, build_filter_from_json, type_guard_and_cast, DATETIME_PATTERN};
pub use column::{ColumnHandle, JsonColumn};
pub use conditions::parse_conditions;
pub use error::FilterError;
pub use kind::JsonValueKind;
pub use literal::Literal;
pub use operator::{CastTag, FilterOperator};
pub use path::{flatten, AttributePath, PathSegment};
pub use projection::{build_projection_expression, build_projection_from_tag};
pub use selection::{evaluate_predicate, EvaluationError, Filterable};

/// The boolean expression produced for a filter.
pub type FilterExpression = Predicate;

/// A value expression with a native type, as produced for a projection.
pub type TypedExpression = Expr;
