//! Translate `(path, operator, value)` filter triples into predicates over a JSON column.
//!
//! For the comparison operators the kind of the stored value is not known up front, so the value's own kind is
//! used to pick both a guard (the stored value must currently have that kind) and a conversion of the stored
//! value to the matching native type. The comparison only runs when the guard holds, so a stored value of a
//! different kind fails the filter instead of raising a cast error at execution time.
//!
//! Datetime values are matched against strings that look like ISO 8601 timestamps. This is a heuristic: it
//! cannot tell an intentional date-like string from a timestamp, it does not validate the calendar (month 19
//! passes the pattern), and it does not handle years before 1000 or historical calendars.

use crate::ast::{ComparisonOperator, Expr, NativeType, Predicate};
use crate::column::ColumnHandle;
use crate::error::FilterError;
use crate::kind::JsonValueKind;
use crate::literal::Literal;
use crate::operator::FilterOperator;
use crate::path::AttributePath;
use tracing::{debug, trace};

/// Stored strings must match this to be compared as timestamps.
/// Only ASCII digits qualify.
pub const DATETIME_PATTERN: &str = r"^[0-9]{4}-[0-1][0-9]-[0-3][0-9]T[0-2][0-9]:[0-5][0-9]:[0-9]{2}\.[0-9]+((\+|-)[0-9]{2}:[0-9]{2})?$";

/// Build the predicate for one filter triple.
pub fn build_filter_expression<C: ColumnHandle>(
    column: &C,
    path: &AttributePath,
    operator: FilterOperator,
    value: impl Into<Literal>,
) -> Result<Predicate, FilterError> {
    let value = value.into();
    operator.accepts(&value)?;
    trace!("building {} filter on {:?}", operator, path.to_string());

    Ok(match operator {
        FilterOperator::Eq => guarded_comparison(column, path, ComparisonOperator::Equal, &value),
        FilterOperator::Gt => guarded_comparison(column, path, ComparisonOperator::GreaterThan, &value),
        FilterOperator::Lt => guarded_comparison(column, path, ComparisonOperator::LessThan, &value),
        FilterOperator::Gte => guarded_comparison(column, path, ComparisonOperator::GreaterThanOrEqual, &value),
        FilterOperator::Lte => guarded_comparison(column, path, ComparisonOperator::LessThanOrEqual, &value),
        FilterOperator::Like => guarded_comparison(column, path, ComparisonOperator::Like, &value),
        FilterOperator::ILike => guarded_comparison(column, path, ComparisonOperator::ILike, &value),
        FilterOperator::In => {
            let Literal::Array(candidates) = &value else {
                return Err(FilterError::invalid_value(operator.name(), "expected a list of candidates"));
            };
            guarded_membership(column, path, candidates)?
        }
        FilterOperator::Contains => column.contains(path, &value),
        FilterOperator::HasKey => {
            let Some(key) = value.as_str() else {
                return Err(FilterError::invalid_value(operator.name(), "key must be a string"));
            };
            column.has_key(path, key)
        }
        FilterOperator::OfType => Predicate::comparison(column.kind_of(path), ComparisonOperator::Equal, Expr::Literal(value)),
        FilterOperator::OfLength => array_length(column, path, ComparisonOperator::Equal, value),
        FilterOperator::Longer => array_length(column, path, ComparisonOperator::GreaterThan, value),
        FilterOperator::Shorter => array_length(column, path, ComparisonOperator::LessThan, value),
    })
}

/// Parse the operator name and value, then build. Convenience for callers holding untyped filter descriptions.
pub fn build_filter_from_json<C: ColumnHandle>(
    column: &C,
    path: &str,
    operator: &str,
    value: serde_json::Value,
) -> Result<Predicate, FilterError> {
    let operator: FilterOperator = operator.parse()?;
    build_filter_expression(column, &AttributePath::parse(path), operator, Literal::try_from(value)?)
}

/// The guard a stored value must pass to be compared with `value`, and the stored value converted for that comparison.
pub fn type_guard_and_cast<C: ColumnHandle>(column: &C, path: &AttributePath, value: &Literal) -> (Predicate, Expr) {
    let kind = value.kind();
    let guard = kind_is(column, path, kind);

    if value.is_datetime() {
        let looks_like_timestamp = Predicate::Matches { expr: Box::new(column.cast(path, NativeType::Text)), pattern: DATETIME_PATTERN.to_owned() };
        return (guard.and(looks_like_timestamp), column.cast(path, NativeType::Timestamp));
    }

    let casted = match kind {
        JsonValueKind::Boolean => column.cast(path, NativeType::Boolean),
        // JSON numbers compare as double precision regardless of whether the literal was integral
        JsonValueKind::Number => column.cast(path, NativeType::Float),
        JsonValueKind::String => column.cast(path, NativeType::Text),
        JsonValueKind::Object | JsonValueKind::Array | JsonValueKind::Null => column.json(path),
    };
    (guard, casted)
}

fn kind_is<C: ColumnHandle>(column: &C, path: &AttributePath, kind: JsonValueKind) -> Predicate {
    Predicate::comparison(column.kind_of(path), ComparisonOperator::Equal, Expr::Literal(Literal::String(kind.as_str().to_owned())))
}

/// Numbers are compared as floats on both sides.
fn comparable_literal(value: &Literal) -> Literal {
    match value {
        Literal::Integer(i) => Literal::Float(*i as f64),
        other => other.clone(),
    }
}

fn guarded_comparison<C: ColumnHandle>(column: &C, path: &AttributePath, operator: ComparisonOperator, value: &Literal) -> Predicate {
    let (guard, casted) = type_guard_and_cast(column, path, value);
    Predicate::guarded(guard, Predicate::comparison(casted, operator, Expr::Literal(comparable_literal(value))))
}

/// The first candidate decides the kind for the whole list. Candidates of another kind could never compare equal
/// under that kind's native equality, so they are dropped rather than bound with a mismatched type.
fn guarded_membership<C: ColumnHandle>(column: &C, path: &AttributePath, candidates: &[Literal]) -> Result<Predicate, FilterError> {
    let first = candidates.first().ok_or_else(|| FilterError::invalid_value(FilterOperator::In.name(), "candidate list is empty"))?;
    let (guard, casted) = type_guard_and_cast(column, path, first);

    let (kept, dropped): (Vec<&Literal>, Vec<&Literal>) =
        candidates.iter().partition(|candidate| candidate.kind() == first.kind() && candidate.is_datetime() == first.is_datetime());
    if !dropped.is_empty() {
        debug!("dropping {} `in` candidates that are not of kind {}: {:?}", dropped.len(), first.kind(), dropped);
    }

    let list = kept.into_iter().map(comparable_literal).collect();
    Ok(Predicate::guarded(guard, Predicate::comparison(casted, ComparisonOperator::In, Expr::List(list))))
}

fn array_length<C: ColumnHandle>(column: &C, path: &AttributePath, operator: ComparisonOperator, length: Literal) -> Predicate {
    Predicate::guarded(
        kind_is(column, path, JsonValueKind::Array),
        Predicate::comparison(column.array_length(path), operator, Expr::Literal(length)),
    )
}
