//! Evaluate predicates against in-memory records. This is necessary for cases where the records are already
//! loaded (caches, tests, post-filtering) - and to check what a predicate will select before it is shipped to
//! the database.
//!
//! Evaluation follows SQL three-valued logic: a comparison involving a missing path is NULL, and a NULL
//! predicate does not select the record.

use crate::ast::{Column, ComparisonOperator, Expr, JsonRef, Predicate};
use crate::builder::DATETIME_PATTERN;
use crate::kind::JsonValueKind;
use crate::selection::json::{json_contains, json_has_key};
use crate::selection::value::Value;
use crate::selection::EvaluationError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

static DATETIME_REGEX: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(DATETIME_PATTERN));

/// The builders only ever emit the datetime pattern, which is compiled once. Other patterns compile per call.
fn pattern_regex(pattern: &str) -> Result<Cow<'static, Regex>, EvaluationError> {
    if pattern == DATETIME_PATTERN {
        if let Ok(regex) = &*DATETIME_REGEX {
            return Ok(Cow::Borrowed(regex));
        }
    }
    Regex::new(pattern).map(Cow::Owned).map_err(|e| EvaluationError::InvalidPattern(e.to_string()))
}

pub trait Filterable {
    /// The table this record belongs to, when known. Table-qualified columns are checked against it.
    fn table(&self) -> Option<&str> { None }

    /// The JSON stored in the named column. `None` if the record has no such column.
    fn column(&self, name: &str) -> Option<&serde_json::Value>;
}

impl Filterable for BTreeMap<String, serde_json::Value> {
    fn column(&self, name: &str) -> Option<&serde_json::Value> { self.get(name) }
}

impl Filterable for HashMap<String, serde_json::Value> {
    fn column(&self, name: &str) -> Option<&serde_json::Value> { self.get(name) }
}

impl Filterable for serde_json::Map<String, serde_json::Value> {
    fn column(&self, name: &str) -> Option<&serde_json::Value> { self.get(name) }
}

fn column_value<'a, R: Filterable>(record: &'a R, column: &Column) -> Result<&'a serde_json::Value, EvaluationError> {
    if let (Some(expected), Some(actual)) = (&column.table, record.table()) {
        if expected != actual {
            return Err(EvaluationError::TableMismatch { expected: expected.clone(), actual: actual.to_owned() });
        }
    }
    record.column(&column.name).ok_or_else(|| EvaluationError::ColumnNotFound(column.name.clone()))
}

fn lookup<'a, R: Filterable>(record: &'a R, target: &JsonRef) -> Result<Option<&'a serde_json::Value>, EvaluationError> {
    Ok(target.path.navigate(column_value(record, &target.column)?))
}

/// Evaluate a value expression. `Ok(None)` is SQL NULL.
pub fn evaluate_expr<R: Filterable>(record: &R, expr: &Expr) -> Result<Option<Value>, EvaluationError> {
    Ok(match expr {
        Expr::Json(target) => lookup(record, target)?.map(|json| Value::Json(json.clone())),
        Expr::Text(target) => match lookup(record, target)? {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => Some(Value::Text(s.clone())),
            Some(other) => Some(Value::Text(other.to_string())),
        },
        Expr::KindOf(target) => lookup(record, target)?.map(|json| Value::Text(JsonValueKind::of(json).as_str().to_owned())),
        Expr::ArrayLength(target) => match lookup(record, target)? {
            None => None,
            Some(serde_json::Value::Array(items)) => Some(Value::Integer(items.len() as i64)),
            Some(other) => return Err(EvaluationError::NotAnArray(JsonValueKind::of(other))),
        },
        Expr::Cast { expr, to } => match evaluate_expr(record, expr)? {
            None => None,
            Some(value) => Some(value.cast_to(*to)?),
        },
        Expr::Literal(literal) => Some(Value::from(literal)),
        Expr::List(items) => Some(Value::List(items.iter().map(Value::from).collect())),
    })
}

/// Evaluate a predicate with SQL NULL semantics. `Ok(None)` is NULL.
pub fn evaluate_nullable<R: Filterable>(record: &R, predicate: &Predicate) -> Result<Option<bool>, EvaluationError> {
    Ok(match predicate {
        Predicate::Comparison { left, operator, right } => {
            let (Some(left), Some(right)) = (evaluate_expr(record, left)?, evaluate_expr(record, right)?) else {
                return Ok(None);
            };
            compare(&left, *operator, &right)?
        }
        Predicate::Matches { expr, pattern } => match evaluate_expr(record, expr)? {
            None => None,
            Some(Value::Text(text)) => Some(pattern_regex(pattern)?.is_match(&text)),
            Some(other) => return Err(EvaluationError::IncomparableTypes { left: other.type_name(), right: "text" }),
        },
        Predicate::Contains { target, value } => lookup(record, target)?.map(|stored| json_contains(stored, &value.to_json())),
        Predicate::HasKey { target, key } => lookup(record, target)?.map(|stored| json_has_key(stored, key)),
        // CASE WHEN guard THEN predicate ELSE FALSE END
        Predicate::Guarded { guard, predicate } => match evaluate_nullable(record, guard)? {
            Some(true) => evaluate_nullable(record, predicate)?,
            _ => Some(false),
        },
        Predicate::And(left, right) => match evaluate_nullable(record, left)? {
            Some(false) => Some(false),
            left => match (left, evaluate_nullable(record, right)?) {
                (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
        },
        Predicate::Or(left, right) => match evaluate_nullable(record, left)? {
            Some(true) => Some(true),
            left => match (left, evaluate_nullable(record, right)?) {
                (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
        },
        Predicate::Not(inner) => evaluate_nullable(record, inner)?.map(|b| !b),
        Predicate::True => Some(true),
        Predicate::False => Some(false),
    })
}

/// Whether the predicate selects the record. NULL does not.
pub fn evaluate_predicate<R: Filterable>(record: &R, predicate: &Predicate) -> Result<bool, EvaluationError> {
    let result = evaluate_nullable(record, predicate)?;
    trace!("predicate evaluated to {:?}", result);
    Ok(result == Some(true))
}

fn compare(left: &Value, operator: ComparisonOperator, right: &Value) -> Result<Option<bool>, EvaluationError> {
    Ok(match operator {
        ComparisonOperator::Equal => left.compare(right)?.map(|o| o == Ordering::Equal),
        ComparisonOperator::GreaterThan => left.compare(right)?.map(|o| o == Ordering::Greater),
        ComparisonOperator::LessThan => left.compare(right)?.map(|o| o == Ordering::Less),
        ComparisonOperator::GreaterThanOrEqual => left.compare(right)?.map(|o| o != Ordering::Less),
        ComparisonOperator::LessThanOrEqual => left.compare(right)?.map(|o| o != Ordering::Greater),
        ComparisonOperator::Like | ComparisonOperator::ILike => match (left, right) {
            (Value::Text(text), Value::Text(pattern)) => Some(like(text, pattern, operator == ComparisonOperator::ILike)?),
            (left, right) => return Err(EvaluationError::IncomparableTypes { left: left.type_name(), right: right.type_name() }),
        },
        ComparisonOperator::In => {
            let Value::List(candidates) = right else {
                return Err(EvaluationError::IncomparableTypes { left: left.type_name(), right: right.type_name() });
            };
            let mut result = Some(false);
            for candidate in candidates {
                match left.compare(candidate)? {
                    Some(Ordering::Equal) => return Ok(Some(true)),
                    Some(_) => {}
                    None => result = None,
                }
            }
            result
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LikeToken {
    Any,
    One,
    Char(char),
}

/// SQL `LIKE`: `%` matches any run, `_` a single character, backslash escapes the next character.
/// A pattern ending in an unescaped backslash is rejected, as PostgreSQL does.
pub fn like(text: &str, pattern: &str, case_insensitive: bool) -> Result<bool, EvaluationError> {
    let fold = |s: &str| if case_insensitive { s.to_lowercase() } else { s.to_owned() };
    let text: Vec<char> = fold(text).chars().collect();

    let mut tokens = Vec::new();
    let mut chars = fold(pattern).chars().collect::<Vec<_>>().into_iter();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => LikeToken::Any,
            '_' => LikeToken::One,
            '\\' => match chars.next() {
                Some(escaped) => LikeToken::Char(escaped),
                None => return Err(EvaluationError::InvalidPattern("LIKE pattern must not end with escape character".into())),
            },
            c => LikeToken::Char(c),
        });
    }

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        match tokens.get(p) {
            Some(LikeToken::One) => {
                t += 1;
                p += 1;
            }
            Some(LikeToken::Char(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            Some(LikeToken::Any) => {
                backtrack = Some((p, t));
                p += 1;
            }
            _ => match backtrack {
                // let the last % swallow one more character
                Some((star, consumed)) => {
                    backtrack = Some((star, consumed + 1));
                    p = star + 1;
                    t = consumed + 1;
                }
                None => return Ok(false),
            },
        }
    }
    Ok(tokens[p..].iter().all(|token| *token == LikeToken::Any))
}

#[derive(Debug, PartialEq)]
pub enum FilterResult<R> {
    Pass(R),
    Skip(R),
    Error(R, EvaluationError),
}

pub struct FilterIterator<I> {
    iter: I,
    predicate: Predicate,
}

impl<I, R> FilterIterator<I>
where
    I: Iterator<Item = R>,
    R: Filterable,
{
    pub fn new(iter: I, predicate: Predicate) -> Self { Self { iter, predicate } }
}

impl<I, R> Iterator for FilterIterator<I>
where
    I: Iterator<Item = R>,
    R: Filterable,
{
    type Item = FilterResult<R>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|record| match evaluate_predicate(&record, &self.predicate) {
            Ok(true) => FilterResult::Pass(record),
            Ok(false) => FilterResult::Skip(record),
            Err(e) => FilterResult::Error(record, e),
        })
    }
}
