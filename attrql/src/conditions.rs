//! Filters written as JSON documents.
//!
//! ```json
//! {
//!     "metadata.count": {">": 5, "<=": 10},
//!     "tags": {"of_length": 3},
//!     "or": [{"kind": {"==": "relax"}}, {"kind": {"!like": "scf%"}}]
//! }
//! ```
//!
//! Each path maps operator names to values. Everything at one level is combined with AND; the reserved keys
//! `and` and `or` take a list of nested condition documents. Prefixing an operator name with `!` negates it.

use crate::ast::Predicate;
use crate::builder::build_filter_expression;
use crate::column::ColumnHandle;
use crate::error::FilterError;
use crate::literal::Literal;
use crate::operator::FilterOperator;
use crate::path::AttributePath;
use tracing::trace;

const NEGATION_PREFIX: char = '!';

pub fn parse_conditions<C: ColumnHandle>(column: &C, conditions: &serde_json::Value) -> Result<Predicate, FilterError> {
    let serde_json::Value::Object(entries) = conditions else {
        return Err(FilterError::invalid_value("and", format!("expected an object of conditions, got {}", conditions)));
    };

    let mut keys: Vec<&String> = entries.keys().collect();
    keys.sort();

    let mut result = Predicate::True;
    for key in keys {
        let value = &entries[key];
        let predicate = match key.as_str() {
            "and" => nested(column, "and", value)?.into_iter().fold(Predicate::True, Predicate::and),
            "or" => nested(column, "or", value)?.into_iter().fold(Predicate::False, Predicate::or),
            path => path_conditions(column, &AttributePath::parse(path), value)?,
        };
        result = result.and(predicate);
    }
    Ok(result)
}

fn nested<C: ColumnHandle>(column: &C, combinator: &'static str, value: &serde_json::Value) -> Result<Vec<Predicate>, FilterError> {
    let serde_json::Value::Array(items) = value else {
        return Err(FilterError::invalid_value(combinator, "expected a list of condition objects"));
    };
    items.iter().map(|item| parse_conditions(column, item)).collect()
}

fn path_conditions<C: ColumnHandle>(column: &C, path: &AttributePath, operators: &serde_json::Value) -> Result<Predicate, FilterError> {
    let serde_json::Value::Object(operators) = operators else {
        return Err(FilterError::invalid_value("and", format!("conditions on {} must map operator names to values", path)));
    };

    let mut names: Vec<&String> = operators.keys().collect();
    names.sort();

    let mut result = Predicate::True;
    for name in names {
        let (negated, operator) = match name.strip_prefix(NEGATION_PREFIX) {
            Some(operator) => (true, operator),
            None => (false, name.as_str()),
        };
        let operator: FilterOperator = operator.parse()?;
        trace!("condition {} {}{} {}", path, if negated { "not " } else { "" }, operator, operators[name]);

        let predicate = build_filter_expression(column, path, operator, Literal::try_from(operators[name].clone())?)?;
        result = result.and(if negated { predicate.not() } else { predicate });
    }
    Ok(result)
}
