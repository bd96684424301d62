use crate::literal::Literal;
use crate::path::AttributePath;
use serde::{Deserialize, Serialize};

/// A (optionally table-qualified) JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub table: Option<String>,
    pub name: String,
}

/// A location inside a JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JsonRef {
    pub column: Column,
    pub path: AttributePath,
}

/// Native types a JSON read can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeType {
    Float,
    Integer,
    Boolean,
    Text,
    Json,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// The JSON value at the reference, still JSON typed (`#>`).
    Json(JsonRef),
    /// The value at the reference extracted as plain text, unquoted (`#>>`).
    Text(JsonRef),
    /// Runtime kind name of the value at the reference (`jsonb_typeof`).
    KindOf(JsonRef),
    /// Element count of the array at the reference (`jsonb_array_length`).
    ArrayLength(JsonRef),
    Cast { expr: Box<Expr>, to: NativeType },
    Literal(Literal),
    List(Vec<Literal>),
}

impl Expr {
    pub fn cast(self, to: NativeType) -> Self { Expr::Cast { expr: Box::new(self), to } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Equal,              // =
    GreaterThan,        // >
    LessThan,           // <
    GreaterThanOrEqual, // >=
    LessThanOrEqual,    // <=
    Like,               // LIKE
    ILike,              // ILIKE
    In,                 // IN
}

/// A boolean expression. This is the filter expression handed to the query assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Comparison {
        left: Box<Expr>,
        operator: ComparisonOperator,
        right: Box<Expr>,
    },
    /// Whole-string regular expression match.
    Matches {
        expr: Box<Expr>,
        pattern: String,
    },
    /// The JSON value at the reference structurally contains `value` (`@>`).
    Contains {
        target: JsonRef,
        value: Literal,
    },
    /// The JSON value at the reference has `key` as a top-level key (`?`).
    HasKey {
        target: JsonRef,
        key: String,
    },
    /// `guard AND predicate`, where `predicate` is only evaluated once `guard` holds.
    /// A failing guard makes the whole expression false instead of letting an incompatible cast raise.
    Guarded {
        guard: Box<Predicate>,
        predicate: Box<Predicate>,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    True,
    False,
}

impl Predicate {
    pub fn comparison(left: Expr, operator: ComparisonOperator, right: Expr) -> Self {
        Predicate::Comparison { left: Box::new(left), operator, right: Box::new(right) }
    }

    pub fn guarded(guard: Predicate, predicate: Predicate) -> Self {
        Predicate::Guarded { guard: Box::new(guard), predicate: Box::new(predicate) }
    }

    /// Conjunction that folds away `True` operands.
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::True, other) | (other, Predicate::True) => other,
            (left, right) => Predicate::And(Box::new(left), Box::new(right)),
        }
    }

    /// Disjunction that folds away `False` operands.
    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::False, other) | (other, Predicate::False) => other,
            (left, right) => Predicate::Or(Box::new(left), Box::new(right)),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self { Predicate::Not(Box::new(self)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> Predicate {
        let target = JsonRef { column: Column { table: None, name: "attributes".into() }, path: AttributePath::parse("a") };
        Predicate::comparison(Expr::KindOf(target), ComparisonOperator::Equal, Expr::Literal(Literal::from("number")))
    }

    #[test]
    fn test_and_folds_true() {
        assert_eq!(Predicate::True.and(guard()), guard());
        assert_eq!(guard().and(Predicate::True), guard());
        assert_eq!(Predicate::True.and(Predicate::True), Predicate::True);
        assert!(matches!(guard().and(guard()), Predicate::And(_, _)));
    }

    #[test]
    fn test_or_folds_false() {
        assert_eq!(Predicate::False.or(guard()), guard());
        assert!(matches!(guard().or(guard()), Predicate::Or(_, _)));
    }

    #[test]
    fn test_serde_round_trip() {
        let predicate = Predicate::guarded(guard(), Predicate::True).not();
        let json = serde_json::to_string(&predicate).unwrap();
        let back: Predicate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, predicate);
    }
}
