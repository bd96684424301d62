use attrql::ast::{Column, ComparisonOperator, Expr, JsonRef, NativeType, Predicate};
use attrql::error::FilterError;
use attrql::literal::Literal;
use thiserror::Error;
use tokio_postgres::types::ToSql;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SqlGenerationError {
    #[error("Unsupported expression type: {0}")]
    UnsupportedExpression(&'static str),
    #[error("SqlBuilder requires a table name and at least one field or projection for complete SELECT generation")]
    IncompleteConfiguration,
    #[error(transparent)]
    Filter(#[from] FilterError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

pub enum SqlExpr {
    Sql(String),
    Argument(Box<dyn ToSql + Send + Sync>),
}

pub type SqlArgs = Vec<Box<dyn ToSql + Send + Sync>>;

/// Accumulates SQL text and bound arguments. Arguments are numbered `$1..$n` in the order they appear in the final
/// statement, whichever clause they were pushed to.
pub struct SqlBuilder {
    expressions: Vec<SqlExpr>,
    fields: Vec<String>,
    projections: Vec<(Vec<SqlExpr>, String)>,
    order_by: Vec<(Vec<SqlExpr>, OrderDirection)>,
    limit: Option<u64>,
    table_name: Option<String>,
}

impl Default for SqlBuilder {
    fn default() -> Self { Self::new() }
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self { expressions: Vec::new(), fields: Vec::new(), projections: Vec::new(), order_by: Vec::new(), limit: None, table_name: None }
    }

    pub fn with_fields<T: Into<String>>(fields: Vec<T>) -> Self {
        Self { fields: fields.into_iter().map(|f| f.into()).collect(), ..Self::new() }
    }

    pub fn table_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.table_name = Some(name.into());
        self
    }

    /// Add `expr AS "alias"` to the select list.
    pub fn select(&mut self, expr: &Expr, alias: impl Into<String>) -> Result<&mut Self, SqlGenerationError> {
        let fragment = self.fragment(|sql| sql.expr(expr))?;
        self.projections.push((fragment, alias.into()));
        Ok(self)
    }

    pub fn order_by(&mut self, expr: &Expr, direction: OrderDirection) -> Result<&mut Self, SqlGenerationError> {
        let fragment = self.fragment(|sql| sql.expr(expr))?;
        self.order_by.push((fragment, direction));
        Ok(self)
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn push(&mut self, expr: SqlExpr) { self.expressions.push(expr); }

    pub fn arg(&mut self, arg: impl ToSql + Send + Sync + 'static) {
        self.push(SqlExpr::Argument(Box::new(arg) as Box<dyn ToSql + Send + Sync>));
    }

    pub fn sql(&mut self, s: impl AsRef<str>) { self.push(SqlExpr::Sql(s.as_ref().to_owned())); }

    /// Render into a detached fragment instead of the WHERE clause.
    fn fragment(&mut self, render: impl FnOnce(&mut Self) -> Result<(), SqlGenerationError>) -> Result<Vec<SqlExpr>, SqlGenerationError> {
        let where_clause = std::mem::take(&mut self.expressions);
        let result = render(self);
        let fragment = std::mem::replace(&mut self.expressions, where_clause);
        result.map(|_| fragment)
    }

    pub fn build(self) -> Result<(String, SqlArgs), SqlGenerationError> {
        if (self.fields.is_empty() && self.projections.is_empty()) || self.table_name.is_none() {
            return Err(SqlGenerationError::IncompleteConfiguration);
        }
        let table = self.table_name.unwrap_or_default();

        let mut statement = Statement::default();
        let mut select_list: Vec<String> = self.fields.iter().map(|field| quote(field)).collect();
        for (fragment, alias) in self.projections {
            select_list.push(format!("{} AS {}", statement.render(fragment), quote(&alias)));
        }

        let mut sql = format!("SELECT {} FROM {}", select_list.join(", "), quote(&table));
        if !self.expressions.is_empty() {
            sql += " WHERE ";
            sql += &statement.render(self.expressions);
        }
        if !self.order_by.is_empty() {
            let items: Vec<String> = self
                .order_by
                .into_iter()
                .map(|(fragment, direction)| {
                    let direction = match direction {
                        OrderDirection::Asc => "ASC",
                        OrderDirection::Desc => "DESC",
                    };
                    format!("{} {}", statement.render(fragment), direction)
                })
                .collect();
            sql += " ORDER BY ";
            sql += &items.join(", ");
        }
        if let Some(limit) = self.limit {
            sql += " LIMIT ";
            // PostgreSQL expects i64 for LIMIT
            sql += &statement.render(vec![SqlExpr::Argument(Box::new(limit as i64))]);
        }

        debug!("SqlBuilder.build: {} with {} args", sql, statement.args.len());
        Ok((sql, statement.args))
    }

    pub fn build_where_clause(self) -> (String, SqlArgs) {
        let mut statement = Statement::default();
        let where_clause = statement.render(self.expressions);
        (where_clause, statement.args)
    }

    // --- expression tree flattening ---
    pub fn expr(&mut self, expr: &Expr) -> Result<(), SqlGenerationError> {
        match expr {
            Expr::Json(target) => self.json_ref(target, "#>"),
            Expr::Text(target) => self.json_ref(target, "#>>"),
            Expr::KindOf(target) => {
                self.sql("jsonb_typeof(");
                self.json_ref(target, "#>");
                self.sql(")");
            }
            Expr::ArrayLength(target) => {
                self.sql("jsonb_array_length(");
                self.json_ref(target, "#>");
                self.sql(")");
            }
            // text that reads as a fractional number must still convert, so go through numeric and truncate
            Expr::Cast { expr, to: NativeType::Integer } => {
                self.sql("trunc((");
                self.expr(expr)?;
                self.sql(")::numeric)::bigint");
            }
            Expr::Cast { expr, to } => {
                self.sql("(");
                self.expr(expr)?;
                self.sql(")::");
                self.sql(native_type_to_sql(*to));
            }
            Expr::Literal(literal) => self.literal(literal),
            Expr::List(items) => {
                if items.is_empty() {
                    return Err(SqlGenerationError::UnsupportedExpression("IN list must have at least one candidate"));
                }
                self.sql("(");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.sql(", ");
                    }
                    self.literal(item);
                }
                self.sql(")");
            }
        }
        Ok(())
    }

    fn column(&mut self, column: &Column) {
        match &column.table {
            Some(table) => self.sql(format!("{}.{}", quote(table), quote(&column.name))),
            None => self.sql(quote(&column.name)),
        }
    }

    fn json_ref(&mut self, target: &JsonRef, operator: &str) {
        self.column(&target.column);
        self.sql(format!(" {} ", operator));
        self.arg(target.path.to_text_array());
        self.sql("::text[]");
    }

    /// Every argument carries an explicit cast so the server never has to infer a parameter type.
    fn literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Bool(b) => {
                self.arg(*b);
                self.sql("::boolean");
            }
            Literal::Integer(i) => {
                self.arg(*i);
                self.sql("::bigint");
            }
            Literal::Float(f) => {
                self.arg(*f);
                self.sql("::float8");
            }
            Literal::String(s) => {
                self.arg(s.to_owned());
                self.sql("::text");
            }
            Literal::DateTime(dt) => {
                self.arg(*dt);
                self.sql("::timestamptz");
            }
            Literal::Null | Literal::Array(_) | Literal::Object(_) => {
                self.arg(literal.to_json());
                self.sql("::jsonb");
            }
        }
    }

    pub fn comparison_op(&mut self, op: &ComparisonOperator) { self.sql(comparison_op_to_sql(op)); }

    pub fn predicate(&mut self, predicate: &Predicate) -> Result<(), SqlGenerationError> {
        match predicate {
            Predicate::Comparison { left, operator, right } => {
                self.expr(left)?;
                self.sql(" ");
                self.comparison_op(operator);
                self.sql(" ");
                self.expr(right)?;
            }
            Predicate::Matches { expr, pattern } => {
                self.expr(expr)?;
                self.sql(" ~ ");
                self.arg(pattern.to_owned());
                self.sql("::text");
            }
            Predicate::Contains { target, value } => {
                self.json_ref(target, "#>");
                self.sql(" @> ");
                self.arg(value.to_json());
                self.sql("::jsonb");
            }
            Predicate::HasKey { target, key } => {
                self.json_ref(target, "#>");
                self.sql(" ? ");
                self.arg(key.to_owned());
                self.sql("::text");
            }
            // AND does not fix evaluation order; CASE does
            Predicate::Guarded { guard, predicate } => {
                self.sql("CASE WHEN ");
                self.predicate(guard)?;
                self.sql(" THEN ");
                self.predicate(predicate)?;
                self.sql(" ELSE FALSE END");
            }
            Predicate::And(left, right) => {
                self.predicate(left)?;
                self.sql(" AND ");
                self.predicate(right)?;
            }
            Predicate::Or(left, right) => {
                self.sql("(");
                self.predicate(left)?;
                self.sql(" OR ");
                self.predicate(right)?;
                self.sql(")");
            }
            Predicate::Not(pred) => {
                self.sql("NOT (");
                self.predicate(pred)?;
                self.sql(")");
            }
            Predicate::True => {
                self.sql("TRUE");
            }
            Predicate::False => {
                self.sql("FALSE");
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct Statement {
    args: SqlArgs,
}

impl Statement {
    fn render(&mut self, fragment: Vec<SqlExpr>) -> String {
        let mut sql = String::new();
        for expr in fragment {
            match expr {
                SqlExpr::Argument(arg) => {
                    self.args.push(arg);
                    sql += &format!("${}", self.args.len());
                }
                SqlExpr::Sql(s) => sql += &s,
            }
        }
        sql
    }
}

/// Escape any existing quotes by doubling them
fn quote(identifier: &str) -> String { format!(r#""{}""#, identifier.replace('"', "\"\"")) }

fn native_type_to_sql(native: NativeType) -> &'static str {
    match native {
        NativeType::Float => "float8",
        NativeType::Integer => "bigint",
        NativeType::Boolean => "boolean",
        NativeType::Text => "text",
        NativeType::Json => "jsonb",
        NativeType::Timestamp => "timestamptz",
    }
}

fn comparison_op_to_sql(op: &ComparisonOperator) -> &'static str {
    match op {
        ComparisonOperator::Equal => "=",
        ComparisonOperator::GreaterThan => ">",
        ComparisonOperator::GreaterThanOrEqual => ">=",
        ComparisonOperator::LessThan => "<",
        ComparisonOperator::LessThanOrEqual => "<=",
        ComparisonOperator::Like => "LIKE",
        ComparisonOperator::ILike => "ILIKE",
        ComparisonOperator::In => "IN",
    }
}
