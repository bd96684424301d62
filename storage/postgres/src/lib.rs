//! PostgreSQL rendering for attrql expressions.
//!
//! Filter predicates and projections are rendered against a `jsonb` column with every literal and path bound as
//! an argument. [`fetch`] runs the statement on a `tokio-postgres` client.

use futures_util::TryStreamExt;
use thiserror::Error;
use tokio_postgres::Row;
use tracing::{debug, warn};

pub mod sql_builder;

pub use sql_builder::{OrderDirection, SqlArgs, SqlBuilder, SqlExpr, SqlGenerationError};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("SQL generation failed: {0}")]
    Generation(#[from] SqlGenerationError),
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

/// Build the statement and collect the resulting rows.
pub async fn fetch(client: &tokio_postgres::Client, builder: SqlBuilder) -> Result<Vec<Row>, QueryError> {
    let (sql, args) = builder.build()?;
    debug!("fetch: SQL: {} with args: {:?}", sql, args);

    let stream = client.query_raw(&sql, args).await.inspect_err(|err| warn!("fetch failed: {}", err))?;
    Ok(stream.try_collect::<Vec<_>>().await?)
}
