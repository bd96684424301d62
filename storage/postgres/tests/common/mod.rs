//! Common utilities for Postgres integration tests

use anyhow::Result;
use std::str::FromStr;
use testcontainers::ContainerAsync;
use testcontainers_modules::{postgres, testcontainers::runners::AsyncRunner};
use tokio_postgres::{Client, NoTls};
use tracing::{warn, Level};

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    let level = std::env::var("LOG_LEVEL").ok().and_then(|level| Level::from_str(&level).ok()).unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).with_test_writer().init();
}

/// Start PostgreSQL with the `node` fixture table loaded and connect to it.
pub async fn create_postgres_container() -> Result<(ContainerAsync<postgres::Postgres>, Client)> {
    let container: ContainerAsync<postgres::Postgres> = postgres::Postgres::default()
        .with_db_name("attrql")
        .with_user("postgres")
        .with_password("postgres")
        .with_init_sql(include_str!("../fixtures.sql").to_string().into_bytes())
        .start()
        .await?;

    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let (client, connection) =
        tokio_postgres::connect(&format!("host={host} port={port} user=postgres password=postgres dbname=attrql"), NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            warn!("connection closed: {}", err);
        }
    });

    Ok((container, client))
}
