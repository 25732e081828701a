//! Database setup and initialization

use anyhow::{Context, Result};
use roost_core::config::DatabaseBackend;
use roost_core::Config;
use roost_db::Repositories;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Build the repositories for the configured backend. Postgres connects and
/// runs pending migrations first; the pool is returned for health checks.
pub async fn setup_database(config: &Config) -> Result<(Repositories, Option<PgPool>)> {
    match config.database_backend() {
        DatabaseBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok((Repositories::memory(), None))
        }
        DatabaseBackend::Postgres => {
            let pool = connect(config).await?;
            Ok((Repositories::postgres(pool.clone()), Some(pool)))
        }
    }
}

async fn connect(config: &Config) -> Result<PgPool> {
    let url = config
        .database_url()
        .context("DATABASE_URL must be set for the postgres backend")?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database connected successfully"
    );

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
