// storefront_server/src/db/mod.rs

//! PostgreSQL implementations of the core's ledger and store seams.

pub mod pg_ledger;
pub mod pg_store;
pub mod seed;

pub use pg_ledger::PgLedger;
pub use pg_store::PgOrderStore;

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

pub async fn connect(config: &AppConfig) -> Result<PgPool> {
  let url = config
    .database_url
    .as_deref()
    .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;
  let pool = PgPoolOptions::new()
    .max_connections(config.database_max_connections)
    .connect(url)
    .await?;
  info!(max_connections = config.database_max_connections, "Connected to the database.");

  if config.run_migrations {
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied.");
  }
  Ok(pool)
}
