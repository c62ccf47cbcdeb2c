//! Database helpers for the boxoffice service.
//!
//! Provides the pool type alias used throughout the crate and the pool
//! constructor. Every invariant-bearing write in this service is a single
//! conditional SQL statement (or a short transaction of them), so the pool is
//! the only shared state handlers need.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::AppConfig;

/// Type alias for the application database pool.
pub type AppDb = PgPool;

/// Build the application pool with a bounded acquire timeout.
pub async fn connect(config: &AppConfig) -> Result<AppDb, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(config.db_acquire_timeout)
        .connect(&config.database_url)
        .await
}
