//! Persistence layer for the authentication subsystem.
//!
//! Exposes the [`store::AuthStore`] trait consumed by the API crate, with a
//! PostgreSQL implementation for production and an in-memory implementation
//! for tests and database-free local runs.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod store;

pub use store::memory::MemoryAuthStore;
pub use store::postgres::PgAuthStore;
pub use store::{AuthStore, StoreError};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply any pending migrations from `crates/db/migrations/`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
