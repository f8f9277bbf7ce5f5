//! Persistence for users, refresh credentials and login sessions.
//!
//! - [`store`] -- the unit-of-work traits the service layer is written against.
//! - [`pg::PgStore`] -- Postgres implementation over [`repositories`].
//! - [`memory::MemoryStore`] -- in-process implementation with the same
//!   constraint and cascade behaviour, used by tests.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod memory;
pub mod models;
pub mod pg;
pub mod repositories;
pub mod store;

pub use error::DbError;
pub use memory::MemoryStore;
pub use pg::PgStore;
pub use store::{SessionStore, Store, StoreTx, TokenStore, UserStore};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running database migrations");
    sqlx::migrate!("./migrations").run(pool).await
}
