//! Postgres persistence layer for CineBook.
//!
//! Pool construction, embedded migrations, `FromRow` models, and zero-sized
//! repository structs whose async methods take an executor as the first
//! argument.

use sqlx::postgres::PgPoolOptions;

use cinebook_core::error::CoreError;

pub mod models;
pub mod repositories;

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

/// Apply the embedded migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Error type for repository operations that mix domain checks (seat
/// conflicts, state guards) with database access.
///
/// Plain CRUD methods return `sqlx::Error` directly; only the composite
/// booking flows need this.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
