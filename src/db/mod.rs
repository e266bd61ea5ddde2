//! Database layer for Cargomail.
//!
//! Provides SQLite connection pooling and query modules
//! for users, contacts and their sequence counters.

mod contacts;
pub mod pool;
mod sequences;
mod users;

pub use contacts::*;
pub use sequences::*;
pub use users::*;

use crate::Result;
use pool::PoolConfig;
use tracing::info;

/// Type alias for the SQLite connection pool.
pub type DbPool = sqlx::SqlitePool;

/// Connection type used inside a transaction (`&mut *tx`).
pub type DbConnection = sqlx::SqliteConnection;

/// Initialize a private in-memory database with the schema applied.
///
/// Limited to a single connection, since every SQLite in-memory
/// connection is a separate database.
pub async fn init_memory_pool() -> Result<DbPool> {
    let pool = pool::create_pool_with_config(":memory:", PoolConfig::test()).await?;
    initialize_schema(&pool).await?;
    Ok(pool)
}

/// Initialize the database schema.
///
/// Applies the complete schema from schema.sql. Uses IF NOT EXISTS
/// clauses so it's safe to run multiple times.
pub async fn initialize_schema(pool: &DbPool) -> Result<()> {
    let schema = include_str!("../../schema.sql");

    info!("Initializing database schema");

    for statement in schema_statements(schema) {
        sqlx::query(&statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully");

    Ok(())
}

/// Split a schema script into statements.
///
/// Comment lines are stripped before splitting so a `;` inside a comment
/// cannot cut a statement short.
fn schema_statements(schema: &str) -> Vec<String> {
    let code: String = schema
        .lines()
        .filter(|line| !line.trim().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    code.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .map(str::to_string)
        .collect()
}
