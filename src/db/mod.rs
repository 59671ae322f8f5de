//! Persistence layer for umanager.
//!
//! Defines the repository ports consumed by the service handlers and their
//! SQLite implementations.

mod links;
mod users;

pub use links::*;
pub use users::*;

use crate::translate::parse_rfc3339;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Type alias for the SQLite connection pool.
pub type DbPool = sqlx::SqlitePool;

const IN_MEMORY: &str = ":memory:";

/// Initialize the database connection pool.
///
/// Creates parent directories if needed. An in-memory database lives inside a
/// single connection, so the pool is pinned to one connection that never
/// expires.
pub async fn init_pool(path: &str, max_connections: u32) -> Result<DbPool> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let options = SqliteConnectOptions::from_str(path)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30));

    let pool_options = if path == IN_MEMORY {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .min_connections(1)
    };

    let pool = pool_options
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;

    info!("Database pool initialized: {}", path);

    Ok(pool)
}

/// Initialize the database schema.
///
/// Applies the schema from schema.sql. Uses IF NOT EXISTS clauses so it's
/// safe to run multiple times.
pub async fn initialize_schema(pool: &DbPool) -> Result<()> {
    let schema = include_str!("../../schema.sql");

    info!("Initializing database schema");

    for statement in schema.split(';') {
        // Strip comment lines, keeping only actual SQL
        let clean_stmt: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let clean_stmt = clean_stmt.trim();
        if clean_stmt.is_empty() {
            continue;
        }
        sqlx::query(clean_stmt).execute(pool).await?;
    }

    Ok(())
}

/// Write timestamp for a row, truncated to whole seconds.
pub(crate) fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now)
}

pub(crate) fn parse_column_time(column: &str, raw: &str) -> Result<DateTime<Utc>> {
    parse_rfc3339(raw)
        .map_err(|e| Error::Internal(format!("corrupt {} value {:?}: {}", column, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::format_timestamp;

    #[tokio::test]
    async fn test_schema_initialization() {
        let pool = init_pool(IN_MEMORY, 10).await.unwrap();
        initialize_schema(&pool).await.unwrap();
        // Safe to run twice
        initialize_schema(&pool).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert_eq!(table_names, vec!["links", "users"]);
    }

    #[tokio::test]
    async fn test_in_memory_pool_is_single_connection() {
        let pool = init_pool(IN_MEMORY, 10).await.unwrap();
        assert_eq!(pool.options().get_max_connections(), 1);
    }

    #[test]
    fn test_column_time_round_trip() {
        let at = now();
        let raw = format_timestamp(&at);
        assert!(raw.ends_with('Z'));
        assert_eq!(parse_column_time("created_at", &raw).unwrap(), at);
        assert!(parse_column_time("created_at", "yesterday").is_err());
    }
}
