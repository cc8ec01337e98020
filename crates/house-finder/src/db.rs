//! SQLite pool construction and schema bootstrap.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::config::DatabaseConfig;

const SCHEMA: [&str; 4] = [
    r#"CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        email TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS listings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER REFERENCES users(id),
        price REAL NOT NULL,
        bedrooms INTEGER NOT NULL,
        year_built INTEGER NOT NULL,
        garage_cars INTEGER NOT NULL,
        lot_area INTEGER NOT NULL,
        overall_qual INTEGER NOT NULL,
        image_path TEXT,
        expires_at INTEGER NOT NULL,
        lat REAL NOT NULL,
        lon REAL NOT NULL,
        interest_count INTEGER NOT NULL DEFAULT 0
    )"#,
    "CREATE INDEX IF NOT EXISTS listings_expires_at ON listings (expires_at)",
    "CREATE INDEX IF NOT EXISTS listings_owner_expiry ON listings (user_id, expires_at)",
];

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(err) if err.is_unique_violation() => RepositoryError::Conflict,
            other => RepositoryError::Unavailable(other.to_string()),
        }
    }
}

/// Opens the pool described by `config`, creating the database file when missing.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let mut pool = SqlitePoolOptions::new().max_connections(config.max_connections.max(1));
    if config.url.contains(":memory:") {
        // An in-memory database lives only as long as its connection.
        pool = pool.idle_timeout(None).max_lifetime(None);
    }

    let pool = pool.connect_with(options).await?;
    info!(url = %config.url, max_connections = config.max_connections, "database pool ready");
    Ok(pool)
}

/// Idempotently creates the `users` and `listings` tables.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    debug!("schema up to date");
    Ok(())
}

/// Convenience for callers that want a ready-to-use pool.
pub async fn connect_and_migrate(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let pool = connect(config).await?;
    migrate(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let pool = connect(&DatabaseConfig::in_memory()).await.expect("pool");
        migrate(&pool).await.expect("first migration");
        migrate(&pool).await.expect("second migration");

        let (tables,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'listings')",
        )
        .fetch_one(&pool)
        .await
        .expect("count tables");
        assert_eq!(tables, 2);
    }

    #[test]
    fn unique_violation_maps_to_conflict_only_for_database_errors() {
        let missing = RepositoryError::from(sqlx::Error::RowNotFound);
        assert!(matches!(missing, RepositoryError::NotFound));

        let closed = RepositoryError::from(sqlx::Error::PoolClosed);
        assert!(matches!(closed, RepositoryError::Unavailable(_)));
    }
}
