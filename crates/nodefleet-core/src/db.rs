//! Shared database types and utilities.
//!
//! Provides `DatabaseError`, `unix_timestamp()` and the `SQLite` pool
//! constructors used by the `nodefleet` storage layer. Both pool flavours
//! enforce foreign keys on every connection; cascading deletes rely on it.

use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::info;

/// Database errors.
///
/// Constraint failures are split out of `Query` so callers can map them to
/// distinct outcomes without string matching.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Foreign key violation: {0}")]
    ForeignKey(String),

    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Write attempted in a read-only transaction: {0}")]
    ReadOnly(&'static str),
}

impl DatabaseError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => Self::NotFound(e.to_string()),
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::ForeignKeyViolation => Self::ForeignKey(db_err.message().to_string()),
                ErrorKind::UniqueViolation => Self::UniqueViolation(db_err.message().to_string()),
                ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                    Self::ConstraintViolation(db_err.message().to_string())
                }
                _ => Self::Query(e.to_string()),
            },
            _ => Self::Query(e.to_string()),
        }
    }
}

/// Open (or create) a `SQLite` connection pool at the given file path.
///
/// Creates the parent directory if it does not exist, enables WAL journal
/// mode, foreign keys, and sets a 5-second busy timeout so concurrent
/// writers queue instead of failing.
pub async fn open_pool(path: &Path) -> Result<Pool<Sqlite>, DatabaseError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io(e.to_string()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;

    info!(path = %path.display(), "Database opened");

    Ok(pool)
}

/// Open an in-memory `SQLite` connection pool.
///
/// Every connection to `:memory:` is a separate database, so the pool holds
/// exactly one connection and never recycles it.
pub async fn open_pool_in_memory() -> Result<Pool<Sqlite>, DatabaseError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| DatabaseError::Connection(e.to_string()))?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;

    Ok(pool)
}

/// Returns the current time as a Unix timestamp (seconds since epoch).
#[allow(clippy::cast_possible_wrap)]
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unix_timestamp_is_reasonable() {
        let ts = unix_timestamp();
        // Should be after 2024-01-01
        assert!(ts > 1_704_067_200);
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn in_memory_pool_enforces_foreign_keys() {
        let pool = open_pool_in_memory().await.unwrap();
        sqlx::query("CREATE TABLE parent (id INTEGER PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE child (id INTEGER PRIMARY KEY, \
             parent_id INTEGER NOT NULL REFERENCES parent(id))",
        )
        .execute(&pool)
        .await
        .unwrap();

        let err = sqlx::query("INSERT INTO child (parent_id) VALUES (42)")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(
            DatabaseError::from(err),
            DatabaseError::ForeignKey(_)
        ));
    }

    #[tokio::test]
    async fn unique_violation_is_classified() {
        let pool = open_pool_in_memory().await.unwrap();
        sqlx::query("CREATE TABLE t (v TEXT NOT NULL UNIQUE)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO t (v) VALUES ('a')")
            .execute(&pool)
            .await
            .unwrap();
        let err = sqlx::query("INSERT INTO t (v) VALUES ('a')")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(
            DatabaseError::from(err),
            DatabaseError::UniqueViolation(_)
        ));
    }

    #[tokio::test]
    async fn file_pool_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("fleet.db");
        let pool = open_pool(&path).await.unwrap();
        sqlx::query("SELECT 1").execute(&pool).await.unwrap();
        assert!(path.exists());
    }
}
