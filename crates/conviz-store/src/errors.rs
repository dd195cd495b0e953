//! Error types for the visualization store.
//!
//! [`StoreError`] is returned by every durable and reactive store operation.
//! A missing record is not an error: lookups return `Option`.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Reading or writing an import/export file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// The database could not be opened.
    #[error("failed to open database")]
    Unavailable,

    /// A record with this id already exists.
    #[error("visualization already exists: {0}")]
    DuplicateId(String),

    /// Every numeric id up to `i64::MAX` is taken.
    #[error("no numeric id left after {max}")]
    IdSpaceExhausted {
        /// Highest numeric key or sequence value seen.
        max: i64,
    },

    /// Internal error (e.g. a blocking task panicked).
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Map a constraint violation on insert to [`StoreError::DuplicateId`].
    pub(crate) fn from_insert(err: rusqlite::Error, id: &str) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::DuplicateId(id.to_string())
            }
            other => Self::Sqlite(other),
        }
    }
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
