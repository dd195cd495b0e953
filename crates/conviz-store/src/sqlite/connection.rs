//! `SQLite` connection pool with WAL mode enabled.
//!
//! Uses `r2d2` connection pooling with `r2d2_sqlite` backend.
//! The [`PragmaCustomizer`] runs on each new connection so every pooled
//! connection gets the same journal mode and busy timeout.

use std::path::Path;
use std::time::Duration;

use conviz_settings::DatabaseSettings;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::errors::Result;

/// Alias for the connection pool type.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Alias for a pooled connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Configuration for the connection pool.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Maximum pool size (default: 4).
    pub pool_size: u32,
    /// Busy timeout in milliseconds (default: 5000).
    pub busy_timeout_ms: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pool_size: 4,
            busy_timeout_ms: 5000,
        }
    }
}

impl From<&DatabaseSettings> for ConnectionConfig {
    fn from(settings: &DatabaseSettings) -> Self {
        Self {
            pool_size: settings.pool_size.max(1),
            busy_timeout_ms: settings.busy_timeout_ms,
        }
    }
}

/// `SQLite` pragma customizer that runs on each new connection.
#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u32,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;\
             PRAGMA busy_timeout = {};\
             PRAGMA synchronous = NORMAL;",
            self.busy_timeout_ms
        ))?;
        Ok(())
    }
}

fn build(manager: SqliteConnectionManager, pool_size: u32, busy_timeout_ms: u32) -> Result<ConnectionPool> {
    let pool = Pool::builder()
        .max_size(pool_size)
        .connection_timeout(Duration::from_secs(5))
        .connection_customizer(Box::new(PragmaCustomizer { busy_timeout_ms }))
        .build(manager)?;
    Ok(pool)
}

/// Create an in-memory connection pool (for testing).
///
/// Every in-memory connection is its own database, so the pool is capped at
/// one connection regardless of `config.pool_size`.
pub fn new_in_memory(config: &ConnectionConfig) -> Result<ConnectionPool> {
    build(SqliteConnectionManager::memory(), 1, config.busy_timeout_ms)
}

/// Create a file-backed connection pool.
pub fn new_file(path: &Path, config: &ConnectionConfig) -> Result<ConnectionPool> {
    build(
        SqliteConnectionManager::file(path),
        config.pool_size,
        config.busy_timeout_ms,
    )
}

/// Current journal mode of a connection (`wal` for file databases).
pub fn journal_mode(conn: &Connection) -> Result<String> {
    Ok(conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
