//! Id sequence repository: the single-row high-water mark in `id_sequence`.

use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;

const SEQUENCE_NAME: &str = "visualizations";

/// Id sequence repository.
pub struct IdSequenceRepo;

impl IdSequenceRepo {
    /// Highest id recorded so far (0 when none).
    pub fn current(conn: &Connection) -> Result<i64> {
        let value = conn
            .query_row(
                "SELECT value FROM id_sequence WHERE name = ?1",
                params![SEQUENCE_NAME],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or(0))
    }

    /// Record `value` as the highest id handed out.
    pub fn set(conn: &Connection, value: i64) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO id_sequence (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![SEQUENCE_NAME, value],
        )?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
