//! Visualization repository: CRUD for the `visualizations` table.
//!
//! Full scans return rows in insertion (`rowid`) order. Upserts use
//! `ON CONFLICT DO UPDATE` so a replaced record keeps its position.

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::{Result, StoreError};
use crate::types::Visualization;

const COLUMNS: &str = "id, content, timestamp, title, category, tags, folder";

/// Visualization repository, stateless.
pub struct VisualizationRepo;

impl VisualizationRepo {
    /// All records in insertion order.
    pub fn get_all(conn: &Connection) -> Result<Vec<Visualization>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM visualizations ORDER BY rowid"
        ))?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Record by id, or `None`.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<Visualization>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM visualizations WHERE id = ?1"),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Whether a record with `id` exists.
    pub fn exists(conn: &Connection, id: &str) -> Result<bool> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM visualizations WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Every stored key, in insertion order.
    pub fn ids(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare("SELECT id FROM visualizations ORDER BY rowid")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    /// Insert a new record. Fails with [`StoreError::DuplicateId`] if the id exists.
    pub fn insert(conn: &Connection, v: &Visualization) -> Result<()> {
        let tags = encode_tags(v.tags.as_deref())?;
        let _ = conn
            .execute(
                "INSERT INTO visualizations (id, content, timestamp, title, category, tags, folder)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![v.id, v.content, v.timestamp, v.title, v.category, tags, v.folder],
            )
            .map_err(|e| StoreError::from_insert(e, &v.id))?;
        Ok(())
    }

    /// Insert or replace a record.
    pub fn upsert(conn: &Connection, v: &Visualization) -> Result<()> {
        let tags = encode_tags(v.tags.as_deref())?;
        let _ = conn.execute(
            "INSERT INTO visualizations (id, content, timestamp, title, category, tags, folder)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                 content = excluded.content,
                 timestamp = excluded.timestamp,
                 title = excluded.title,
                 category = excluded.category,
                 tags = excluded.tags,
                 folder = excluded.folder",
            params![v.id, v.content, v.timestamp, v.title, v.category, tags, v.folder],
        )?;
        Ok(())
    }

    /// Delete by id. Returns whether a row was removed.
    pub fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let changed = conn.execute("DELETE FROM visualizations WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Records in `category`, insertion order.
    pub fn list_by_category(conn: &Connection, category: &str) -> Result<Vec<Visualization>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM visualizations WHERE category = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt
            .query_map(params![category], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Records in `folder`, insertion order.
    pub fn list_by_folder(conn: &Connection, folder: &str) -> Result<Vec<Visualization>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM visualizations WHERE folder = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt
            .query_map(params![folder], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Number of stored records.
    pub fn count(conn: &Connection) -> Result<usize> {
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM visualizations", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    /// Map a rusqlite row to [`Visualization`].
    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Visualization> {
        let tags: Option<String> = row.get(5)?;
        let tags = tags
            .map(|raw| serde_json::from_str::<Vec<String>>(&raw))
            .transpose()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
        Ok(Visualization {
            id: row.get(0)?,
            content: row.get(1)?,
            timestamp: row.get(2)?,
            title: row.get(3)?,
            category: row.get(4)?,
            tags,
            folder: row.get(6)?,
        })
    }
}

fn encode_tags(tags: Option<&[String]>) -> Result<Option<String>> {
    Ok(tags.map(serde_json::to_string).transpose()?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
