//! [`VisualizationsDb`]: the durable key-value store of visualizations.
//!
//! Wraps a connection pool. Every operation runs in its own transaction and
//! either commits fully or not at all. Absence is `Ok(None)`, never an error.
//! Failures are returned to the caller and never retried here.

use std::path::Path;

use conviz_core::time::now_ms;
use conviz_settings::{DatabaseSettings, ImportConflictStrategy};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, error, info, instrument};

use crate::errors::{Result, StoreError};
use crate::ids::{max_numeric_id, next_numeric_id};
use crate::sqlite::connection::{self, ConnectionConfig, ConnectionPool, PooledConnection};
use crate::sqlite::migrations::run_migrations;
use crate::sqlite::repositories::{IdSequenceRepo, VisualizationRepo};
use crate::types::{ImportReport, Visualization, VisualizationDraft};

/// Open the database described by `settings`.
///
/// Creates the parent directory and applies migrations. Any failure is
/// logged and yields `None`: callers treat the store as unavailable.
pub fn open_database(settings: &DatabaseSettings) -> Option<VisualizationsDb> {
    let path = settings.resolved_path();
    match VisualizationsDb::open(&path, &ConnectionConfig::from(settings)) {
        Ok(db) => Some(db),
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to open database");
            None
        }
    }
}

/// Durable visualization store backed by `SQLite`.
#[derive(Clone)]
pub struct VisualizationsDb {
    pool: ConnectionPool,
}

impl VisualizationsDb {
    /// Open (or create) a file-backed database and migrate it.
    pub fn open(path: &Path, config: &ConnectionConfig) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let pool = connection::new_file(path, config)?;
        Self::with_pool(pool)
    }

    /// Open a migrated in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let pool = connection::new_in_memory(&ConnectionConfig::default())?;
        Self::with_pool(pool)
    }

    /// Wrap an existing pool, applying pending migrations.
    pub fn with_pool(pool: ConnectionPool) -> Result<Self> {
        {
            let conn = pool.get()?;
            let applied = run_migrations(&conn)?;
            debug!(applied, "database ready");
        }
        Ok(Self { pool })
    }

    /// Get a connection from the pool.
    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Every record, in insertion order.
    pub fn get_all(&self) -> Result<Vec<Visualization>> {
        let conn = self.conn()?;
        VisualizationRepo::get_all(&conn)
    }

    /// Record by id; `None` if absent.
    pub fn get(&self, id: &str) -> Result<Option<Visualization>> {
        let conn = self.conn()?;
        VisualizationRepo::get(&conn, id)
    }

    /// Insert a record whose id must not exist yet.
    #[instrument(skip_all, fields(id = %visualization.id))]
    pub fn add(&self, visualization: &Visualization) -> Result<()> {
        let conn = self.conn()?;
        VisualizationRepo::insert(&conn, visualization)
    }

    /// Insert or replace a record.
    #[instrument(skip_all, fields(id = %visualization.id))]
    pub fn update(&self, visualization: &Visualization) -> Result<()> {
        let conn = self.conn()?;
        VisualizationRepo::upsert(&conn, visualization)
    }

    /// Delete by id. Deleting a missing id is not an error.
    #[instrument(skip(self))]
    pub fn delete(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        let removed = VisualizationRepo::delete(&conn, id)?;
        debug!(removed, "delete");
        Ok(())
    }

    /// One more than the highest numeric key, as a string (`"1"` when empty).
    ///
    /// This is a read-only scan. Use [`create`](Self::create) to assign an
    /// id and insert atomically.
    pub fn next_id(&self) -> Result<String> {
        let conn = self.conn()?;
        let ids = VisualizationRepo::ids(&conn)?;
        next_numeric_id(ids.iter().map(String::as_str))
            .ok_or(StoreError::IdSpaceExhausted { max: i64::MAX })
    }

    /// Assign the next id, stamp the current time, and insert, atomically.
    ///
    /// The id is one past both the highest numeric key and the highest id
    /// ever handed out, so ids of deleted records are not reused.
    #[instrument(skip_all, fields(title = %draft.title))]
    pub fn create(&self, draft: VisualizationDraft) -> Result<Visualization> {
        let conn = self.conn()?;
        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate)?;

        let id = reserve_id(&tx)?;
        let visualization = Visualization::from_draft(draft, id, now_ms());
        VisualizationRepo::insert(&tx, &visualization)?;
        tx.commit()?;

        info!(id = %visualization.id, "visualization created");
        Ok(visualization)
    }

    /// Records in `category`.
    pub fn list_by_category(&self, category: &str) -> Result<Vec<Visualization>> {
        let conn = self.conn()?;
        VisualizationRepo::list_by_category(&conn, category)
    }

    /// Records in `folder`.
    pub fn list_by_folder(&self, folder: &str) -> Result<Vec<Visualization>> {
        let conn = self.conn()?;
        VisualizationRepo::list_by_folder(&conn, folder)
    }

    /// Bulk insert in one transaction.
    ///
    /// Records whose id already exists (in the store or earlier in
    /// `records`) are handled per `strategy`. With
    /// [`ImportConflictStrategy::Fail`] the first conflict aborts and nothing
    /// is stored.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub fn import(
        &self,
        records: &[Visualization],
        strategy: ImportConflictStrategy,
    ) -> Result<ImportReport> {
        let conn = self.conn()?;
        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate)?;
        let mut report = ImportReport::default();

        for record in records {
            if !VisualizationRepo::exists(&tx, &record.id)? {
                VisualizationRepo::insert(&tx, record)?;
                report.imported += 1;
                continue;
            }
            match strategy {
                ImportConflictStrategy::Fail => {
                    return Err(StoreError::DuplicateId(record.id.clone()));
                }
                ImportConflictStrategy::Skip => {
                    debug!(id = %record.id, "skipping existing id");
                    report.skipped += 1;
                }
                ImportConflictStrategy::Reassign => {
                    let id = reserve_id(&tx)?;
                    debug!(from = %record.id, to = %id, "reassigning conflicting id");
                    let renamed = Visualization {
                        id,
                        ..record.clone()
                    };
                    VisualizationRepo::insert(&tx, &renamed)?;
                    report.reassigned += 1;
                }
            }
        }

        tx.commit()?;
        info!(
            imported = report.imported,
            skipped = report.skipped,
            reassigned = report.reassigned,
            "import complete"
        );
        Ok(report)
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        VisualizationRepo::count(&conn)
    }
}

impl std::fmt::Debug for VisualizationsDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualizationsDb")
            .field("max_connections", &self.pool.max_size())
            .finish_non_exhaustive()
    }
}

/// Advance the id sequence past every existing key and return the new id.
fn reserve_id(conn: &Connection) -> Result<String> {
    let ids = VisualizationRepo::ids(conn)?;
    let highest = IdSequenceRepo::current(conn)?.max(max_numeric_id(ids.iter().map(String::as_str)));
    let next = highest
        .checked_add(1)
        .ok_or(StoreError::IdSpaceExhausted { max: highest })?;
    IdSequenceRepo::set(conn, next)?;
    Ok(next.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn draft(title: &str) -> VisualizationDraft {
        VisualizationDraft {
            content: format!("# {title}"),
            title: title.into(),
            category: "General".into(),
            tags: None,
            folder: None,
        }
    }

    fn viz(id: &str) -> Visualization {
        Visualization::from_draft(draft(&format!("v{id}")), id.into(), 1)
    }

    #[test]
    fn next_id_on_empty_store_is_one() {
        let db = VisualizationsDb::open_in_memory().unwrap();
        assert_eq!(db.next_id().unwrap(), "1");
    }

    #[test]
    fn next_id_uses_leading_integers() {
        let db = VisualizationsDb::open_in_memory().unwrap();
        for id in ["3", "12abc", "notes", "7"] {
            db.add(&viz(id)).unwrap();
        }
        assert_eq!(db.next_id().unwrap(), "13");
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let db = VisualizationsDb::open_in_memory().unwrap();
        let a = db.create(draft("a")).unwrap();
        let b = db.create(draft("b")).unwrap();
        assert_eq!(a.id, "1");
        assert_eq!(b.id, "2");
        assert_eq!(db.get("2").unwrap().unwrap(), b);
    }

    #[test]
    fn create_skips_past_existing_keys() {
        let db = VisualizationsDb::open_in_memory().unwrap();
        db.add(&viz("41")).unwrap();
        assert_eq!(db.create(draft("x")).unwrap().id, "42");
    }

    #[test]
    fn create_does_not_reuse_deleted_ids() {
        let db = VisualizationsDb::open_in_memory().unwrap();
        let a = db.create(draft("a")).unwrap();
        db.delete(&a.id).unwrap();
        assert_eq!(db.next_id().unwrap(), "1");
        assert_eq!(db.create(draft("b")).unwrap().id, "2");
    }

    #[test]
    fn id_space_exhaustion_is_an_error() {
        let db = VisualizationsDb::open_in_memory().unwrap();
        db.add(&viz("3")).unwrap();
        db.add(&viz(&i64::MAX.to_string())).unwrap();

        assert_matches!(db.next_id(), Err(StoreError::IdSpaceExhausted { max: i64::MAX }));
        assert_matches!(
            db.create(draft("x")),
            Err(StoreError::IdSpaceExhausted { max: i64::MAX })
        );
        assert_eq!(db.count().unwrap(), 2);

        // freeing the top key makes ids available again
        db.delete(&i64::MAX.to_string()).unwrap();
        assert_eq!(db.create(draft("y")).unwrap().id, "4");
    }

    #[test]
    fn create_stamps_current_time() {
        let db = VisualizationsDb::open_in_memory().unwrap();
        let before = now_ms();
        let v = db.create(draft("t")).unwrap();
        assert!(v.timestamp >= before && v.timestamp <= now_ms());
    }

    #[test]
    fn add_duplicate_is_rejected() {
        let db = VisualizationsDb::open_in_memory().unwrap();
        db.add(&viz("1")).unwrap();
        assert_matches!(db.add(&viz("1")), Err(StoreError::DuplicateId(_)));
    }

    #[test]
    fn import_fail_rolls_back_everything() {
        let db = VisualizationsDb::open_in_memory().unwrap();
        db.add(&viz("2")).unwrap();

        let err = db
            .import(&[viz("1"), viz("2"), viz("3")], ImportConflictStrategy::Fail)
            .unwrap_err();
        assert_matches!(err, StoreError::DuplicateId(id) if id == "2");
        assert_eq!(db.count().unwrap(), 1);
        assert!(db.get("1").unwrap().is_none());
    }

    #[test]
    fn import_skip_keeps_existing() {
        let db = VisualizationsDb::open_in_memory().unwrap();
        let existing = viz("2");
        db.add(&existing).unwrap();

        let mut incoming = viz("2");
        incoming.title = "incoming".into();
        let report = db
            .import(&[viz("1"), incoming], ImportConflictStrategy::Skip)
            .unwrap();
        assert_eq!(
            report,
            ImportReport {
                imported: 1,
                skipped: 1,
                reassigned: 0
            }
        );
        assert_eq!(db.get("2").unwrap().unwrap(), existing);
    }

    #[test]
    fn import_reassign_gives_new_ids() {
        let db = VisualizationsDb::open_in_memory().unwrap();
        db.add(&viz("1")).unwrap();

        let mut incoming = viz("1");
        incoming.title = "incoming".into();
        let report = db
            .import(&[incoming, viz("5")], ImportConflictStrategy::Reassign)
            .unwrap();
        assert_eq!(report.reassigned, 1);
        assert_eq!(report.imported, 1);

        let titles: Vec<_> = db.get_all().unwrap().into_iter().map(|v| (v.id, v.title)).collect();
        assert_eq!(
            titles,
            vec![
                ("1".to_string(), "v1".to_string()),
                ("2".to_string(), "incoming".to_string()),
                ("5".to_string(), "v5".to_string()),
            ]
        );
    }

    #[test]
    fn import_handles_duplicates_within_batch() {
        let db = VisualizationsDb::open_in_memory().unwrap();
        let report = db
            .import(&[viz("1"), viz("1")], ImportConflictStrategy::Skip)
            .unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("viz.db");
        let db = VisualizationsDb::open(&path, &ConnectionConfig::default()).unwrap();
        db.add(&viz("1")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn open_database_returns_none_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let settings = DatabaseSettings {
            path: blocker.join("viz.db").to_string_lossy().into_owned(),
            ..DatabaseSettings::default()
        };
        assert!(open_database(&settings).is_none());
    }

    #[test]
    fn open_database_with_valid_path() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DatabaseSettings {
            path: dir.path().join("viz.db").to_string_lossy().into_owned(),
            ..DatabaseSettings::default()
        };
        let db = open_database(&settings).unwrap();
        assert_eq!(db.count().unwrap(), 0);
    }
}
