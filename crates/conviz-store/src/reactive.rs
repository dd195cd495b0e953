//! [`VisualizationStore`]: cached, observable view over [`VisualizationsDb`].
//!
//! The cache lives in a `tokio::sync::watch` channel. Readers take a
//! snapshot with [`VisualizationStore::state`] or wait for changes through
//! [`VisualizationStore::subscribe`]. The cache is only touched after the
//! durable operation has completed, so it never runs ahead of the database.
//!
//! When built with an [`EventBus`], successful mutations publish
//! `STATE_UPDATE` (path `["visualizations", <operation>]`), a save also
//! publishes `VISUALIZATION_READY`, and failures publish `ERROR` with code
//! [`STORE_ERROR_CODE`].

use std::path::{Path, PathBuf};

use conviz_core::time::now_iso8601;
use conviz_events::{AppEvent, EventBus};
use conviz_settings::ImportConflictStrategy;
use serde_json::{Map, Value, json};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::db::VisualizationsDb;
use crate::errors::{Result, StoreError};
use crate::types::{ImportReport, Visualization, VisualizationDraft, VisualizationStoreState};

/// Error code of `ERROR` events published for failed store operations.
pub const STORE_ERROR_CODE: &str = "STORE_ERROR";

/// Content format reported in `VISUALIZATION_READY`.
pub const CONTENT_FORMAT: &str = "markdown";

/// Reactive visualization store.
pub struct VisualizationStore {
    db: Option<VisualizationsDb>,
    bus: Option<EventBus>,
    import_strategy: ImportConflictStrategy,
    state: watch::Sender<VisualizationStoreState>,
}

impl VisualizationStore {
    /// Create a store over `db`. `None` means the database could not be
    /// opened; every operation then fails with [`StoreError::Unavailable`].
    pub fn new(db: Option<VisualizationsDb>) -> Self {
        let (state, _) = watch::channel(VisualizationStoreState::default());
        Self {
            db,
            bus: None,
            import_strategy: ImportConflictStrategy::default(),
            state,
        }
    }

    /// Publish change and failure notifications on `bus`.
    #[must_use]
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Conflict handling used by imports.
    #[must_use]
    pub fn with_import_strategy(mut self, strategy: ImportConflictStrategy) -> Self {
        self.import_strategy = strategy;
        self
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> VisualizationStoreState {
        self.state.borrow().clone()
    }

    /// Snapshot of the cached items.
    pub fn items(&self) -> Vec<Visualization> {
        self.state.borrow().items.clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<VisualizationStoreState> {
        self.state.subscribe()
    }

    /// Cached items whose title or content contains `term`, ignoring case.
    pub fn search(&self, term: &str) -> Vec<Visualization> {
        self.state
            .borrow()
            .items
            .iter()
            .filter(|v| v.matches(term))
            .cloned()
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Durable operations
    // ─────────────────────────────────────────────────────────────────────

    /// Replace the cache with the full contents of the database.
    ///
    /// On failure the cached items are cleared and `error` is set.
    pub async fn load_visualizations(&self) -> Result<()> {
        self.state.send_modify(|s| s.loading = true);

        match self.with_db(|db| db.get_all()).await {
            Ok(items) => {
                let count = items.len();
                let _ = self.state.send_replace(VisualizationStoreState {
                    items,
                    loading: false,
                    error: None,
                });
                debug!(count, "visualizations loaded");
                self.notify("load", json!({ "count": count }));
                Ok(())
            }
            Err(e) => {
                self.state.send_modify(|s| {
                    s.items.clear();
                    s.loading = false;
                });
                Err(self.fail("load", e))
            }
        }
    }

    /// Read one record from the database; `None` if absent. The cache is
    /// not touched.
    pub async fn get_visualization(&self, id: &str) -> Result<Option<Visualization>> {
        let key = id.to_string();
        self.with_db(move |db| db.get(&key))
            .await
            .map_err(|e| self.fail("get", e))
    }

    /// Persist a draft under a freshly assigned id and append it to the cache.
    pub async fn save_visualization(&self, draft: VisualizationDraft) -> Result<Visualization> {
        match self.with_db(move |db| db.create(draft)).await {
            Ok(saved) => {
                self.state.send_modify(|s| s.items.push(saved.clone()));
                self.notify("save", record_value(&saved));
                self.publish(AppEvent::visualization_ready(&*saved.id, CONTENT_FORMAT));
                Ok(saved)
            }
            Err(e) => Err(self.fail("save", e)),
        }
    }

    /// Upsert a record and replace it in the cache (append if not cached).
    pub async fn update_visualization(&self, visualization: Visualization) -> Result<()> {
        let record = visualization.clone();
        match self.with_db(move |db| db.update(&record)).await {
            Ok(()) => {
                self.state.send_modify(|s| {
                    match s.items.iter_mut().find(|v| v.id == visualization.id) {
                        Some(slot) => *slot = visualization.clone(),
                        None => s.items.push(visualization.clone()),
                    }
                });
                self.notify("update", record_value(&visualization));
                Ok(())
            }
            Err(e) => Err(self.fail("update", e)),
        }
    }

    /// Delete a record and drop it from the cache.
    pub async fn delete_visualization(&self, id: &str) -> Result<()> {
        let key = id.to_string();
        match self.with_db(move |db| db.delete(&key)).await {
            Ok(()) => {
                self.state.send_modify(|s| s.items.retain(|v| v.id != id));
                self.notify("delete", json!({ "id": id }));
                Ok(())
            }
            Err(e) => Err(self.fail("delete", e)),
        }
    }

    /// Records in `category`, read from the database through its index.
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<Visualization>> {
        let key = category.to_string();
        self.with_db(move |db| db.list_by_category(&key))
            .await
            .map_err(|e| self.fail("list", e))
    }

    /// Records in `folder`, read from the database through its index.
    pub async fn list_by_folder(&self, folder: &str) -> Result<Vec<Visualization>> {
        let key = folder.to_string();
        self.with_db(move |db| db.list_by_folder(&key))
            .await
            .map_err(|e| self.fail("list", e))
    }

    /// Import records from a JSON array document, then reload the cache.
    pub async fn import_json(&self, content: &str) -> Result<ImportReport> {
        let records: Vec<Visualization> = match serde_json::from_str(content) {
            Ok(records) => records,
            Err(e) => return Err(self.fail("import", e.into())),
        };

        let strategy = self.import_strategy;
        let report = match self.with_db(move |db| db.import(&records, strategy)).await {
            Ok(report) => report,
            Err(e) => return Err(self.fail("import", e)),
        };

        self.load_visualizations().await?;
        self.notify(
            "import",
            serde_json::to_value(report).unwrap_or(Value::Null),
        );
        Ok(report)
    }

    /// Import records from a JSON file, then reload the cache.
    pub async fn import_visualizations(&self, path: &Path) -> Result<ImportReport> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => return Err(self.fail("import", e.into())),
        };
        self.import_json(&content).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────

    /// The cached items as a pretty-printed JSON array.
    pub fn export_json(&self) -> Result<String> {
        let items = self.items();
        serde_json::to_string_pretty(&items).map_err(|e| self.fail("export", e.into()))
    }

    /// Write [`export_json`](Self::export_json) to
    /// `dir/`[`export_file_name`] and return the path.
    pub async fn export_visualizations(&self, dir: &Path) -> Result<PathBuf> {
        let document = self.export_json()?;
        let path = dir.join(export_file_name(&now_iso8601()));
        if let Err(e) = tokio::fs::write(&path, document).await {
            return Err(self.fail("export", e.into()));
        }
        debug!(path = %path.display(), "visualizations exported");
        Ok(path)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────

    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&VisualizationsDb) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone().ok_or(StoreError::Unavailable)?;
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StoreError::Internal(format!("blocking task failed: {e}")))?
    }

    fn fail(&self, operation: &'static str, err: StoreError) -> StoreError {
        let message = err.to_string();
        warn!(operation, error = %message, "visualization store operation failed");
        self.state.send_modify(|s| s.error = Some(message.clone()));

        let mut context = Map::new();
        let _ = context.insert("operation".into(), Value::from(operation));
        self.publish(AppEvent::error(STORE_ERROR_CODE, message, Some(context)));
        err
    }

    fn notify(&self, operation: &str, value: Value) {
        self.publish(AppEvent::state_update(["visualizations", operation], value));
    }

    fn publish(&self, event: AppEvent) {
        if let Some(bus) = &self.bus {
            bus.publish(event);
        }
    }
}

impl std::fmt::Debug for VisualizationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("VisualizationStore")
            .field("available", &self.db.is_some())
            .field("items", &state.items.len())
            .field("loading", &state.loading)
            .field("error", &state.error)
            .finish_non_exhaustive()
    }
}

/// Export file name for a given ISO-8601 timestamp, with `:` replaced by `-`
/// so the name is valid on every filesystem.
pub fn export_file_name(iso_timestamp: &str) -> String {
    format!("visualizations-{}.json", iso_timestamp.replace(':', "-"))
}

fn record_value(v: &Visualization) -> Value {
    serde_json::to_value(v).unwrap_or(Value::Null)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use conviz_events::{EventData, EventType};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn draft(title: &str) -> VisualizationDraft {
        VisualizationDraft {
            content: format!("# {title}\n\nbody"),
            title: title.into(),
            category: "General".into(),
            tags: None,
            folder: None,
        }
    }

    fn store() -> VisualizationStore {
        VisualizationStore::new(Some(VisualizationsDb::open_in_memory().unwrap()))
    }

    fn record_events(bus: &EventBus) -> (Arc<Mutex<Vec<AppEvent>>>, conviz_events::Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = bus.subscribe_to_many(
            &[
                EventType::StateUpdate,
                EventType::VisualizationReady,
                EventType::Error,
            ],
            move |event| {
                sink.lock().push(event.clone());
                Ok(())
            },
        );
        (seen, sub)
    }

    #[tokio::test]
    async fn starts_empty() {
        let store = store();
        assert_eq!(store.state(), VisualizationStoreState::default());
    }

    #[tokio::test]
    async fn save_appends_to_cache() {
        let store = store();
        let saved = store.save_visualization(draft("Photosynthesis")).await.unwrap();
        assert_eq!(saved.id, "1");
        assert_eq!(store.items(), vec![saved]);
        assert!(store.state().error.is_none());
    }

    #[tokio::test]
    async fn update_replaces_in_place() {
        let store = store();
        let a = store.save_visualization(draft("a")).await.unwrap();
        let _b = store.save_visualization(draft("b")).await.unwrap();

        let renamed = Visualization {
            title: "renamed".into(),
            ..a
        };
        store.update_visualization(renamed.clone()).await.unwrap();
        assert_eq!(store.items()[0], renamed);
        assert_eq!(store.items().len(), 2);
    }

    #[tokio::test]
    async fn update_of_uncached_id_appends() {
        let store = store();
        let v = Visualization::from_draft(draft("new"), "99".into(), 5);
        store.update_visualization(v.clone()).await.unwrap();
        assert_eq!(store.items(), vec![v]);
    }

    #[tokio::test]
    async fn delete_removes_from_cache() {
        let store = store();
        let a = store.save_visualization(draft("a")).await.unwrap();
        store.delete_visualization(&a.id).await.unwrap();
        assert!(store.items().is_empty());
        // deleting again is fine
        store.delete_visualization(&a.id).await.unwrap();
    }

    #[tokio::test]
    async fn unavailable_store_reports_errors() {
        let store = VisualizationStore::new(None);

        let err = store.save_visualization(draft("x")).await.unwrap_err();
        assert_matches!(err, StoreError::Unavailable);
        assert_eq!(store.state().error.as_deref(), Some("failed to open database"));

        assert_matches!(store.load_visualizations().await, Err(StoreError::Unavailable));
        let state = store.state();
        assert!(state.items.is_empty());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn failed_mutations_keep_cached_items() {
        let pool = crate::sqlite::connection::new_in_memory(&crate::ConnectionConfig::default())
            .unwrap();
        let store = VisualizationStore::new(Some(VisualizationsDb::with_pool(pool.clone()).unwrap()));
        let a = store.save_visualization(draft("a")).await.unwrap();
        let b = store.save_visualization(draft("b")).await.unwrap();
        let saved = vec![a.clone(), b];

        let _ = pool.get().unwrap().execute("DROP TABLE visualizations", []).unwrap();

        let renamed = Visualization {
            title: "renamed".into(),
            ..a.clone()
        };
        assert!(store.update_visualization(renamed).await.is_err());
        assert!(store.state().error.is_some());
        assert_eq!(store.items(), saved);

        assert!(store.delete_visualization(&a.id).await.is_err());
        assert_eq!(store.items(), saved);

        assert!(store.save_visualization(draft("c")).await.is_err());
        let state = store.state();
        assert!(state.error.is_some());
        assert_eq!(state.items, saved);
    }

    #[tokio::test]
    async fn save_after_max_id_import_reports_exhaustion() {
        let store = store();
        let doc = format!(
            r#"[{{"id": "{}", "content": "c", "timestamp": 1, "title": "top", "category": "x"}}]"#,
            i64::MAX
        );
        let _ = store.import_json(&doc).await.unwrap();
        let before = store.items();

        assert_matches!(
            store.save_visualization(draft("next")).await,
            Err(StoreError::IdSpaceExhausted { .. })
        );
        assert_eq!(store.items(), before);
        assert!(store.state().error.is_some());
    }

    #[tokio::test]
    async fn get_reads_from_database() {
        let store = store();
        let saved = store.save_visualization(draft("a")).await.unwrap();
        assert_eq!(store.get_visualization(&saved.id).await.unwrap(), Some(saved));
        assert_eq!(store.get_visualization("404").await.unwrap(), None);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let store = store();
        let mut rx = store.subscribe();
        let _ = store.save_visualization(draft("a")).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().items.len(), 1);
    }

    #[tokio::test]
    async fn search_filters_cached_items() {
        let store = store();
        let _ = store.save_visualization(draft("Photosynthesis")).await.unwrap();
        let _ = store.save_visualization(draft("Entropy")).await.unwrap();

        let hits = store.search("PHOTO");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Photosynthesis");
        assert_eq!(store.search("").len(), 2);
    }

    #[tokio::test]
    async fn save_publishes_ready_and_state_update() {
        let bus = EventBus::new();
        let (seen, _sub) = record_events(&bus);
        let store = store().with_event_bus(bus);

        let saved = store.save_visualization(draft("a")).await.unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_matches!(&seen[0].data, EventData::StateUpdate(u) => {
            assert_eq!(u.path, vec!["visualizations", "save"]);
            assert_eq!(u.value["id"], saved.id.as_str());
        });
        assert_matches!(&seen[1].data, EventData::VisualizationReady(r) => {
            assert_eq!(r.visualization_id, saved.id);
            assert_eq!(r.format, "markdown");
        });
    }

    #[tokio::test]
    async fn failure_publishes_store_error() {
        let bus = EventBus::new();
        let (seen, _sub) = record_events(&bus);
        let store = VisualizationStore::new(None).with_event_bus(bus);

        let _ = store.delete_visualization("1").await.unwrap_err();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_matches!(&seen[0].data, EventData::Error(e) => {
            assert_eq!(e.code, STORE_ERROR_CODE);
            assert_eq!(e.context.as_ref().unwrap()["operation"], "delete");
        });
    }

    #[tokio::test]
    async fn list_queries_use_database() {
        let store = store();
        let mut a = draft("a");
        a.category = "Biology".into();
        a.folder = Some("school".into());
        let _ = store.save_visualization(a).await.unwrap();
        let _ = store.save_visualization(draft("b")).await.unwrap();

        let bio = store.list_by_category("Biology").await.unwrap();
        assert_eq!(bio.len(), 1);
        assert_eq!(bio[0].title, "a");
        assert_eq!(store.list_by_folder("school").await.unwrap().len(), 1);
        assert!(store.list_by_folder("home").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn import_json_rejects_bad_document() {
        let store = store();
        assert_matches!(store.import_json("{not json").await, Err(StoreError::Serde(_)));
        assert!(store.state().error.is_some());
    }

    #[tokio::test]
    async fn import_json_reloads_cache() {
        let store = store().with_import_strategy(ImportConflictStrategy::Skip);
        let _ = store.save_visualization(draft("a")).await.unwrap();

        let doc = r#"[
            {"id": "1", "content": "dup", "timestamp": 1, "title": "dup", "category": "x"},
            {"id": "7", "content": "c", "timestamp": 2, "title": "seven", "category": "x", "folder": "f"}
        ]"#;
        let report = store.import_json(doc).await.unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped, 1);

        let titles: Vec<_> = store.items().into_iter().map(|v| v.title).collect();
        assert_eq!(titles, vec!["a", "seven"]);
    }

    #[tokio::test]
    async fn export_writes_pretty_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let saved = store.save_visualization(draft("a")).await.unwrap();

        let path = store.export_visualizations(dir.path()).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("visualizations-") && name.ends_with("Z.json"), "got {name}");
        assert!(!name.contains(':'), "got {name}");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  {"), "expected indented output");
        let parsed: Vec<Visualization> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, vec![saved]);
    }

    #[test]
    fn export_file_name_format() {
        assert_eq!(
            export_file_name("2024-05-01T10:00:00.000Z"),
            "visualizations-2024-05-01T10-00-00.000Z.json"
        );
    }
}
