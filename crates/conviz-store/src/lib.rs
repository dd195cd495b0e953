//! # conviz-store
//!
//! Persistence for concept visualizations.
//!
//! - **Durable store**: [`VisualizationsDb`], an `SQLite` collection keyed by
//!   numeric-string id with category/folder indexes, CRUD, and bulk import
//! - **Reactive store**: [`VisualizationStore`], a cached copy of the
//!   collection with change notification, export/import, and search
//!
//! Blocking database work runs on `tokio::task::spawn_blocking` when driven
//! from the reactive store.

#![deny(unsafe_code)]

pub mod db;
pub mod errors;
pub mod ids;
pub mod reactive;
pub mod sqlite;
pub mod types;

pub use db::{VisualizationsDb, open_database};
pub use errors::{Result, StoreError};
pub use reactive::{CONTENT_FORMAT, STORE_ERROR_CODE, VisualizationStore};
pub use sqlite::connection::ConnectionConfig;
pub use types::{ImportReport, Visualization, VisualizationDraft, VisualizationStoreState};
