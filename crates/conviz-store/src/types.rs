//! Visualization records and import results.

use serde::{Deserialize, Serialize};

/// A persisted concept visualization.
///
/// Identity is `id`, a numeric string assigned on save. Import files and
/// export documents use this shape (camelCase, optional fields omitted).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visualization {
    /// Unique key.
    pub id: String,
    /// Markdown breakdown returned by the endpoint.
    pub content: String,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
    /// Display title.
    pub title: String,
    /// Dashboard category.
    pub category: String,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Dashboard folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

impl Visualization {
    /// Stamp a draft with an id and creation time.
    pub fn from_draft(draft: VisualizationDraft, id: String, timestamp: i64) -> Self {
        Self {
            id,
            content: draft.content,
            timestamp,
            title: draft.title,
            category: draft.category,
            tags: draft.tags,
            folder: draft.folder,
        }
    }

    /// Case-insensitive match of `term` against title or content.
    ///
    /// An empty term matches everything.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term) || self.content.to_lowercase().contains(&term)
    }
}

/// Input to a save: a visualization without `id` and `timestamp`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationDraft {
    /// Markdown content.
    pub content: String,
    /// Display title.
    pub title: String,
    /// Dashboard category.
    pub category: String,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Dashboard folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

/// Outcome counts of a bulk import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Records inserted under their own id.
    pub imported: usize,
    /// Records dropped because their id existed (`skip`).
    pub skipped: usize,
    /// Records inserted under a new id (`reassign`).
    pub reassigned: usize,
}

impl ImportReport {
    /// Records that ended up in the store.
    pub fn stored(&self) -> usize {
        self.imported + self.reassigned
    }
}

/// Cached state of the reactive store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisualizationStoreState {
    /// Visualizations in store order.
    pub items: Vec<Visualization>,
    /// A load is in flight.
    pub loading: bool,
    /// Message of the last failed operation.
    pub error: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
