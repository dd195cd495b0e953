use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::conviz_home;

/// Durable store settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Path of the SQLite database file. Empty means `~/.conviz/visualizations.db`.
    pub path: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// `busy_timeout` pragma in milliseconds.
    pub busy_timeout_ms: u32,
}

impl DatabaseSettings {
    /// Database file location with the empty-path default resolved.
    pub fn resolved_path(&self) -> PathBuf {
        if self.path.is_empty() {
            conviz_home().join("visualizations.db")
        } else {
            PathBuf::from(&self.path)
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: String::new(),
            pool_size: 4,
            busy_timeout_ms: 5000,
        }
    }
}
