//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`
//! so a partial settings file only needs the keys it overrides.

mod database;
mod endpoint;
mod logging;
mod transfer;

pub use database::*;
pub use endpoint::*;
pub use logging::*;
pub use transfer::*;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings type for conviz.
///
/// Loaded from `~/.conviz/settings.json` with defaults applied for missing
/// fields. Environment variables can override specific values.
///
/// ```json
/// {
///   "database": { "path": "/data/viz.db" },
///   "endpoint": { "url": "http://localhost:5173/api/chat", "model": "claude-3-5-sonnet-latest" },
///   "import": { "conflictStrategy": "skip" }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConvizSettings {
    /// Durable store location and pool tuning.
    pub database: DatabaseSettings,
    /// Concept-processing endpoint.
    pub endpoint: EndpointSettings,
    /// Import behaviour.
    pub import: ImportSettings,
    /// Export behaviour.
    pub export: ExportSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

/// Base directory for conviz state (`~/.conviz`).
pub fn conviz_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".conviz")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_serialize_camel_case() {
        let value = serde_json::to_value(ConvizSettings::default()).unwrap();
        assert!(value["database"].get("poolSize").is_some());
        assert!(value["database"].get("busyTimeoutMs").is_some());
        assert!(value["endpoint"].get("requestTimeoutMs").is_some());
        assert_eq!(value["import"]["conflictStrategy"], "fail");
        assert_eq!(value["logging"]["level"], "warn");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: ConvizSettings =
            serde_json::from_str(r#"{"endpoint": {"model": "m1"}}"#).unwrap();
        assert_eq!(settings.endpoint.model.as_deref(), Some("m1"));
        assert_eq!(settings.endpoint.url, EndpointSettings::default().url);
        assert_eq!(settings.database.pool_size, DatabaseSettings::default().pool_size);
    }

    #[test]
    fn conviz_home_ends_with_dot_dir() {
        assert!(conviz_home().ends_with(".conviz"));
    }
}
