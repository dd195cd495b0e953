//! # conviz-settings
//!
//! Layered configuration for conviz.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** - [`ConvizSettings::default()`]
//! 2. **User file** - `~/.conviz/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** - `CONVIZ_*` overrides (highest priority)
//!
//! Settings are loaded once by the binary and passed down explicitly.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = ConvizSettings::default();
        assert!(settings.database.path.is_empty());
        assert_eq!(settings.database.pool_size, 4);
        assert_eq!(settings.database.busy_timeout_ms, 5000);
        assert_eq!(settings.endpoint.url, "http://localhost:5173/api/chat");
        assert!(settings.endpoint.model.is_none());
        assert!(settings.endpoint.api_keys.is_empty());
        assert_eq!(settings.import.conflict_strategy, ImportConflictStrategy::Fail);
        assert_eq!(settings.export.directory, ".");
        assert_eq!(settings.logging.level, LogLevel::Warn);
    }

    #[test]
    fn settings_path_is_under_conviz_home() {
        assert!(settings_path().ends_with(".conviz/settings.json"));
    }
}
