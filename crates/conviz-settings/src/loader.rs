//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ConvizSettings::default()`]
//! 2. If `~/.conviz/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `CONVIZ_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{ConvizSettings, ImportConflictStrategy, LogLevel, conviz_home};

/// Resolve the path to the settings file (`~/.conviz/settings.json`).
pub fn settings_path() -> PathBuf {
    conviz_home().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ConvizSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<ConvizSettings> {
    let mut settings = load_file_layers(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults merged with the settings file, without env overrides.
fn load_file_layers(path: &Path) -> Result<ConvizSettings> {
    let defaults = serde_json::to_value(ConvizSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning (file/default value is kept).
pub fn apply_env_overrides(settings: &mut ConvizSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary variable source.
///
/// `lookup` returns the raw value of a variable, or `None` when unset.
pub fn apply_overrides<F>(settings: &mut ConvizSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read_string = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── Database ────────────────────────────────────────────────────
    if let Some(v) = read_string("CONVIZ_DB_PATH") {
        settings.database.path = v;
    }
    if let Some(v) = read_parsed(&lookup, "CONVIZ_DB_POOL_SIZE", |v| parse_u32_range(v, 1, 64)) {
        settings.database.pool_size = v;
    }

    // ── Endpoint ────────────────────────────────────────────────────
    if let Some(v) = read_string("CONVIZ_ENDPOINT_URL") {
        settings.endpoint.url = v;
    }
    if let Some(v) = read_string("CONVIZ_MODEL") {
        settings.endpoint.model = Some(v);
    }
    if let Some(v) = read_string("CONVIZ_PROVIDER") {
        settings.endpoint.provider = Some(v);
    }
    if let Some(v) = read_parsed(&lookup, "CONVIZ_REQUEST_TIMEOUT_MS", |v| {
        parse_u64_range(v, 1000, 3_600_000)
    }) {
        settings.endpoint.request_timeout_ms = v;
    }

    // ── Import / export ─────────────────────────────────────────────
    if let Some(v) = read_parsed(&lookup, "CONVIZ_IMPORT_CONFLICT", |v| {
        v.parse::<ImportConflictStrategy>().ok()
    }) {
        settings.import.conflict_strategy = v;
    }
    if let Some(v) = read_string("CONVIZ_EXPORT_DIR") {
        settings.export.directory = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read_parsed(&lookup, "CONVIZ_LOG_LEVEL", parse_log_level) {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a log level name (case-insensitive).
pub fn parse_log_level(val: &str) -> Option<LogLevel> {
    serde_json::from_value(Value::String(val.to_lowercase())).ok()
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_parsed<T, L, P>(lookup: &L, name: &str, parse: P) -> Option<T>
where
    L: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    let val = lookup(name)?;
    let result = parse(&val);
    if result.is_none() {
        warn!(key = name, value = %val, "invalid env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
