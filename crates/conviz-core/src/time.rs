//! Wall-clock helpers.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current wall-clock time as milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current UTC time as an ISO-8601 string with millisecond precision,
/// e.g. `2026-10-19T08:42:00.123Z`.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format epoch milliseconds as `YYYY-MM-DD HH:MM` UTC, or `None` if out of range.
pub fn format_ms(ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|t| t.format("%Y-%m-%d %H:%M").to_string())
}
