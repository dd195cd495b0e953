//! Numeric-string id helpers.
//!
//! Visualization ids are decimal strings. Keys that were imported from
//! elsewhere may not be, so id assignment reads each key by its leading
//! integer (`"12abc"` is 12) and ignores keys without one.

/// Parse the leading decimal integer of `s`.
///
/// Leading whitespace and one sign character are accepted. Parsing stops at
/// the first non-digit. Returns `None` when no digit follows, or when the
/// digits overflow `i64`.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Highest leading integer among `keys`, never below 0.
pub fn max_numeric_id<'a, I>(keys: I) -> i64
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter()
        .filter_map(parse_leading_int)
        .fold(0, i64::max)
}

/// The id following the highest numeric key, as a string (`"1"` when empty).
///
/// `None` when the highest key is `i64::MAX`.
pub fn next_numeric_id<'a, I>(keys: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    max_numeric_id(keys).checked_add(1).map(|n| n.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
