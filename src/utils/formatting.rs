//! Message formatting utilities
//!
//! Functions for rendering message timestamps, keys, and payloads in
//! human-readable form: UTC calendar rendering of broker timestamps,
//! a binary-content heuristic, and JSON pretty-printing for payloads
//! that parse as JSON.

use chrono::{TimeZone, Utc};

/// Renders a millisecond broker timestamp as a UTC calendar time.
///
/// `None` (timestamp unavailable) renders as "-". A millisecond value
/// outside chrono's representable range falls back to the raw number.
///
/// # Arguments
/// - `timestamp_ms` - Milliseconds since the Unix epoch, if available
///
/// # Returns
/// A string like "2023-11-14 22:13:20"
pub fn format_timestamp(timestamp_ms: Option<i64>) -> String {
    let Some(ms) = timestamp_ms else {
        return "-".to_string();
    };

    match Utc.timestamp_millis_opt(ms).single() {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ms.to_string(),
    }
}

/// Detects whether data appears to be binary rather than text.
///
/// Heuristic: if more than 30% of the bytes are neither printable
/// ASCII nor common whitespace, the data is considered binary.
pub fn is_binary(data: &[u8]) -> bool {
    if data.is_empty() {
        return false;
    }
    let non_printable = data
        .iter()
        .filter(|&&byte| !byte.is_ascii_graphic() && !byte.is_ascii_whitespace())
        .count();
    (non_printable as f32 / data.len() as f32) > 0.3
}

/// Renders a message key for display.
///
/// Binary keys show as a byte count; text keys pass through.
pub fn render_key(key: Option<&[u8]>) -> Option<String> {
    let key = key?;
    if is_binary(key) {
        Some(format!("<{} bytes>", key.len()))
    } else {
        Some(String::from_utf8_lossy(key).into_owned())
    }
}

/// Renders a message payload for display.
///
/// JSON payloads are pretty-printed, other text passes through as
/// lossy UTF-8, and binary payloads show as a byte-count placeholder.
pub fn render_payload(payload: Option<&[u8]>) -> String {
    let Some(payload) = payload else {
        return "<empty>".to_string();
    };
    if is_binary(payload) {
        return format!("<{} bytes binary>", payload.len());
    }

    let text = String::from_utf8_lossy(payload);
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.into_owned()),
        Err(_) => text.into_owned(),
    }
}

/// Truncates a string for single-line display, collapsing newlines.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let truncated: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}
