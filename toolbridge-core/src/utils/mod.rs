//! Utility functions and helpers

use chrono::{DateTime, Local, Utc};

/// First `max_chars` characters of `s`, never splitting a character
pub fn preview(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Generate an 8-character session identifier from a v4 UUID
pub fn short_id() -> String {
    uuid::Uuid::new_v4().to_string()[..8].to_string()
}

/// Render a timestamp as local `YYYY-MM-DD HH:MM:SS`
pub fn format_local(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
