//! Display helpers shared by the view snapshot and the composer.

use chrono::{DateTime, Local, TimeZone, Utc};

/// Shown in place of a tombstoned message's text
pub const DELETED_PLACEHOLDER: &str = "Message deleted by its author";

/// Quoted snippet for a reply preview.
///
/// First line only, cut to `max_len` characters; an ellipsis marks either
/// truncation or dropped lines.
pub fn reply_snippet(text: &str, max_len: usize) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut lines = text.split('\n');
    let first = lines.next().unwrap_or_default();
    let has_more_lines = lines.next().is_some();

    if first.chars().count() > max_len {
        let mut cut: String = first.chars().take(max_len).collect();
        cut.push_str("...");
        return cut;
    }
    if has_more_lines {
        format!("{}...", first)
    } else {
        first.to_string()
    }
}

/// `dd/mm/yy, HH:MM` in the local timezone
pub fn edited_at_label(edited_at: DateTime<Utc>) -> String {
    edited_at_label_in(edited_at, &Local)
}

pub fn edited_at_label_in<Tz: TimeZone>(edited_at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    edited_at.with_timezone(tz).format("%d/%m/%y, %H:%M").to_string()
}

/// Decode an emoji picker "unified" code such as `1f44d-1f3fb`.
pub fn emoji_from_unified(unified: &str) -> Option<String> {
    unified
        .split('-')
        .map(|code| u32::from_str_radix(code, 16).ok().and_then(char::from_u32))
        .collect()
}
