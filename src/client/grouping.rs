//! Date Grouping Projector
//!
//! Pure fold over the conversation: interleaves a date separator wherever the
//! local calendar day changes between consecutive messages. Recomputed from scratch on every
//! store change; `createdAt` never changes after creation so there is no
//! incremental state to maintain.

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};

use crate::shared::message::Message;

/// One row of the projected view
#[derive(Debug, Clone, PartialEq)]
pub enum ViewGroup<'a> {
    DateSeparator { day: NaiveDate, label: String },
    Message(&'a Message),
}

/// Project in the machine's local timezone.
pub fn project(messages: &[Message]) -> Vec<ViewGroup<'_>> {
    let today = Local::now().date_naive();
    project_in(messages, &Local, today)
}

/// Project in `tz`, labelling relative to `today` (a date in `tz`).
///
/// The first dated message opens the first group without a separator.
/// Messages without `createdAt` stay in the current group.
pub fn project_in<'a, Tz: TimeZone>(
    messages: &'a [Message],
    tz: &Tz,
    today: NaiveDate,
) -> Vec<ViewGroup<'a>> {
    let mut groups = Vec::with_capacity(messages.len() + 4);
    let mut current_day: Option<NaiveDate> = None;

    for message in messages {
        if let Some(created_at) = message.created_at {
            let day = day_key(created_at, tz);
            if current_day.is_some_and(|previous| previous != day) {
                groups.push(ViewGroup::DateSeparator {
                    day,
                    label: day_label(day, today),
                });
            }
            current_day = Some(day);
        }
        groups.push(ViewGroup::Message(message));
    }
    groups
}

/// Local calendar day of a server timestamp
pub fn day_key<Tz: TimeZone>(timestamp: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    timestamp.with_timezone(tz).date_naive()
}

/// `Today`, `Yesterday`, `March 4` (this year) or `March 4, 2023`
pub fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    if day == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(day) {
        "Yesterday".to_string()
    } else if day.year() == today.year() {
        day.format("%B %-d").to_string()
    } else {
        day.format("%B %-d, %Y").to_string()
    }
}
