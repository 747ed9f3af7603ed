//! Display derivations over summary records. Nothing here mutates a record.

use chrono::{DateTime, Local, TimeZone, Utc};
use shared::domain::Summary;

pub const PREVIEW_MAX_CHARS: usize = 100;
pub const PREVIEW_ELLIPSIS: &str = "...";
pub const UNTITLED_SUMMARY: &str = "Untitled summary";
pub const EMPTY_PREVIEW: &str = "No Summary";
pub const EMPTY_DETAIL: &str = "No summary available.";
pub const EMPTY_LIST: &str = "No summaries yet. Create your first one!";
pub const DELETE_CONFIRMATION_PROMPT: &str = "Are you sure you want to delete this summary?";

const CREATED_AT_FORMAT: &str = "%b %-d, %Y, %I:%M %p";

/// List-row preview: first 100 characters plus `...` when longer.
pub fn preview(summary: &Summary) -> String {
    match summary.text() {
        Some(text) => truncate_preview(text),
        None => EMPTY_PREVIEW.to_string(),
    }
}

pub fn truncate_preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_MAX_CHARS) {
        Some((cut, _)) => format!("{}{PREVIEW_ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn display_name(summary: &Summary) -> &str {
    summary.file_name().unwrap_or(UNTITLED_SUMMARY)
}

/// Full text for the detail view.
pub fn detail_text(summary: &Summary) -> &str {
    summary.text().unwrap_or(EMPTY_DETAIL)
}

/// e.g. `Jan 12, 2024, 09:30 AM` in the local time zone.
pub fn format_created_at(created_at: &DateTime<Utc>) -> String {
    format_created_at_in(created_at, &Local)
}

pub fn format_created_at_in<Tz>(created_at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    created_at
        .with_timezone(tz)
        .format(CREATED_AT_FORMAT)
        .to_string()
}

#[cfg(test)]
#[path = "tests/presentation_tests.rs"]
mod tests;
