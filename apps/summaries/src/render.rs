//! Plain-text rendering of the sorted list and the detail view.

use std::fmt::{Display, Write as _};

use chrono::TimeZone;
use client_core::{
    presentation::{detail_text, display_name, format_created_at_in, preview, EMPTY_LIST},
    SortField, SortOrder,
};
use shared::domain::Summary;

const NAME_HEADER: &str = "Name";
const PREVIEW_HEADER: &str = "Summary Preview";
const CREATED_HEADER: &str = "Created At";
const ID_HEADER: &str = "Id";
const COLUMN_GAP: &str = "  ";

struct Row {
    name: String,
    preview: String,
    created: String,
    id: String,
}

/// Rows are expected in display order already.
pub fn render_list<Tz>(rows: &[Summary], order: SortOrder, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if rows.is_empty() {
        return format!("{EMPTY_LIST}\n");
    }

    let rows: Vec<Row> = rows
        .iter()
        .map(|summary| Row {
            name: display_name(summary).to_string(),
            preview: single_line(&preview(summary)),
            created: format_created_at_in(&summary.created_at, tz),
            id: summary.id.to_string(),
        })
        .collect();

    let name_header = header(NAME_HEADER, SortField::OriginalFileName, order);
    let created_header = header(CREATED_HEADER, SortField::CreatedAt, order);

    let name_width = column_width(&name_header, rows.iter().map(|r| r.name.as_str()));
    let preview_width = column_width(PREVIEW_HEADER, rows.iter().map(|r| r.preview.as_str()));
    let created_width = column_width(&created_header, rows.iter().map(|r| r.created.as_str()));

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{name_header:<name_width$}{COLUMN_GAP}{PREVIEW_HEADER:<preview_width$}{COLUMN_GAP}{created_header:<created_width$}{COLUMN_GAP}{ID_HEADER}"
    );
    for row in &rows {
        let _ = writeln!(
            out,
            "{:<name_width$}{COLUMN_GAP}{:<preview_width$}{COLUMN_GAP}{:<created_width$}{COLUMN_GAP}{}",
            row.name, row.preview, row.created, row.id
        );
    }
    out
}

pub fn render_detail<Tz>(summary: &Summary, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{}\nCreated: {}\n\n{}\n",
        display_name(summary),
        format_created_at_in(&summary.created_at, tz),
        detail_text(summary)
    )
}

fn header(label: &str, field: SortField, order: SortOrder) -> String {
    if order.field == field {
        format!("{label} {}", order.direction.arrow())
    } else {
        label.to_string()
    }
}

fn column_width<'a>(header: &str, cells: impl Iterator<Item = &'a str>) -> usize {
    cells
        .map(|cell| cell.chars().count())
        .chain(std::iter::once(header.chars().count()))
        .max()
        .unwrap_or_default()
}

/// Previews may hold newlines from pasted text; keep one row per summary.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
