use super::*;
use chrono::Utc;
use client_core::SortDirection;
use shared::domain::SummaryId;

fn summary(id: &str, name: Option<&str>, text: Option<&str>) -> Summary {
    Summary {
        id: SummaryId::from(id),
        original_file_name: name.map(str::to_string),
        summary_text: text.map(str::to_string),
        created_at: Utc.with_ymd_and_hms(2024, 1, 12, 9, 30, 0).unwrap(),
    }
}

#[test]
fn empty_list_renders_call_to_action() {
    let out = render_list(&[], SortOrder::default(), &Utc);
    assert_eq!(out, "No summaries yet. Create your first one!\n");
}

#[test]
fn list_marks_active_sort_column() {
    let rows = vec![summary("abc", Some("report.pdf"), Some("short"))];

    let out = render_list(
        &rows,
        SortOrder::new(SortField::CreatedAt, SortDirection::Desc),
        &Utc,
    );
    let header = out.lines().next().expect("header");
    assert!(header.starts_with("Name "));
    assert!(header.contains("Created At ↓"));

    let out = render_list(
        &rows,
        SortOrder::new(SortField::OriginalFileName, SortDirection::Asc),
        &Utc,
    );
    assert!(out.lines().next().expect("header").starts_with("Name ↑"));
}

#[test]
fn list_rows_use_placeholders_and_formatted_dates() {
    let rows = vec![
        summary("abc", Some("report.pdf"), Some("short")),
        summary("def", None, None),
    ];

    let out = render_list(&rows, SortOrder::default(), &Utc);
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("report.pdf"));
    assert!(lines[1].contains("short"));
    assert!(lines[1].contains("Jan 12, 2024, 09:30 AM"));
    assert!(lines[1].ends_with("abc"));
    assert!(lines[2].starts_with("Untitled summary"));
    assert!(lines[2].contains("No Summary"));
}

#[test]
fn list_preview_is_truncated_and_kept_on_one_line() {
    let long = format!("line one\n{}", "x".repeat(200));
    let rows = vec![summary("abc", Some("a.txt"), Some(&long))];

    let out = render_list(&rows, SortOrder::default(), &Utc);

    assert_eq!(out.lines().count(), 2);
    assert!(out.contains("..."));
    assert!(!out.contains(&"x".repeat(100)));
}

#[test]
fn detail_shows_name_date_and_full_text() {
    let text = "y".repeat(150);
    let out = render_detail(&summary("abc", Some("notes.pdf"), Some(&text)), &Utc);

    assert_eq!(
        out,
        format!("notes.pdf\nCreated: Jan 12, 2024, 09:30 AM\n\n{text}\n")
    );
}

#[test]
fn detail_of_empty_summary_uses_placeholder() {
    let out = render_detail(&summary("abc", None, None), &Utc);
    assert!(out.starts_with("Untitled summary\n"));
    assert!(out.ends_with("No summary available.\n"));
}
