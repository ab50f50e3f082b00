use std::fmt::Write as _;

use crate::journal::Entry;

const EMPTY_STATE_HTML: &str =
    r#"<div class="empty-state"><p>No entries yet. Start writing your first journal entry!</p></div>"#;
const EMPTY_STATE_TEXT: &str = "No entries yet. Start writing your first journal entry!";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalView {
    pub count_label: String,
    pub entries_html: String,
    pub is_empty: bool,
}

pub fn render_entries(entries: &[Entry]) -> JournalView {
    let entries_html = if entries.is_empty() {
        EMPTY_STATE_HTML.to_string()
    } else {
        entries
            .iter()
            .map(render_card)
            .collect::<Vec<_>>()
            .join("\n")
    };
    JournalView {
        count_label: count_label(entries.len()),
        entries_html,
        is_empty: entries.is_empty(),
    }
}

pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 entry".to_string()
    } else {
        format!("{count} entries")
    }
}

pub fn render_card(entry: &Entry) -> String {
    format!(
        concat!(
            r#"<article class="entry" data-id="{id}">"#,
            r#"<header class="entry-header"><h3 class="entry-title">{title}</h3>"#,
            r#"<span class="entry-date">{date}</span></header>"#,
            r#"<div class="entry-content">{content}</div>"#,
            r#"<button class="delete-btn" data-id="{id}">Delete</button>"#,
            "</article>"
        ),
        id = entry.id,
        title = escape_html(&entry.title),
        date = escape_html(&entry.date),
        content = line_breaks(&escape_html(&entry.content)),
    )
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn line_breaks(escaped: &str) -> String {
    escaped.replace("\r\n", "\n").replace('\n', "<br>")
}

/// Wraps a view in a standalone HTML document.
pub fn render_page(view: &JournalView) -> String {
    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    page.push_str("<meta charset=\"utf-8\">\n<title>My Journal</title>\n</head>\n<body>\n");
    page.push_str("<main class=\"journal\">\n<h1>My Journal</h1>\n");
    let _ = writeln!(
        page,
        "<p class=\"entry-count\">{}</p>",
        escape_html(&view.count_label)
    );
    let _ = writeln!(page, "<section class=\"entries\">\n{}\n</section>", view.entries_html);
    page.push_str("</main>\n</body>\n</html>\n");
    page
}

/// Plain-text listing for the terminal.
pub fn format_listing(entries: &[Entry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", count_label(entries.len()));
    if entries.is_empty() {
        let _ = writeln!(out, "\n{EMPTY_STATE_TEXT}");
        return out;
    }
    for entry in entries {
        out.push('\n');
        let _ = writeln!(out, "#{}  {}", entry.id, entry.title);
        let _ = writeln!(out, "    {}", entry.date);
        for line in entry.content.lines() {
            let _ = writeln!(out, "    {line}");
        }
    }
    out
}
