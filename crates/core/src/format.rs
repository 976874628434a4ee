use std::time::Duration;

use crate::{
    pipeline::{BuildReport, ItemOutcome},
    view::{MediaLink, PageView, RenderedRow, TagCount},
};

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

pub fn format_tags(tags: &[String]) -> String {
    tags.join(", ")
}

/// "Showing N videos total | Page p/P"
pub fn format_page_header(view: &PageView) -> String {
    format!(
        "Showing {} videos total | Page {}/{}",
        view.total, view.pagination.page, view.pagination.total_pages
    )
}

pub fn format_row_readable(row: &RenderedRow) -> String {
    let mut output = String::new();
    let summary = row.entry.summary.trim();
    if summary.is_empty() {
        output.push_str("(no summary)\n");
    } else {
        output.push_str(&format!("{}\n", summary));
    }
    if !row.entry.tags.is_empty() {
        output.push_str(&format!("Tags: {}\n", format_tags(&row.entry.tags)));
    }
    match &row.media {
        MediaLink::Video { url, .. } => output.push_str(&format!("Video: {}\n", url)),
        MediaLink::File { name } => output.push_str(&format!("File: {}\n", name)),
        MediaLink::Unavailable { warning, .. } => output.push_str(&format!("! {}\n", warning)),
    }
    output
}

pub fn format_top_tags(top_tags: &[TagCount]) -> String {
    top_tags
        .iter()
        .map(|t| format!("{} ({})", t.tag, t.count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Plain-text rendering of a whole page.
pub fn format_page_readable(view: &PageView) -> String {
    let mut output = String::new();
    output.push_str(&format_page_header(view));
    output.push_str("\n\n");

    if view.rows.is_empty() {
        output.push_str("No videos match the current filters.\n\n");
    }
    for row in &view.rows {
        output.push_str(&format_row_readable(row));
        output.push('\n');
    }

    if !view.top_tags.is_empty() {
        output.push_str(&format!("Top tags: {}\n", format_top_tags(&view.top_tags)));
    }
    output
}

pub fn format_outcome(outcome: &ItemOutcome) -> String {
    match outcome {
        ItemOutcome::Cataloged {
            object,
            char_count,
            tag_count,
        } => format!("{} ({} chars, {} tags)", object, char_count, tag_count),
        ItemOutcome::Skipped {
            object,
            stage,
            reason,
        } => format!("Skipping {} due to {} error: {}", object, stage, reason),
    }
}

pub fn format_build_summary(report: &BuildReport) -> String {
    let skipped = report.skipped().count();
    let mut line = format!(
        "Wrote {} items to {}/{}",
        report.entries.len(),
        report.container,
        report.output_object
    );
    if skipped > 0 {
        line.push_str(&format!(" ({} skipped)", skipped));
    }
    line
}
