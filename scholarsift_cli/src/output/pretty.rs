//! Card-style terminal output for scholarship records.
//!
//! Titles are bold, metadata dimmed and links clickable. Long free-text
//! fields are wrapped to the terminal instead of truncated.

use owo_colors::OwoColorize;
use scholarsift_core::model::NOT_SPECIFIED;
use scholarsift_core::Record;

/// Terminal width for formatting (default fallback)
const DEFAULT_WIDTH: usize = 80;

/// Indent for card content (after number)
const CARD_INDENT: usize = 6;

/// Format records as numbered cards under an optional section header.
pub fn format_record_cards(records: &[Record], label: Option<&str>) -> String {
    let mut output = String::new();
    let width = terminal_width();

    if let Some(label) = label {
        output.push_str(&format_section_header(label, Some(records.len()), width));
        output.push_str("\n\n");
    }

    for (i, record) in records.iter().enumerate() {
        output.push_str(&format_card(record, i + 1, width));
        if i + 1 < records.len() {
            output.push('\n');
        }
    }

    output
}

fn format_card(record: &Record, index: usize, width: usize) -> String {
    let mut output = String::new();
    let content_width = width.saturating_sub(CARD_INDENT + 2).max(20);
    let indent = " ".repeat(CARD_INDENT);

    output.push_str(&format!(
        "{}{}\n",
        format!(" {:>3}. ", index).cyan().bold(),
        truncate_str(&record.title, content_width).bold()
    ));

    if !record.url.is_empty() {
        output.push_str(&format!(
            "{}{}\n",
            indent,
            format_hyperlink(&record.url, &record.url).blue()
        ));
    }

    let headline = [
        record.country.as_str(),
        record.degree_level.label(),
        record.funding.as_str(),
    ]
    .iter()
    .filter(|v| !v.is_empty() && **v != NOT_SPECIFIED)
    .copied()
    .collect::<Vec<_>>()
    .join(" · ");
    if !headline.is_empty() {
        output.push_str(&format!("{}{}\n", indent, headline.green()));
    }

    for (key, value) in [
        ("field", &record.field_of_study),
        ("duration", &record.duration),
        ("deadline", &record.deadline),
        ("source", &record.source),
    ] {
        if value.is_empty() || value == NOT_SPECIFIED {
            continue;
        }
        output.push_str(&format!("{}{}: {}\n", indent, key.dimmed(), value));
    }

    if record.eligibility != NOT_SPECIFIED && !record.eligibility.is_empty() {
        let options = textwrap::Options::new(content_width)
            .initial_indent(&indent)
            .subsequent_indent(&indent);
        for line in textwrap::wrap(&record.eligibility, options) {
            output.push_str(&format!("{}\n", line.dimmed()));
        }
    }

    output
}

fn format_section_header(label: &str, count: Option<usize>, width: usize) -> String {
    let count_str = match count {
        Some(n) => format!(" ({} results)", n),
        None => String::new(),
    };

    let header_text = format!("{}{}", label, count_str);
    let line_len = (width.saturating_sub(header_text.len() + 4)).min(60);
    let line = "─".repeat(line_len);

    format!(
        "{} {} {}",
        "──".cyan(),
        header_text.green().bold(),
        line.cyan()
    )
}

pub fn truncate_str(s: &str, max_len: usize) -> String {
    // Take first line only
    let first_line = s.lines().next().unwrap_or(s);

    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let truncated: String = first_line.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Format a URL as a clickable hyperlink using OSC 8 escape sequences.
fn format_hyperlink(url: &str, display_text: &str) -> String {
    format!("\x1b]8;;{}\x07{}\x1b]8;;\x07", url, display_text)
}
