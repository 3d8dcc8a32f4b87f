// src/report.rs
//! Final text assembly: one section per source that produced items, in registry order.

use std::fmt;

use crate::ingest::types::{FetchResult, NewsItem};

/// The only text produced when no source made it into the report.
pub const NO_UPDATES: &str = "No fresh fashion news right now 😔";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    /// `summaries` is positional over the flattened items of the retained sources;
    /// `None` means headline-only.
    pub fn assemble(results: &[FetchResult], summaries: Option<&[String]>) -> Self {
        let mut lines = Vec::new();
        let mut next = 0usize;

        for result in results.iter().filter(|r| r.has_items()) {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("✨ **{}**", result.source.name));
            for item in &result.items {
                let summary = summaries.and_then(|s| s.get(next)).map(String::as_str);
                next += 1;
                lines.push(render_item(item, summary));
            }
        }

        if lines.is_empty() {
            lines.push(NO_UPDATES.to_string());
        }
        Self { lines }
    }

    pub fn no_updates() -> Self {
        Self {
            lines: vec![NO_UPDATES.to_string()],
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_no_updates(&self) -> bool {
        self.lines.len() == 1 && self.lines[0] == NO_UPDATES
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

fn render_item(item: &NewsItem, summary: Option<&str>) -> String {
    let link = format!("[{}]({})", escape_title(&item.title), escape_url(&item.url));
    match summary.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => format!("• {link} — {s}"),
        None => format!("• {link}"),
    }
}

/// Square brackets would close the link text early.
pub fn escape_title(title: &str) -> String {
    title.replace('[', "\\[").replace(']', "\\]")
}

/// `Url` leaves parentheses as-is; a `)` would end the link target early.
pub fn escape_url(url: &str) -> String {
    url.replace('(', "%28").replace(')', "%29")
}
