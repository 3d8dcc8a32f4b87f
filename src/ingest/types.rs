// src/ingest/types.rs
use serde::{Deserialize, Serialize};

/// Placeholder url for items whose element carried no usable link.
pub const NO_LINK: &str = "#";

pub const DEFAULT_ITEM_CAP: usize = 10;

fn default_item_cap() -> usize {
    DEFAULT_ITEM_CAP
}

/// One site we scrape headlines from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub name: String,     // e.g. "WWD", "Business of Fashion"
    pub endpoint: String, // page that lists the headlines
    pub selector: String, // CSS selector, e.g. "h2 a, h3 a"
    #[serde(default = "default_item_cap")]
    pub item_cap: usize,
}

impl SourceDescriptor {
    pub fn new(name: &str, endpoint: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            selector: selector.to_string(),
            item_cap: DEFAULT_ITEM_CAP,
        }
    }

    pub fn with_item_cap(mut self, cap: usize) -> Self {
        self.item_cap = cap.max(1);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    pub url: String, // absolute, or NO_LINK
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl NewsItem {
    pub fn new(title: impl Into<String>, url: impl Into<String>, source: &str) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source: source.to_string(),
            raw_text: None,
            summary: None,
        }
    }

    pub fn has_link(&self) -> bool {
        self.url != NO_LINK
    }
}

/// Why a source or an article produced nothing. Callers only care that it failed;
/// the message ends up in logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("no items found")]
    NoItems,
}

impl FetchError {
    pub(crate) fn unavailable(e: impl std::fmt::Display) -> Self {
        Self::Unavailable(e.to_string())
    }
}

/// Outcome of fetching one source. `items` is empty whenever `error` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub source: SourceDescriptor,
    pub items: Vec<NewsItem>,
    pub error: Option<FetchError>,
}

impl FetchResult {
    pub fn ok(source: SourceDescriptor, items: Vec<NewsItem>) -> Self {
        Self {
            source,
            items,
            error: None,
        }
    }

    pub fn failed(source: SourceDescriptor, error: FetchError) -> Self {
        Self {
            source,
            items: Vec::new(),
            error: Some(error),
        }
    }

    /// True when this source should get a section in the report.
    pub fn has_items(&self) -> bool {
        self.error.is_none() && !self.items.is_empty()
    }
}
