// src/ingest/article.rs
//! Optional enrichment: pull the linked article and keep a short plain-text excerpt
//! for the summarizer.

use futures::stream::{self, StreamExt};
use metrics::counter;
use scraper::{Html, Selector};

use crate::ingest::fetcher::get_text;
use crate::ingest::types::NewsItem;
use crate::ingest::{normalize_text, truncate_chars};

pub const DEFAULT_ARTICLE_MAX_CHARS: usize = 3000;

/// Pages fetched at the same time during enrichment.
const ENRICH_CONCURRENCY: usize = 4;

#[derive(Clone)]
pub struct ArticleTextFetcher {
    client: reqwest::Client,
    max_chars: usize,
}

impl ArticleTextFetcher {
    pub fn new(client: reqwest::Client, max_chars: usize) -> Self {
        Self {
            client,
            max_chars: max_chars.max(1),
        }
    }

    /// Always returns the item with `raw_text` set; empty on any failure.
    pub async fn enrich(&self, mut item: NewsItem) -> NewsItem {
        if !item.has_link() {
            item.raw_text = Some(String::new());
            return item;
        }

        let text = match get_text(&self.client, &item.url).await {
            Ok(body) => extract_article_text(&body, self.max_chars),
            Err(e) => {
                tracing::warn!(url = %item.url, error = %e, "article fetch failed");
                counter!("digest_enrich_errors_total").increment(1);
                String::new()
            }
        };
        item.raw_text = Some(text);
        item
    }

    /// Enrich a whole list, preserving its order.
    pub async fn enrich_all(&self, items: Vec<NewsItem>) -> Vec<NewsItem> {
        stream::iter(items)
            .map(|item| self.enrich(item))
            .buffered(ENRICH_CONCURRENCY)
            .collect()
            .await
    }
}

/// Text of every `<p>` in document order, one paragraph per line, cut to `max_chars`.
pub fn extract_article_text(html: &str, max_chars: usize) -> String {
    let Ok(paragraph) = Selector::parse("p") else {
        return String::new();
    };
    let document = Html::parse_document(html);

    let text = document
        .select(&paragraph)
        .map(|p| normalize_text(&p.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    truncate_chars(&text, max_chars)
}
