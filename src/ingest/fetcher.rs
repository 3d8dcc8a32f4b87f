// src/ingest/fetcher.rs
//! Headline scraping: one GET per source, CSS selector over the page, items out.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use metrics::{counter, histogram};
use scraper::{Html, Selector};
use url::Url;

use crate::ingest::normalize_text;
use crate::ingest::types::{FetchError, FetchResult, NewsItem, SourceDescriptor, NO_LINK};

/// Build the shared HTTP client used for sites and article pages.
pub fn http_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(timeout.min(Duration::from_secs(4)).max(Duration::from_millis(500)))
        .timeout(timeout)
        .build()
        .context("building scraper http client")
}

/// GET `url` and return the body; network errors, timeouts and non-2xx all map
/// to `FetchError::Unavailable`.
pub(crate) async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(FetchError::unavailable)?;
    let resp = resp.error_for_status().map_err(FetchError::unavailable)?;
    resp.text().await.map_err(FetchError::unavailable)
}

#[derive(Clone)]
pub struct SourceFetcher {
    client: reqwest::Client,
}

impl SourceFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(user_agent, timeout)?,
        })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Never fails: whatever goes wrong ends up in `FetchResult::error`.
    pub async fn fetch(&self, source: &SourceDescriptor) -> FetchResult {
        let t0 = Instant::now();
        let outcome = self.try_fetch(source).await;
        histogram!("digest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        match outcome {
            Ok(items) => {
                tracing::info!(source = %source.name, items = items.len(), "source fetched");
                counter!("digest_items_total").increment(items.len() as u64);
                FetchResult::ok(source.clone(), items)
            }
            Err(e) => {
                tracing::warn!(source = %source.name, error = %e, "source skipped");
                counter!("digest_source_errors_total").increment(1);
                FetchResult::failed(source.clone(), e)
            }
        }
    }

    async fn try_fetch(&self, source: &SourceDescriptor) -> Result<Vec<NewsItem>, FetchError> {
        let base = Url::parse(&source.endpoint)
            .map_err(|e| FetchError::Unavailable(format!("bad endpoint {}: {e}", source.endpoint)))?;
        let body = get_text(&self.client, base.as_str()).await?;
        tracing::debug!(source = %source.name, bytes = body.len(), "page downloaded");

        let items = extract_items(&body, &base, source)?;
        if items.is_empty() {
            return Err(FetchError::NoItems);
        }
        Ok(items)
    }
}

/// Apply the source's selector to `html`. Elements without text are skipped,
/// the rest are capped at `item_cap`.
pub fn extract_items(
    html: &str,
    base: &Url,
    source: &SourceDescriptor,
) -> Result<Vec<NewsItem>, FetchError> {
    let selector = Selector::parse(&source.selector)
        .map_err(|e| FetchError::Unavailable(format!("bad selector {:?}: {e:?}", source.selector)))?;
    let document = Html::parse_document(html);

    let items = document
        .select(&selector)
        .filter_map(|el| {
            let title = normalize_text(&el.text().collect::<String>());
            if title.is_empty() {
                return None;
            }
            let url = el
                .value()
                .attr("href")
                .and_then(|href| resolve_link(base, href))
                .unwrap_or_else(|| NO_LINK.to_string());
            Some(NewsItem::new(title, url, &source.name))
        })
        .take(source.item_cap.max(1))
        .collect();

    Ok(items)
}

/// Resolve `href` against the page it was found on. Anything that doesn't end up
/// as an http(s) url is treated as "no link".
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}
