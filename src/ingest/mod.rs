// src/ingest/mod.rs
pub mod article;
pub mod fetcher;
pub mod types;

use crate::ingest::fetcher::SourceFetcher;
use crate::ingest::types::{FetchResult, NewsItem, SourceDescriptor};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("digest_items_total", "Headlines extracted from sources.");
        describe_counter!(
            "digest_source_errors_total",
            "Sources that failed or yielded no items."
        );
        describe_histogram!("digest_fetch_ms", "Source fetch+extract time in milliseconds.");
        describe_counter!(
            "digest_enrich_errors_total",
            "Article pages that could not be fetched for context."
        );
        describe_counter!("digest_batches_total", "Summarization batches sent.");
        describe_counter!(
            "digest_batch_failures_total",
            "Summarization batches that failed and got placeholders."
        );
        describe_counter!("digest_runs_total", "Digest pipeline runs.");
        describe_gauge!("digest_run_last_ts", "Unix ts when the digest pipeline last ran.");
    });
}

/// Normalize scraped text: decode entities, drop tags, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags (titles sometimes carry escaped markup)
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace (incl. nbsp)
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"[\s\u{00A0}]+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Cut `s` to at most `max_chars` characters (not bytes).
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.chars().take(max_chars).collect()
}

/// Fetch every source concurrently. Results come back in registry order,
/// one per source, whatever happened to each of them.
pub async fn fetch_all(fetcher: &SourceFetcher, sources: &[SourceDescriptor]) -> Vec<FetchResult> {
    ensure_metrics_described();

    let results =
        futures::future::join_all(sources.iter().map(|source| fetcher.fetch(source))).await;

    let ok = results.iter().filter(|r| r.has_items()).count();
    tracing::info!(
        sources = results.len(),
        ok,
        failed = results.len() - ok,
        "fetched all sources"
    );
    results
}

/// Flat item list in registry order, as fed to enrichment and summarization.
pub fn flatten(results: &[FetchResult]) -> Vec<NewsItem> {
    results
        .iter()
        .filter(|r| r.has_items())
        .flat_map(|r| r.items.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::FetchError;

    #[test]
    fn normalize_text_decodes_and_collapses() {
        let s = "  Paris&nbsp;Fashion   Week\n <b>recap</b> &amp; more ";
        assert_eq!(normalize_text(s), "Paris Fashion Week recap & more");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("мода мода", 4), "мода");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn flatten_keeps_registry_order_and_skips_failures() {
        let a = SourceDescriptor::new("A", "https://a.test/", "h3 a");
        let b = SourceDescriptor::new("B", "https://b.test/", "h3 a");
        let c = SourceDescriptor::new("C", "https://c.test/", "h3 a");
        let results = vec![
            FetchResult::ok(
                a,
                vec![
                    NewsItem::new("a1", "https://a.test/1", "A"),
                    NewsItem::new("a2", "https://a.test/2", "A"),
                ],
            ),
            FetchResult::failed(b, FetchError::NoItems),
            FetchResult::ok(c, vec![NewsItem::new("c1", "#", "C")]),
        ];
        let titles: Vec<_> = flatten(&results).into_iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["a1", "a2", "c1"]);
    }
}
