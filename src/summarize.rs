//! # Summarization
//!
//! Splits the flat item list into contiguous batches, sends one chat request per
//! batch and maps the reply back onto the batch's items.
//!
//! Reply mapping, in order of preference:
//! 1. numbered lines (`1. `, `2) `, `- 3. `) go to the item with that number,
//! 2. otherwise non-empty lines are taken positionally,
//! 3. items still without a line get [`MISSING_SUMMARY`].
//!
//! A failed request never aborts the run: every item of that batch gets a
//! placeholder naming the failure and the next batch goes out as usual.

use futures::stream::{self, StreamExt};
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::ingest::types::NewsItem;
use crate::llm::{ChatMessage, DynChatClient};

pub const SUMMARY_INSTRUCTION: &str = "You are a fashion news editor. For every news item \
below write a 1-2 sentence summary in the language of the headline. Answer with exactly \
one numbered line per item, using the item's number: `1. summary`. No extra text.";

/// Placeholder for an item the model skipped.
pub const MISSING_SUMMARY: &str = "summary unavailable";

/// One contiguous slice of the item list and what the model made of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryBatch {
    pub items: Vec<NewsItem>,
    pub result: Result<Vec<String>, String>,
}

impl SummaryBatch {
    /// One summary per item; failures become visible placeholders.
    pub fn summaries(&self) -> Vec<String> {
        match &self.result {
            Ok(lines) => lines.clone(),
            Err(reason) => self
                .items
                .iter()
                .map(|_| batch_failure_placeholder(reason))
                .collect(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.result.is_err()
    }
}

pub fn batch_failure_placeholder(reason: &str) -> String {
    format!("⚠️ couldn't summarize this batch: {reason}")
}

/// System instruction plus one user message per item, numbered from 1 within the batch.
pub fn build_request(batch: &[NewsItem]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(batch.len() + 1);
    messages.push(ChatMessage::system(SUMMARY_INSTRUCTION));
    for (i, item) in batch.iter().enumerate() {
        let mut content = format!("{}. {} ({})", i + 1, item.title, item.url);
        if let Some(text) = item.raw_text.as_deref().filter(|t| !t.trim().is_empty()) {
            content.push('\n');
            content.push_str(text);
        }
        messages.push(ChatMessage::user(content));
    }
    messages
}

fn numbered_line_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:[-*•]\s*)?\(?(\d{1,3})[.)](?:\s+|$)(.*)$").unwrap())
}

fn strip_bullet(line: &str) -> &str {
    line.trim()
        .trim_start_matches(['-', '*', '•'])
        .trim_start()
}

/// Map a raw reply onto `expected` items. Always returns exactly `expected` entries.
pub fn map_response(reply: &str, expected: usize) -> Vec<String> {
    let mut out: Vec<Option<String>> = vec![None; expected];
    let lines: Vec<&str> = reply.lines().filter(|l| !l.trim().is_empty()).collect();

    let re = numbered_line_re();
    let mut numbered = false;
    for line in &lines {
        let Some(caps) = re.captures(line) else {
            continue;
        };
        numbered = true;
        let Ok(n) = caps[1].parse::<usize>() else {
            continue;
        };
        let text = caps[2].trim();
        if n == 0 || n > expected || text.is_empty() {
            continue;
        }
        // first line for a number wins
        if out[n - 1].is_none() {
            out[n - 1] = Some(text.to_string());
        }
    }

    if !numbered {
        for (slot, line) in out.iter_mut().zip(lines.iter()) {
            let text = strip_bullet(line);
            if !text.is_empty() {
                *slot = Some(text.to_string());
            }
        }
    }

    out.into_iter()
        .map(|s| s.unwrap_or_else(|| MISSING_SUMMARY.to_string()))
        .collect()
}

#[derive(Clone)]
pub struct SummarizationBatcher {
    client: DynChatClient,
    batch_size: usize,
    concurrency: usize,
}

impl SummarizationBatcher {
    pub fn new(client: DynChatClient, batch_size: usize, concurrency: usize) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
            concurrency: concurrency.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Run every batch; at most `concurrency` requests in flight, results in input order.
    pub async fn summarize_batches(&self, items: &[NewsItem]) -> Vec<SummaryBatch> {
        crate::ingest::ensure_metrics_described();
        let total = items.chunks(self.batch_size).len();

        let batches: Vec<_> = items
            .chunks(self.batch_size)
            .enumerate()
            .map(|(idx, chunk)| self.summarize_one(idx + 1, total, chunk))
            .collect();

        stream::iter(batches)
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// One summary per input item, same order.
    pub async fn summarize(&self, items: &[NewsItem]) -> Vec<String> {
        self.summarize_batches(items)
            .await
            .iter()
            .flat_map(SummaryBatch::summaries)
            .collect()
    }

    async fn summarize_one(&self, batch: usize, total: usize, chunk: &[NewsItem]) -> SummaryBatch {
        counter!("digest_batches_total").increment(1);
        let messages = build_request(chunk);
        tracing::debug!(
            batch,
            total,
            items = chunk.len(),
            provider = self.client.provider_name(),
            "sending summary batch"
        );

        let result = match self.client.complete(&messages).await {
            Ok(reply) => {
                let mapped = map_response(&reply, chunk.len());
                let missing = mapped.iter().filter(|s| *s == MISSING_SUMMARY).count();
                if missing > 0 {
                    tracing::warn!(batch, missing, "model skipped some items");
                }
                tracing::info!(batch, total, items = chunk.len(), "batch summarized");
                Ok(mapped)
            }
            Err(e) => {
                tracing::warn!(batch, total, error = %e, "summary batch failed");
                counter!("digest_batch_failures_total").increment(1);
                Err(e.to_string())
            }
        };

        SummaryBatch {
            items: chunk.to_vec(),
            result,
        }
    }
}

/// Copy summaries onto items positionally.
pub fn apply_summaries(items: &mut [NewsItem], summaries: &[String]) {
    for (item, summary) in items.iter_mut().zip(summaries) {
        item.summary = Some(summary.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockChatClient;
    use std::sync::Arc;

    fn items(n: usize) -> Vec<NewsItem> {
        (1..=n)
            .map(|i| NewsItem::new(format!("Story {i}"), format!("https://s.test/{i}"), "S"))
            .collect()
    }

    #[test]
    fn request_numbers_items_and_attaches_excerpt() {
        let mut batch = items(2);
        batch[1].raw_text = Some("Body text".into());
        let msgs = build_request(&batch);
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[0].role, "system");
        assert_eq!(msgs[1].content, "1. Story 1 (https://s.test/1)");
        assert_eq!(msgs[2].content, "2. Story 2 (https://s.test/2)\nBody text");
    }

    #[test]
    fn numbered_lines_map_by_number() {
        let reply = "Here you go:\n2) second\n1. first\n3. third\n7. extra";
        assert_eq!(map_response(reply, 3), vec!["first", "second", "third"]);
    }

    #[test]
    fn missing_numbers_get_placeholder() {
        let reply = "1. only the first";
        assert_eq!(
            map_response(reply, 3),
            vec!["only the first", MISSING_SUMMARY, MISSING_SUMMARY]
        );
    }

    #[test]
    fn unnumbered_reply_is_positional() {
        let reply = "- alpha\n\n• beta\ngamma\ndelta";
        assert_eq!(map_response(reply, 3), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn leading_decimal_is_not_a_number() {
        let reply = "1.5 million pairs sold in a week\nsecond story\nthird story";
        assert_eq!(
            map_response(reply, 3),
            vec!["1.5 million pairs sold in a week", "second story", "third story"]
        );
        assert_eq!(map_response("2.0 is the new drop", 1), vec!["2.0 is the new drop"]);
    }

    #[test]
    fn empty_reply_is_all_placeholders() {
        assert_eq!(map_response("", 2), vec![MISSING_SUMMARY, MISSING_SUMMARY]);
    }

    #[test]
    fn failed_batch_yields_placeholder_per_item() {
        let batch = SummaryBatch {
            items: items(2),
            result: Err("HTTP 502: bad gateway".into()),
        };
        let s = batch.summaries();
        assert_eq!(s.len(), 2);
        assert!(s.iter().all(|x| x.contains("HTTP 502")));
    }

    #[tokio::test]
    async fn batches_respect_size_and_order() {
        let batcher = SummarizationBatcher::new(Arc::new(MockChatClient::numbered()), 2, 3);
        let input = items(5);
        let batches = batcher.summarize_batches(&input).await;
        let sizes: Vec<_> = batches.iter().map(|b| b.items.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        let summaries = batcher.summarize(&input).await;
        assert_eq!(summaries.len(), 5);
        assert_eq!(summaries[2], "(mock) 1. Story 3 (https://s.test/3)");
        assert_eq!(summaries[4], "(mock) 1. Story 5 (https://s.test/5)");
    }

    #[test]
    fn apply_copies_in_order() {
        let mut list = items(2);
        apply_summaries(&mut list, &["a".to_string(), "b".to_string()]);
        assert_eq!(list[0].summary.as_deref(), Some("a"));
        assert_eq!(list[1].summary.as_deref(), Some("b"));
    }
}
