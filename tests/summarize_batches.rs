// tests/summarize_batches.rs
//
// Batch-level behaviour of the summarizer with a scripted chat client.
// Covered:
// - batch 2 of 3 failing → placeholders for that batch only, run completes
// - output order equals input order even when later batches answer first
// - no request carries more items than the batch size

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use fashion_digest::llm::{ChatClient, ChatMessage, LlmError};
use fashion_digest::summarize::SummarizationBatcher;
use fashion_digest::NewsItem;

/// Answers `N. summary of <title>` for every user message; fails whenever a
/// request contains `fail_title`; the first request is held back `first_delay`.
struct ScriptedClient {
    fail_title: Option<&'static str>,
    first_delay: Duration,
    seen: Mutex<Vec<usize>>,
}

impl ScriptedClient {
    fn new() -> Self {
        Self {
            fail_title: None,
            first_delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let users: Vec<&ChatMessage> = messages.iter().filter(|m| m.role == "user").collect();
        let first_request = {
            let mut seen = self.seen.lock().unwrap();
            seen.push(users.len());
            seen.len() == 1
        };
        if first_request {
            tokio::time::sleep(self.first_delay).await;
        }

        if let Some(bad) = self.fail_title {
            if users.iter().any(|m| m.content.contains(bad)) {
                return Err(LlmError::Status {
                    status: 503,
                    body: "overloaded".into(),
                });
            }
        }

        // Reply in reverse order to make sure numbers, not positions, are used.
        let lines: Vec<String> = users
            .iter()
            .enumerate()
            .rev()
            .map(|(i, m)| {
                let title = m
                    .content
                    .split_once(". ")
                    .and_then(|(_, rest)| rest.split(" (").next())
                    .unwrap_or_default();
                format!("{}. summary of {title}", i + 1)
            })
            .collect();
        Ok(lines.join("\n"))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

fn items(n: usize) -> Vec<NewsItem> {
    (1..=n)
        .map(|i| NewsItem::new(format!("item{i}"), format!("https://s.test/{i}"), "S"))
        .collect()
}

#[tokio::test]
async fn failing_middle_batch_gets_placeholders() {
    let client = Arc::new(ScriptedClient {
        fail_title: Some("item5"),
        ..ScriptedClient::new()
    });
    let batcher = SummarizationBatcher::new(client, 3, 1);

    let batches = batcher.summarize_batches(&items(8)).await;
    assert_eq!(batches.len(), 3);
    assert!(!batches[0].is_failed());
    assert!(batches[1].is_failed());
    assert!(!batches[2].is_failed());

    let summaries = batcher.summarize(&items(8)).await;
    assert_eq!(summaries.len(), 8);
    assert_eq!(summaries[0], "summary of item1");
    assert_eq!(summaries[2], "summary of item3");
    for s in &summaries[3..6] {
        assert!(s.starts_with("⚠️"), "placeholder expected, got {s:?}");
        assert!(s.contains("503"));
    }
    assert_eq!(summaries[6], "summary of item7");
    assert_eq!(summaries[7], "summary of item8");
}

#[tokio::test]
async fn order_is_kept_under_concurrency() {
    let client = Arc::new(ScriptedClient {
        first_delay: Duration::from_millis(200),
        ..ScriptedClient::new()
    });
    let batcher = SummarizationBatcher::new(client, 2, 4);

    let summaries = batcher.summarize(&items(7)).await;
    let expected: Vec<String> = (1..=7).map(|i| format!("summary of item{i}")).collect();
    assert_eq!(summaries, expected);
}

#[tokio::test]
async fn requests_never_exceed_batch_size() {
    let client = Arc::new(ScriptedClient::new());
    let batcher = SummarizationBatcher::new(client.clone(), 4, 2);

    let _ = batcher.summarize(&items(10)).await;
    let mut seen = client.seen.lock().unwrap().clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![2, 4, 4]);
}
