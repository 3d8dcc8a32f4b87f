// src/pipeline.rs
//! Digest pipeline: registry → fetch (parallel) → optional enrichment →
//! optional summarization → report.
//!
//! Enrichment and summarization are strategies picked from `DigestConfig`, so the
//! headline-only, batched and per-item variants are all the same pipeline.

use std::time::Duration;

use anyhow::Result;
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};

use crate::config::DigestConfig;
use crate::ingest::article::ArticleTextFetcher;
use crate::ingest::fetcher::{http_client, SourceFetcher};
use crate::ingest::types::{FetchResult, NewsItem, SourceDescriptor};
use crate::ingest::{ensure_metrics_described, fetch_all, flatten};
use crate::llm::DynChatClient;
use crate::report::Report;
use crate::sources::SourceRegistry;
use crate::summarize::{apply_summaries, SummarizationBatcher};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Enrichment {
    /// Summaries are written from the headline alone.
    #[default]
    None,
    /// Fetch each linked article and pass a plain-text excerpt along.
    ArticleText,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Summarization {
    /// Headline-only report.
    Off,
    #[default]
    Batched,
    /// One request per item.
    PerItem,
}

/// What one run gathered, before rendering.
#[derive(Debug, Clone)]
pub struct Digest {
    pub results: Vec<FetchResult>,
    /// Flattened items of the retained sources, with excerpts and summaries when
    /// those steps ran.
    pub items: Vec<NewsItem>,
    /// Positional over `items`; `None` in headline-only mode.
    pub summaries: Option<Vec<String>>,
}

impl Digest {
    /// Build from fetch results and optional summaries; `items` is re-derived.
    pub fn new(results: Vec<FetchResult>, summaries: Option<Vec<String>>) -> Self {
        let mut items = flatten(&results);
        if let Some(s) = &summaries {
            apply_summaries(&mut items, s);
        }
        Self {
            results,
            items,
            summaries,
        }
    }

    pub fn items(&self) -> &[NewsItem] {
        &self.items
    }

    pub fn report(&self) -> Report {
        Report::assemble(&self.results, self.summaries.as_deref())
    }
}

pub struct DigestPipeline {
    sources: Vec<SourceDescriptor>,
    fetcher: SourceFetcher,
    articles: Option<ArticleTextFetcher>,
    batcher: Option<SummarizationBatcher>,
}

impl DigestPipeline {
    pub fn new(
        sources: Vec<SourceDescriptor>,
        fetcher: SourceFetcher,
        articles: Option<ArticleTextFetcher>,
        batcher: Option<SummarizationBatcher>,
    ) -> Self {
        Self {
            sources,
            fetcher,
            articles,
            batcher,
        }
    }

    /// Wire the pipeline from config. The registry comes from `cfg.sources` or the
    /// built-in seed; `client` is only used when summarization is on.
    pub fn from_config(cfg: &DigestConfig, client: DynChatClient) -> Result<Self> {
        let http = http_client(&cfg.user_agent, Duration::from_secs(cfg.fetch_timeout_secs))?;
        let registry = SourceRegistry::from_config(cfg);

        let articles = match cfg.enrichment {
            Enrichment::None => None,
            Enrichment::ArticleText => {
                Some(ArticleTextFetcher::new(http.clone(), cfg.article_max_chars))
            }
        };
        let batcher = match cfg.summarization {
            Summarization::Off => None,
            Summarization::Batched | Summarization::PerItem => Some(SummarizationBatcher::new(
                client,
                cfg.effective_batch_size(),
                cfg.max_concurrent_batches,
            )),
        };

        tracing::info!(
            sources = registry.len(),
            enrichment = ?cfg.enrichment,
            summarization = ?cfg.summarization,
            "digest pipeline ready"
        );
        Ok(Self::new(
            registry.sources().to_vec(),
            SourceFetcher::with_client(http),
            articles,
            batcher,
        ))
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// Fetch, enrich and summarize. Never fails.
    pub async fn collect(&self) -> Digest {
        ensure_metrics_described();
        counter!("digest_runs_total").increment(1);
        gauge!("digest_run_last_ts").set(chrono::Utc::now().timestamp() as f64);

        let results = fetch_all(&self.fetcher, &self.sources).await;
        let items = flatten(&results);

        let Some(batcher) = &self.batcher else {
            return Digest {
                results,
                items,
                summaries: None,
            };
        };
        if items.is_empty() {
            return Digest {
                results,
                items,
                summaries: Some(Vec::new()),
            };
        }

        // excerpts only matter to the summarizer
        let mut items = match &self.articles {
            Some(articles) => articles.enrich_all(items).await,
            None => items,
        };
        let summaries = batcher.summarize(&items).await;
        apply_summaries(&mut items, &summaries);
        Digest {
            results,
            items,
            summaries: Some(summaries),
        }
    }

    pub async fn run(&self) -> Report {
        let report = self.collect().await.report();
        tracing::info!(lines = report.lines().len(), empty = report.is_no_updates(), "digest built");
        report
    }
}
