// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod chat;
pub mod config;
pub mod ingest;
pub mod llm;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod sources;
pub mod summarize;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::DigestConfig;
pub use crate::ingest::types::{FetchError, FetchResult, NewsItem, SourceDescriptor};
pub use crate::pipeline::{Digest, DigestPipeline, Enrichment, Summarization};
pub use crate::report::{Report, NO_UPDATES};

use std::sync::Arc;

use crate::chat::{ChatSessions, FashionAgent};

/// Wire config → LLM client → pipeline → agent → router state.
pub fn build_app_state(cfg: &DigestConfig) -> anyhow::Result<AppState> {
    let client = llm::build_chat_client(cfg)?;
    let pipeline = DigestPipeline::from_config(cfg, client.clone())?;
    let agent = FashionAgent::new(
        client,
        Arc::new(ChatSessions::default()),
        Arc::new(pipeline),
    );
    Ok(AppState::new(agent))
}
