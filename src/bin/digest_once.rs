// src/bin/digest_once.rs
// Run the digest pipeline once and print the report to stdout.
//
// Usage:
//   cargo run --bin digest-once
//   AI_TEST_MODE=mock cargo run --bin digest-once      # no API key needed
//   DIGEST_CONFIG_PATH=config/digest.toml cargo run --bin digest-once

use anyhow::{Context, Result};

use fashion_digest::llm::build_chat_client;
use fashion_digest::telemetry::init_tracing;
use fashion_digest::{DigestConfig, DigestPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = DigestConfig::load_default().context("loading digest config")?;
    let client = build_chat_client(&cfg)?;
    let pipeline = DigestPipeline::from_config(&cfg, client)?;

    let report = pipeline.run().await;
    println!("{report}");
    Ok(())
}
