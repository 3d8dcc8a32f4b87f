//! Fashion digest service: binary entrypoint.
//! Boots the Axum HTTP server with the chat/trends routes and `/metrics`.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use fashion_digest::metrics::Metrics;
use fashion_digest::telemetry::init_tracing;
use fashion_digest::{build_app_state, create_router, DigestConfig};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = DigestConfig::load_default().context("loading digest config")?;
    let metrics = Metrics::init()?;
    let state = build_app_state(&cfg)?;

    tracing::info!(model = %cfg.model, "fashion digest service starting");
    let router = create_router(state).merge(metrics.router());

    Ok(router.into())
}
