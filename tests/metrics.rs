// tests/metrics.rs
//
// One process-wide Prometheus recorder, so everything lives in a single test.

mod common;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use fashion_digest::ingest::fetcher::SourceFetcher;
use fashion_digest::metrics::Metrics;
use fashion_digest::{DigestPipeline, SourceDescriptor};

#[tokio::test]
async fn metrics_endpoint_contains_digest_series() {
    let metrics = Metrics::init().expect("install prometheus recorder");
    let base = common::spawn_sites().await;

    let pipeline = DigestPipeline::new(
        vec![
            SourceDescriptor::new("A", &format!("{base}/a"), "h3 a"),
            SourceDescriptor::new("B", &format!("{base}/b"), "h3 a"),
        ],
        SourceFetcher::with_client(common::test_client()),
        None,
        None,
    );
    let report = pipeline.run().await;
    assert!(!report.is_no_updates());

    let resp = metrics
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "digest_runs_total 1",
        "digest_items_total 3",
        "digest_source_errors_total 1",
        "digest_fetch_ms",
        "digest_run_last_ts",
    ] {
        assert!(text.contains(needle), "missing {needle:?} in:\n{text}");
    }
}
