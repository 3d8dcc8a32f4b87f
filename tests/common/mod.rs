// tests/common/mod.rs
//
// Local stand-ins for the fashion sites: a tiny axum server on 127.0.0.1:0
// serving fixed HTML pages, plus a route that never answers in time.
#![allow(dead_code)]

use std::time::Duration;

use axum::{http::StatusCode, response::Html, routing::get, Router};
use tokio::net::TcpListener;

pub const SITE_A: &str = r#"<html><body>
  <h3><a href="/a/coats">Oversized coats are back</a></h3>
  <h3><a href="/a/knit">Chunky knit season</a></h3>
  <h3><a href="https://elsewhere.test/loafers">Loafers everywhere</a></h3>
</body></html>"#;

pub const SITE_EMPTY: &str = "<html><body><p>Nothing to see</p></body></html>";

pub const ARTICLE: &str = r#"<html><body>
  <h1>Oversized coats are back</h1>
  <p>Runways in Paris were full of volume.</p>
  <p>Expect camel and charcoal.</p>
</body></html>"#;

/// Spawn the fake sites and return their base url, e.g. `http://127.0.0.1:41234`.
pub async fn spawn_sites() -> String {
    let many: String = (0..30)
        .map(|i| format!("<h3><a href='/m/{i}'>Story {i}</a></h3>"))
        .collect();

    let app = Router::new()
        .route("/a", get(|| async { Html(SITE_A) }))
        .route("/b", get(|| async { Html(SITE_EMPTY) }))
        .route(
            "/c",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Html(SITE_A)
            }),
        )
        .route("/many", get(move || async move { Html(many) }))
        .route("/down", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
        .route("/a/coats", get(|| async { Html(ARTICLE) }))
        .route("/a/knit", get(|| async { StatusCode::NOT_FOUND }));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve fake sites");
    });
    format!("http://{addr}")
}

/// Short timeout so `/c` fails fast.
pub fn test_client() -> reqwest::Client {
    fashion_digest::ingest::fetcher::http_client("fashion-digest-tests", Duration::from_secs(1))
        .expect("build test client")
}
