use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::chat::{FashionAgent, CLEARED, FALLBACK_REPLY, WELCOME};

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<FashionAgent>,
}

impl AppState {
    pub fn new(agent: FashionAgent) -> Self {
        Self {
            agent: Arc::new(agent),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/trends", get(trends))
        .route("/chat", post(chat))
        .route("/chat/start", post(chat_start))
        .route("/chat/clear", post(chat_clear))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct ChatReq {
    user_id: String,
    text: String,
}

#[derive(Deserialize)]
struct UserReq {
    user_id: String,
}

#[derive(Serialize)]
struct ReplyResp {
    reply: String,
}

fn reply(text: impl Into<String>) -> Json<ReplyResp> {
    Json(ReplyResp { reply: text.into() })
}

async fn trends(State(state): State<AppState>) -> String {
    state.agent.trends().await
}

// LLM errors are answered with the fallback text, not an error status
async fn chat(State(state): State<AppState>, Json(body): Json<ChatReq>) -> Json<ReplyResp> {
    match state.agent.respond(&body.user_id, &body.text).await {
        Ok(text) => reply(text),
        Err(_) => reply(FALLBACK_REPLY),
    }
}

async fn chat_start(State(state): State<AppState>, Json(body): Json<UserReq>) -> Json<ReplyResp> {
    state.agent.sessions().start(&body.user_id);
    tracing::debug!(user = %body.user_id, "session started");
    reply(WELCOME)
}

async fn chat_clear(State(state): State<AppState>, Json(body): Json<UserReq>) -> Json<ReplyResp> {
    let existed = state.agent.sessions().clear(&body.user_id);
    tracing::debug!(user = %body.user_id, existed, "session cleared");
    reply(CLEARED)
}
