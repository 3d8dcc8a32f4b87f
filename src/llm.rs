//! LLM client: chat-completions provider abstraction (DeepSeek / any OpenAI-compatible
//! endpoint) plus a deterministic mock for tests and local runs.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::DigestConfig;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String, // "system" | "user" | "assistant"
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API key is not configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("empty response")]
    EmptyResponse,
}

/// Trait object used by the summarizer and the chat agent.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send role-tagged messages, get the assistant's text back.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynChatClient = Arc<dyn ChatClient>;

/// Factory: build a client according to config and environment.
///
/// * If `AI_TEST_MODE=mock`, returns the deterministic mock client.
/// * Else the DeepSeek (OpenAI-compatible) provider from `config`.
pub fn build_chat_client(config: &DigestConfig) -> anyhow::Result<DynChatClient> {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        tracing::info!("AI_TEST_MODE=mock, using mock chat client");
        return Ok(Arc::new(MockChatClient::numbered()));
    }
    Ok(Arc::new(DeepSeekClient::from_config(config)?))
}

// ------------------------------------------------------------
// DeepSeek (chat completions)
// ------------------------------------------------------------

pub struct DeepSeekClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl DeepSeekClient {
    pub fn from_config(config: &DigestConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("fashion-digest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()
            .context("building llm http client")?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: 0.7,
            max_tokens: 1024,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatClient for DeepSeekClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let req = Req {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        tracing::debug!(model = %self.model, messages = messages.len(), "chat completion request");

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: crate::ingest::truncate_chars(body.trim(), 300),
            });
        }

        let body: Resp = resp.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(content)
    }

    fn provider_name(&self) -> &'static str {
        "deepseek"
    }
}

// ------------------------------------------------------------
// Mock
// ------------------------------------------------------------

/// Deterministic client for tests/local runs.
/// `numbered()` answers with one `N. ...` line per user message.
#[derive(Clone, Default)]
pub struct MockChatClient {
    pub fixed: Option<String>,
}

impl MockChatClient {
    pub fn numbered() -> Self {
        Self { fixed: None }
    }

    pub fn fixed(reply: impl Into<String>) -> Self {
        Self {
            fixed: Some(reply.into()),
        }
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        if let Some(reply) = &self.fixed {
            return Ok(reply.clone());
        }
        let lines: Vec<String> = messages
            .iter()
            .filter(|m| m.role == "user")
            .enumerate()
            .map(|(i, m)| {
                let first_line = m.content.lines().next().unwrap_or_default();
                format!("{}. (mock) {}", i + 1, first_line)
            })
            .collect();
        if lines.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(lines.join("\n"))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
