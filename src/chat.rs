//! chat.rs: per-user conversation store and the stylist agent that answers.
//!
//! Messages that ask for trends/news are routed to the digest pipeline; everything
//! else goes to the LLM with the user's recent history.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::llm::{ChatMessage, DynChatClient, LlmError};
use crate::pipeline::DigestPipeline;

/// Messages kept per user (system prompt not counted).
pub const HISTORY_CAP: usize = 20;

pub const SYSTEM_PROMPT: &str = "You are a fashion stylist and creative producer. \
You help people put outfits together, plan shoots and lookbooks, and read current \
fashion and sportswear trends. Answer concisely, in the language the user writes in, \
and give concrete suggestions (pieces, colours, brands, references) rather than \
generic advice.";

pub const WELCOME: &str = "👋 Hi! I'm your fashion assistant. Ask me about outfits, \
shoots or styling, or type \"trends\" for a fresh fashion news digest.";

pub const HELP: &str = "Send any question about style and I'll answer. \
Type \"trends\" (or \"мода\", \"тренды\") for the latest fashion headlines. \
Use /clear to start the conversation over.";

pub const CLEARED: &str = "🧹 History cleared.";

/// Reply sent when the LLM call fails.
pub const FALLBACK_REPLY: &str =
    "⚠️ Something went wrong on my side. Try again, or clear the history with /clear.";

const TRENDS_KEYWORDS: &[&str] = &[
    "fashion news",
    "fashion",
    "trends",
    "новости моды",
    "мода",
    "тренды",
];

/// True when `text` asks for the news digest rather than a conversation.
pub fn is_trends_request(text: &str) -> bool {
    let lower = text.to_lowercase();
    TRENDS_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Users kept at once; the least recently active session is evicted past this.
pub const MAX_USERS: usize = 10_000;

#[derive(Debug, Default)]
struct Session {
    messages: Vec<ChatMessage>,
    last_seen: u64,
}

#[derive(Debug, Default)]
struct SessionMap {
    sessions: HashMap<String, Session>,
    tick: u64,
}

impl SessionMap {
    /// Session for `user`, created on first contact, marked as most recent.
    fn touch(&mut self, user: &str, max_users: usize) -> &mut Session {
        self.tick += 1;
        if !self.sessions.contains_key(user) && self.sessions.len() >= max_users {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|(_, s)| s.last_seen)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                tracing::debug!(user = %oldest, "evicting idle chat session");
                self.sessions.remove(&oldest);
            }
        }
        let session = self.sessions.entry(user.to_string()).or_default();
        session.last_seen = self.tick;
        session
    }
}

/// Conversation history per user id, trimmed to the most recent `cap` messages.
/// In-memory only: sessions live as long as the process, at most `max_users` of them.
#[derive(Debug)]
pub struct ChatSessions {
    inner: Mutex<SessionMap>,
    cap: usize,
    max_users: usize,
}

impl Default for ChatSessions {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAP)
    }
}

impl ChatSessions {
    pub fn with_capacity(cap: usize) -> Self {
        Self::with_limits(cap, MAX_USERS)
    }

    pub fn with_limits(cap: usize, max_users: usize) -> Self {
        Self {
            inner: Mutex::new(SessionMap::default()),
            cap: cap.max(1),
            max_users: max_users.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionMap> {
        // poisoned lock: keep serving the data
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Create or reset the session.
    pub fn start(&self, user: &str) {
        self.lock().touch(user, self.max_users).messages.clear();
    }

    /// Append a message, creating the session on first contact.
    pub fn push(&self, user: &str, msg: ChatMessage) {
        let mut map = self.lock();
        let v = &mut map.touch(user, self.max_users).messages;
        v.push(msg);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    pub fn history(&self, user: &str) -> Vec<ChatMessage> {
        self.lock()
            .sessions
            .get(user)
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }

    /// Drop the session entirely. Returns whether one existed.
    pub fn clear(&self, user: &str) -> bool {
        self.lock().sessions.remove(user).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().sessions.is_empty()
    }
}

pub struct FashionAgent {
    client: DynChatClient,
    sessions: Arc<ChatSessions>,
    pipeline: Arc<DigestPipeline>,
}

impl FashionAgent {
    pub fn new(
        client: DynChatClient,
        sessions: Arc<ChatSessions>,
        pipeline: Arc<DigestPipeline>,
    ) -> Self {
        Self {
            client,
            sessions,
            pipeline,
        }
    }

    pub fn sessions(&self) -> &ChatSessions {
        &self.sessions
    }

    /// Latest digest as text.
    pub async fn trends(&self) -> String {
        self.pipeline.run().await.text()
    }

    /// Answer one user message.
    pub async fn respond(&self, user: &str, text: &str) -> Result<String, LlmError> {
        match text.trim() {
            "/start" => {
                self.sessions.start(user);
                return Ok(WELCOME.to_string());
            }
            "/help" => return Ok(HELP.to_string()),
            "/clear" => {
                self.sessions.clear(user);
                return Ok(CLEARED.to_string());
            }
            _ => {}
        }
        if is_trends_request(text) {
            tracing::info!(user, "trends requested");
            return Ok(self.trends().await);
        }

        self.sessions.push(user, ChatMessage::user(text));
        let mut messages = Vec::with_capacity(HISTORY_CAP + 1);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend(self.sessions.history(user));

        match self.client.complete(&messages).await {
            Ok(reply) => {
                self.sessions.push(user, ChatMessage::assistant(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!(user, error = %e, provider = self.client.provider_name(), "chat reply failed");
                Err(e)
            }
        }
    }
}
