// src/config/digest.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::ingest::article::DEFAULT_ARTICLE_MAX_CHARS;
use crate::ingest::types::{SourceDescriptor, DEFAULT_ITEM_CAP};
use crate::pipeline::{Enrichment, Summarization};

pub const DEFAULT_DIGEST_CONFIG_PATH: &str = "config/digest.toml";
pub const ENV_DIGEST_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const ENV_API_KEY: &str = "DEEPSEEK_API_KEY";

/// Everything the digest core needs, handed to it at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub api_base: String,
    /// Literal key, or "ENV" to read DEEPSEEK_API_KEY.
    pub api_key: String,
    pub model: String,
    pub batch_size: usize,
    /// Cap for the built-in sources; `[[sources]]` entries carry their own.
    pub item_cap: usize,
    pub fetch_timeout_secs: u64,
    pub llm_timeout_secs: u64,
    pub article_max_chars: usize,
    pub max_concurrent_batches: usize,
    pub user_agent: String,
    pub enrichment: Enrichment,
    pub summarization: Summarization,
    /// Overrides the built-in registry when non-empty.
    pub sources: Vec<SourceDescriptor>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.deepseek.com/v1".to_string(),
            api_key: "ENV".to_string(),
            model: "deepseek-chat".to_string(),
            batch_size: 5,
            item_cap: DEFAULT_ITEM_CAP,
            fetch_timeout_secs: 10,
            llm_timeout_secs: 60,
            article_max_chars: DEFAULT_ARTICLE_MAX_CHARS,
            max_concurrent_batches: 2,
            user_agent: "Mozilla/5.0".to_string(),
            enrichment: Enrichment::None,
            summarization: Summarization::Batched,
            sources: Vec::new(),
        }
    }
}

impl DigestConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading digest config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    /// Load using env var + fallbacks:
    /// 1) $DIGEST_CONFIG_PATH
    /// 2) config/digest.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_DIGEST_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_DIGEST_CONFIG_PATH} points to non-existent path");
            }
            return Self::load_from_file(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_DIGEST_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(&default_p);
        }
        let mut cfg = Self::default();
        cfg.resolve_api_key()?;
        Ok(cfg.sanitized())
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: DigestConfig = toml::from_str(s).context("parsing digest config toml")?;
        cfg.resolve_api_key()?;
        Ok(cfg.sanitized())
    }

    /// "ENV" means: read from DEEPSEEK_API_KEY. A missing var leaves the key empty;
    /// the client then refuses to call out instead of the whole app refusing to start.
    fn resolve_api_key(&mut self) -> Result<()> {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = match env::var(ENV_API_KEY) {
                Ok(k) => k.trim().to_string(),
                Err(env::VarError::NotPresent) => {
                    tracing::warn!("{ENV_API_KEY} not set; summaries and chat will fail");
                    String::new()
                }
                Err(e) => return Err(anyhow!("reading {ENV_API_KEY}: {e}")),
            };
        }
        Ok(())
    }

    /// Clamp zeros to the smallest usable values.
    fn sanitized(mut self) -> Self {
        self.batch_size = self.batch_size.max(1);
        self.item_cap = self.item_cap.max(1);
        self.fetch_timeout_secs = self.fetch_timeout_secs.max(1);
        self.llm_timeout_secs = self.llm_timeout_secs.max(1);
        self.article_max_chars = self.article_max_chars.max(1);
        self.max_concurrent_batches = self.max_concurrent_batches.max(1);
        for s in &mut self.sources {
            s.item_cap = s.item_cap.max(1);
        }
        self
    }

    /// Batch size actually used by the chosen summarization strategy.
    pub fn effective_batch_size(&self) -> usize {
        match self.summarization {
            Summarization::PerItem => 1,
            _ => self.batch_size,
        }
    }
}
