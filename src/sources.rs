//! # Source Registry
//!
//! Ordered list of the fashion sites the digest scrapes. Order here is the order
//! of sections in the report.
//!
//! - `default_seed()` holds the built-in sites with their headline selectors.
//! - `from_config()` lets `[[sources]]` in `config/digest.toml` replace the seed.

use crate::config::DigestConfig;
use crate::ingest::types::SourceDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<SourceDescriptor>) -> Self {
        let sources = sources
            .into_iter()
            .map(|s| {
                let cap = s.item_cap;
                s.with_item_cap(cap)
            })
            .collect();
        Self { sources }
    }

    /// Configured sources if any, else the built-in seed capped at `item_cap`.
    pub fn from_config(cfg: &DigestConfig) -> Self {
        if cfg.sources.is_empty() {
            Self::default_seed(cfg.item_cap)
        } else {
            Self::new(cfg.sources.clone())
        }
    }

    /// Built-in seed of fashion, sportswear and trend-forecasting sites.
    pub fn default_seed(item_cap: usize) -> Self {
        let seed = [
            ("WGSN", "https://www.wgsn.com/en", "h2, h3 a"),
            ("Coloro", "https://coloro.com/", "h2, h3 a"),
            (
                "Business of Fashion",
                "https://www.businessoffashion.com/",
                "h3 a",
            ),
            ("Nike News", "https://about.nike.com/en/newsroom", "h2 a"),
            ("FootyHeadlines", "https://www.footyheadlines.com/", "h3 a"),
            ("Sports.ru Style", "https://www.sports.ru/style/", "h2 a, h3 a"),
            ("WWD", "https://wwd.com/", "h3 a"),
            ("Blueprint", "https://theblueprint.ru/", "h2 a, h3 a"),
        ];
        Self::new(
            seed.iter()
                .map(|(name, url, sel)| SourceDescriptor::new(name, url, sel).with_item_cap(item_cap))
                .collect(),
        )
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
