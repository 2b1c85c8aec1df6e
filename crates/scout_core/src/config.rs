use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Invalid run configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("maxPages must be at least 1")]
    MaxPages,
    #[error("pageTimeoutMs must be positive")]
    PageTimeout,
    #[error("checkpointInterval must be positive")]
    CheckpointInterval,
    #[error("delay range invalid: min {min} > max {max}")]
    DelayRange { min: u64, max: u64 },
    #[error("base url invalid: {0}")]
    BaseUrl(String),
}

/// Configuration for one scrape session.
///
/// Supplied by the caller (CLI, env, config file); validated once at run
/// start and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    pub max_pages: u32,
    /// Minimum per-page yield before the chain escalates to the next tier.
    pub min_products_threshold: usize,
    pub page_timeout_ms: u64,
    /// Randomized inter-page pacing, inclusive bounds.
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Checkpoint every this many accepted records.
    pub checkpoint_interval: usize,
    pub headless_rendering: bool,
    /// Opaque authenticated-session token, attached as the Cookie header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Site origin used for search URLs and relative-link normalization.
    pub base_url: String,
    /// Directory receiving checkpoint and result files.
    pub output_dir: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_pages: 5,
            min_products_threshold: 10,
            page_timeout_ms: 12_000,
            min_delay_ms: 150,
            max_delay_ms: 400,
            checkpoint_interval: 100,
            headless_rendering: true,
            auth_token: None,
            base_url: "https://www.flipkart.com".to_string(),
            output_dir: ".".to_string(),
        }
    }
}

impl RunConfig {
    /// Check all invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pages < 1 {
            return Err(ConfigError::MaxPages);
        }
        if self.page_timeout_ms == 0 {
            return Err(ConfigError::PageTimeout);
        }
        if self.checkpoint_interval == 0 {
            return Err(ConfigError::CheckpointInterval);
        }
        if self.min_delay_ms > self.max_delay_ms {
            return Err(ConfigError::DelayRange {
                min: self.min_delay_ms,
                max: self.max_delay_ms,
            });
        }
        Url::parse(&self.base_url).map_err(|e| ConfigError::BaseUrl(e.to_string()))?;
        Ok(())
    }

    /// Search-results URL for a query and 1-based page number.
    pub fn listing_url(&self, query: &str, page: u32) -> Result<String, ConfigError> {
        let base = Url::parse(&self.base_url).map_err(|e| ConfigError::BaseUrl(e.to_string()))?;
        let mut url = base
            .join("/search")
            .map_err(|e| ConfigError::BaseUrl(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            if page > 1 {
                pairs.append_pair("page", &page.to_string());
            }
        }
        Ok(url.into())
    }
}
