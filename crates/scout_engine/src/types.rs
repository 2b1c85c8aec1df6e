use std::fmt;

use serde::{Deserialize, Serialize};

use scout_core::ProductRecord;

/// One strategy in the escalating fetch/parse chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "static")]
    Static,
    #[serde(rename = "static+anchor")]
    StaticAnchor,
    #[serde(rename = "rendered")]
    Rendered,
    #[serde(rename = "rendered+anchor")]
    RenderedAnchor,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Static => "static",
            Tier::StaticAnchor => "static+anchor",
            Tier::Rendered => "rendered",
            Tier::RenderedAnchor => "rendered+anchor",
        };
        f.write_str(name)
    }
}

/// Result of running the strategy chain over one listing page.
#[derive(Debug, Default)]
pub struct PageYield {
    /// Unique-per-page records, in extraction order.
    pub records: Vec<ProductRecord>,
    /// Deepest tier that contributed records, if any tier did.
    pub tier_used: Option<Tier>,
    /// Candidates assembled on this page, including ones that later failed
    /// the validity gate or page-level dedup.
    pub found: u64,
    /// Per-tier failures absorbed while assembling the page.
    pub soft_errors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Rendering-session failures. Always absorbed as zero tier yield.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("timed out after {0} ms waiting for {1}")]
    Timeout(u64, String),
}

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    NoResults,
}

/// Final summary handed back to the caller alongside the record sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub status: RunStatus,
    pub total_products: usize,
    pub pages_scraped: u32,
}
