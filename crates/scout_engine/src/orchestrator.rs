//! Session orchestration: the sequential page loop.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use scout_core::{Admission, ConfigError, ProductRecord, RunConfig, ScrapeSession, SelectorCatalog, SessionCounters};
use scout_logging::{scout_debug, scout_error, scout_info, scout_warn};

use crate::checkpoint::{CheckpointMark, CheckpointWriter};
use crate::extract::ProductExtractor;
use crate::fetch::{FetchSettings, HttpListingFetcher};
use crate::render::RenderSettings;
use crate::tiers::{ChainSettings, StrategyChain};
use crate::types::{FetchError, RunStatus, RunSummary};

/// Errors that abort a run before or at setup. Mid-run failures degrade to
/// zero yield and counters instead.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Everything a finished (or interrupted) run hands back.
#[derive(Debug)]
pub struct RunOutcome {
    pub records: Vec<ProductRecord>,
    pub summary: RunSummary,
    pub counters: SessionCounters,
    /// True when the run stopped on explicit cancellation. The final
    /// checkpoint is written either way.
    pub interrupted: bool,
}

/// Drives one scrape session: owns the strategy chain, the session state
/// and the checkpoint writer for the duration of the run.
pub struct Orchestrator {
    config: RunConfig,
    catalog: SelectorCatalog,
    rendering_enabled: bool,
}

impl Orchestrator {
    pub fn new(config: RunConfig, catalog: SelectorCatalog) -> Self {
        Self {
            config,
            catalog,
            rendering_enabled: true,
        }
    }

    /// Skip the rendered tiers even when a page falls short. Used where no
    /// browser is available.
    pub fn without_rendering(mut self) -> Self {
        self.rendering_enabled = false;
        self
    }

    pub async fn run(
        &self,
        query: &str,
        cancel: CancellationToken,
    ) -> Result<RunOutcome, ScrapeError> {
        self.config.validate()?;
        let base = url::Url::parse(&self.config.base_url)
            .map_err(|e| ConfigError::BaseUrl(e.to_string()))?;

        let fetcher = HttpListingFetcher::new(FetchSettings {
            request_timeout: Duration::from_millis(self.config.page_timeout_ms),
            auth_cookie: self.config.auth_token.clone(),
            ..FetchSettings::default()
        })?;
        let extractor = ProductExtractor::new(self.catalog.clone(), base);

        let rendering = self.rendering_enabled.then(|| RenderSettings {
            headless: self.config.headless_rendering,
            nav_timeout_ms: self.config.page_timeout_ms,
            ..RenderSettings::default()
        });
        let mut chain = StrategyChain::new(
            Box::new(fetcher),
            extractor,
            ChainSettings {
                min_products_threshold: self.config.min_products_threshold,
                page_timeout_ms: self.config.page_timeout_ms,
                rendering,
                ..ChainSettings::default()
            },
        );

        let writer = CheckpointWriter::new(PathBuf::from(&self.config.output_dir));
        let mut session = ScrapeSession::new();

        scout_info!(
            "searching '{query}' (max {} pages, threshold {})",
            self.config.max_pages,
            self.config.min_products_threshold
        );
        let interrupted = self
            .page_loop(query, &mut chain, &mut session, &writer, &cancel)
            .await;

        // Terminal checkpoint and resource release run on every exit path,
        // including interruption.
        let snapshot = session.snapshot(self.config.checkpoint_interval);
        if let Err(e) = writer.write(query, CheckpointMark::FINAL, &snapshot) {
            scout_warn!("final checkpoint failed: {e}");
            session.note_error();
        }
        chain.teardown().await;

        let counters = session.counters();
        let records = session.into_records();
        let summary = RunSummary {
            status: if records.is_empty() {
                RunStatus::NoResults
            } else {
                RunStatus::Success
            },
            total_products: records.len(),
            pages_scraped: counters.pages_scraped,
        };
        scout_info!(
            "run finished: {} unique products over {} pages ({} errors)",
            summary.total_products,
            summary.pages_scraped,
            counters.errors
        );
        Ok(RunOutcome {
            records,
            summary,
            counters,
            interrupted,
        })
    }

    /// Returns true when the loop ended on cancellation.
    async fn page_loop(
        &self,
        query: &str,
        chain: &mut StrategyChain,
        session: &mut ScrapeSession,
        writer: &CheckpointWriter,
        cancel: &CancellationToken,
    ) -> bool {
        let mut empty_streak = 0u32;

        for page in 1..=self.config.max_pages {
            if cancel.is_cancelled() {
                scout_warn!("cancelled before page {page}");
                return true;
            }

            let url = match self.config.listing_url(query, page) {
                Ok(url) => url,
                Err(e) => {
                    scout_error!("page {page}: cannot build listing url: {e}");
                    session.note_error();
                    continue;
                }
            };
            scout_debug!("page {page}/{}: {url}", self.config.max_pages);

            let page_yield = chain.scrape_page(&url, page).await;
            session.note_found(page_yield.found);
            session.note_errors(page_yield.soft_errors);
            if !page_yield.records.is_empty() {
                session.note_page_scraped();
            }

            let mut accepted = 0usize;
            for record in page_yield.records {
                match session.admit(record) {
                    Admission::Accepted => accepted += 1,
                    Admission::Duplicate => {}
                    Admission::Invalid => {}
                }
            }

            if session.take_checkpoint_due(self.config.checkpoint_interval) {
                let snapshot = session.snapshot(self.config.checkpoint_interval);
                if let Err(e) = writer.write(query, CheckpointMark::Page(page), &snapshot) {
                    scout_warn!("checkpoint failed on page {page}: {e}");
                    session.note_error();
                }
            }

            if accepted == 0 {
                empty_streak += 1;
            } else {
                empty_streak = 0;
            }
            // Sustained empty yield means the result set ended or we are
            // being served block pages; either way, stop burning requests.
            if empty_streak >= 2 {
                scout_info!("no admitted records on two consecutive pages, ending early");
                return false;
            }

            if page < self.config.max_pages {
                let delay = pacing_delay(&self.config);
                tokio::select! {
                    _ = cancel.cancelled() => {
                        scout_warn!("cancelled during pacing after page {page}");
                        return true;
                    }
                    _ = sleep(delay) => {}
                }
            }
        }
        false
    }
}

fn pacing_delay(config: &RunConfig) -> Duration {
    let millis = if config.max_delay_ms > config.min_delay_ms {
        fastrand::u64(config.min_delay_ms..=config.max_delay_ms)
    } else {
        config.min_delay_ms
    };
    Duration::from_millis(millis)
}
