mod logging;
mod results;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;
use tokio_util::sync::CancellationToken;

use scout_core::{RunConfig, SelectorCatalog};
use scout_engine::{ensure_output_dir, Orchestrator, RunOutcome};
use scout_logging::{scout_error, scout_info};

use crate::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(
    name = "scout",
    version,
    about = "Tiered product-listing scraper with checkpointed sessions"
)]
struct Cli {
    /// Search query, e.g. "gaming laptop".
    #[arg(value_name = "QUERY")]
    query: String,

    /// Maximum number of result pages to visit.
    #[arg(short, long, value_name = "N", default_value_t = 5)]
    pages: u32,

    /// Per-page yield below which the chain escalates to the next tier.
    #[arg(long, value_name = "N", default_value_t = 10)]
    threshold: usize,

    /// Per-page fetch and navigation timeout in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 12_000)]
    timeout_ms: u64,

    /// Lower bound of the randomized inter-page delay, milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 150)]
    min_delay_ms: u64,

    /// Upper bound of the randomized inter-page delay, milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 400)]
    max_delay_ms: u64,

    /// Write an intermediate checkpoint every N accepted products.
    #[arg(long, value_name = "N", default_value_t = 100)]
    checkpoint_interval: usize,

    /// Run the browser with a visible window instead of headless.
    #[arg(long, default_value_t = false)]
    headed: bool,

    /// Never launch a browser; static tiers only.
    #[arg(long, default_value_t = false)]
    no_render: bool,

    /// Session token forwarded as the Cookie header.
    #[arg(long, value_name = "TOKEN")]
    auth_token: Option<String>,

    /// Site origin to scrape.
    #[arg(long, value_name = "URL", default_value = "https://www.flipkart.com")]
    base_url: String,

    /// Directory receiving checkpoint and result files.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: String,

    /// Where log lines go.
    #[arg(long, value_enum, default_value_t = LogDestination::Both)]
    log: LogDestination,

    /// Enable debug-level logging.
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

impl Cli {
    fn to_config(&self) -> RunConfig {
        RunConfig {
            max_pages: self.pages,
            min_products_threshold: self.threshold,
            page_timeout_ms: self.timeout_ms,
            min_delay_ms: self.min_delay_ms,
            max_delay_ms: self.max_delay_ms,
            checkpoint_interval: self.checkpoint_interval,
            headless_rendering: !self.headed,
            auth_token: self.auth_token.clone(),
            base_url: self.base_url.clone(),
            output_dir: self.output_dir.clone(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(cli.log, level);

    let config = cli.to_config();
    if let Err(err) = config.validate() {
        eprintln!("scout: {err}");
        return ExitCode::from(2);
    }
    if let Err(err) = ensure_output_dir(Path::new(&config.output_dir)) {
        eprintln!("scout: {err}");
        return ExitCode::from(2);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("scout: cannot start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };
    runtime.block_on(run(cli, config))
}

async fn run(cli: Cli, config: RunConfig) -> ExitCode {
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                scout_info!("interrupt received, finishing up");
                cancel.cancel();
            }
        });
    }

    let mut orchestrator = Orchestrator::new(config.clone(), SelectorCatalog::default());
    if cli.no_render {
        orchestrator = orchestrator.without_rendering();
    }

    let outcome: RunOutcome = match orchestrator.run(&cli.query, cancel).await {
        Ok(outcome) => outcome,
        Err(err) => {
            scout_error!("run failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    match results::write_results(
        Path::new(&config.output_dir),
        &cli.query,
        &outcome.records,
        &outcome.counters,
    ) {
        Ok(path) => scout_info!("results written to {}", path.display()),
        Err(err) => {
            scout_error!("cannot write results file: {err}");
            return ExitCode::FAILURE;
        }
    }
    results::print_summary(&cli.query, &outcome.records, &outcome.counters);

    if outcome.interrupted {
        ExitCode::from(130)
    } else {
        ExitCode::SUCCESS
    }
}
