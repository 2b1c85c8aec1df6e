//! Scout engine: tiered page acquisition, extraction and session orchestration.
mod orchestrator;
mod tiers;
mod fetch;
mod render;
mod markup;
mod resolve;
mod extract;
mod checkpoint;
mod persist;
mod types;

pub use orchestrator::{Orchestrator, RunOutcome, ScrapeError};
pub use tiers::{ChainSettings, StrategyChain};
pub use fetch::{decode_listing, FetchSettings, HttpListingFetcher, ListingFetcher, USER_AGENTS};
pub use render::{RenderSettings, RenderingSession};
pub use markup::{DomNode, LiveNode, LivePage, StaticDocument, StaticNode};
pub use resolve::FieldResolver;
pub use extract::ProductExtractor;
pub use checkpoint::{slugify, CheckpointMark, CheckpointWriter};
pub use persist::{ensure_output_dir, AtomicJsonWriter, PersistError};
pub use types::{
    FailureKind, FetchError, PageYield, RenderError, RunStatus, RunSummary, Tier,
};
