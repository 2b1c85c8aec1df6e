//! Scout core: pure data model for the listing extraction engine.
//!
//! Everything in this crate is side-effect free. The engine crate owns all
//! I/O; this crate owns records, selector configuration, run configuration
//! and the session state (dedup set + counters) the engine mutates through
//! a single control path.
mod config;
mod record;
mod selectors;
mod session;

pub use config::{ConfigError, RunConfig};
pub use record::{discount_percent, ProductRecord};
pub use selectors::{SelectorCatalog, SelectorField};
pub use session::{Admission, CheckpointSnapshot, SessionCounters, ScrapeSession};
