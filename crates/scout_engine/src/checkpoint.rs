//! Durable progress snapshots.
//!
//! A checkpoint is written every `interval` accepted records and
//! unconditionally at run termination, so a crash mid-run loses at most one
//! interval of work.

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use scout_core::CheckpointSnapshot;
use scout_logging::scout_debug;

use crate::persist::{AtomicJsonWriter, PersistError};

/// Which point of the run a checkpoint marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CheckpointMark {
    Page(u32),
    /// Terminal checkpoint: normal end, early exit or interruption.
    Final(&'static str),
}

impl CheckpointMark {
    pub const FINAL: CheckpointMark = CheckpointMark::Final("final");

    fn label(&self) -> String {
        match self {
            CheckpointMark::Page(page) => page.to_string(),
            CheckpointMark::Final(label) => (*label).to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CheckpointFile<'a> {
    query: &'a str,
    page: CheckpointMark,
    timestamp: String,
    counters: scout_core::SessionCounters,
    products: &'a [scout_core::ProductRecord],
}

/// Serializes session snapshots into timestamped checkpoint files.
pub struct CheckpointWriter {
    writer: AtomicJsonWriter,
}

impl CheckpointWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            writer: AtomicJsonWriter::new(output_dir),
        }
    }

    pub fn write(
        &self,
        query: &str,
        mark: CheckpointMark,
        snapshot: &CheckpointSnapshot,
    ) -> Result<PathBuf, PersistError> {
        let filename = format!(
            "checkpoint_{}_p{}_{}.json",
            slugify(query),
            mark.label(),
            Utc::now().timestamp()
        );
        let file = CheckpointFile {
            query,
            page: mark,
            timestamp: Utc::now().to_rfc3339(),
            counters: snapshot.counters,
            products: &snapshot.products,
        };
        let path = self.writer.write(&filename, &file)?;
        scout_debug!("checkpoint saved: {}", path.display());
        Ok(path)
    }
}

/// Query text reduced to a filesystem-safe slug.
pub fn slugify(query: &str) -> String {
    query
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}
