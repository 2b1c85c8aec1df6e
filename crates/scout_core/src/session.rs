use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::record::ProductRecord;

/// Outcome of offering a record to the session registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// Identifier already seen this session.
    Duplicate,
    /// Failed the validity gate; counted but never stored.
    Invalid,
}

/// Running counters, reported in checkpoints and the final summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCounters {
    pub pages_scraped: u32,
    pub products_found: u64,
    pub products_valid: u64,
    pub errors: u64,
}

/// Point-in-time view of the session, serialized by the checkpoint writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointSnapshot {
    pub counters: SessionCounters,
    /// Most recently accepted records, up to the checkpoint interval.
    pub products: Vec<ProductRecord>,
}

/// Mutable state of one scrape run.
///
/// Owned exclusively by the orchestrator; the identifier set grows
/// monotonically and is the sole source of cross-page deduplication.
#[derive(Debug, Default)]
pub struct ScrapeSession {
    seen_ids: HashSet<String>,
    records: Vec<ProductRecord>,
    counters: SessionCounters,
    accepted_since_checkpoint: usize,
}

impl ScrapeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a record: validity gate, then identifier dedup.
    ///
    /// Accepted records are appended in arrival order. "Found" counting is
    /// separate ([`Self::note_found`]) since extraction discovers candidates
    /// that never reach admission.
    pub fn admit(&mut self, record: ProductRecord) -> Admission {
        if !record.is_valid() {
            return Admission::Invalid;
        }
        if !self.seen_ids.insert(record.identifier.clone()) {
            return Admission::Duplicate;
        }
        self.counters.products_valid += 1;
        self.accepted_since_checkpoint += 1;
        self.records.push(record);
        Admission::Accepted
    }

    /// True when `interval` records have accumulated since the last
    /// checkpoint. Resets the window.
    pub fn take_checkpoint_due(&mut self, interval: usize) -> bool {
        if self.accepted_since_checkpoint >= interval {
            self.accepted_since_checkpoint = 0;
            true
        } else {
            false
        }
    }

    pub fn note_page_scraped(&mut self) {
        self.counters.pages_scraped += 1;
    }

    pub fn note_found(&mut self, candidates: u64) {
        self.counters.products_found += candidates;
    }

    pub fn note_error(&mut self) {
        self.counters.errors += 1;
    }

    pub fn note_errors(&mut self, count: u64) {
        self.counters.errors += count;
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ProductRecord> {
        self.records
    }

    pub fn unique_count(&self) -> usize {
        self.seen_ids.len()
    }

    /// Snapshot holding at most the `interval` most recent records.
    pub fn snapshot(&self, interval: usize) -> CheckpointSnapshot {
        let start = self.records.len().saturating_sub(interval);
        CheckpointSnapshot {
            counters: self.counters,
            products: self.records[start..].to_vec(),
        }
    }
}
