//! Engine types
//!
//! Configuration, per-stream phases and the report of a sync run.

use crate::config::TapConfig;
use crate::error::Result;
use crate::types::ValidationPolicy;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Configuration for sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Treatment of records that fail schema validation
    pub validation: ValidationPolicy,
    /// Floor for the starting watermark of timestamp-keyed streams
    pub start_date: Option<DateTime<Utc>>,
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the sync config from the tap config
    pub fn from_tap_config(config: &TapConfig) -> Result<Self> {
        Ok(Self {
            validation: config.validation,
            start_date: config.start_date()?,
        })
    }

    /// Set validation policy
    #[must_use]
    pub fn with_validation(mut self, policy: ValidationPolicy) -> Self {
        self.validation = policy;
        self
    }

    /// Set start date floor
    #[must_use]
    pub fn with_start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }
}

/// Where a stream is in its sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// Resolving the starting watermark and first token
    Init,
    /// Requesting a page
    Fetching,
    /// Pulling records out of a page
    Extracting,
    /// All pages consumed
    Done,
    /// Stopped by an unrecoverable error
    Failed,
}

impl fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "INIT",
            Self::Fetching => "FETCHING",
            Self::Extracting => "EXTRACTING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Final result of one emitted stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    /// Stream name
    pub stream: String,
    /// Terminal phase
    pub phase: StreamPhase,
    /// Records emitted
    pub records: usize,
    /// Failure cause
    pub error: Option<String>,
}

impl StreamOutcome {
    /// Whether the stream failed
    pub fn is_failed(&self) -> bool {
        self.phase == StreamPhase::Failed
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Records emitted, per stream
    pub records: BTreeMap<String, usize>,
    /// Total pages fetched
    pub pages_fetched: usize,
    /// Child syncs run, one per parent record
    pub partitions_synced: usize,
    /// Records older than the starting watermark
    pub records_filtered: usize,
    /// Records that failed schema validation
    pub records_invalid: usize,
    /// Records not emitted (null primary key or strict validation)
    pub records_dropped: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an emitted record
    pub fn add_record(&mut self, stream: &str) {
        *self.records.entry(stream.to_string()).or_default() += 1;
    }

    /// Records emitted for a stream
    pub fn records_for(&self, stream: &str) -> usize {
        self.records.get(stream).copied().unwrap_or(0)
    }

    /// Records emitted across all streams
    pub fn total_records(&self) -> usize {
        self.records.values().sum()
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a partition
    pub fn add_partition(&mut self) {
        self.partitions_synced += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// Report of a sync run
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// One outcome per emitted stream, in sync order
    pub outcomes: Vec<StreamOutcome>,
    /// Run statistics
    pub stats: SyncStats,
}

impl SyncReport {
    /// Outcomes of failed streams
    pub fn failed(&self) -> impl Iterator<Item = &StreamOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    /// Whether every stream completed
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    /// Outcome of a stream
    pub fn outcome(&self, stream: &str) -> Option<&StreamOutcome> {
        self.outcomes.iter().find(|o| o.stream == stream)
    }
}
