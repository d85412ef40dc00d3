//! Run bookkeeping structures.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookDescriptor, Identifier};

/// Why a record did not make it into the accepted set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Null slot in a detail response
    NullRecord,
    /// Neither a summary nor an ONIX block
    MissingMetadata,
    MissingIdentifier,
    MissingTitle(Identifier),
    /// The classification policy did not match
    NotMatched(Identifier),
    /// Matched by code but no parseable publication date
    NoPublicationDate(Identifier),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullRecord => f.write_str("null record"),
            Self::MissingMetadata => f.write_str("no summary or onix block"),
            Self::MissingIdentifier => f.write_str("missing identifier"),
            Self::MissingTitle(id) => write!(f, "{id}: missing title"),
            Self::NotMatched(id) => write!(f, "{id}: not in target classification"),
            Self::NoPublicationDate(id) => write!(f, "{id}: matched but publication date unparsable"),
        }
    }
}

/// Result of processing one raw record.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    Accepted(BookDescriptor),
    Skipped(SkipReason),
}

/// Counters collected over one feed run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Identifiers in the persisted baseline at start
    pub previous_count: usize,
    /// Identifiers listed by the catalog this run
    pub current_count: usize,
    pub added_count: usize,
    pub removed_count: usize,
    pub first_run: bool,

    pub chunks_total: usize,
    pub chunks_failed: usize,
    pub records_fetched: usize,
    /// Null slots in detail responses (not errors)
    pub null_records: usize,
    /// Records rejected by extraction or classification
    pub records_skipped: usize,
    pub accepted: usize,
    pub checkpoints: usize,

    /// Entries written to the feed
    pub feed_items: usize,
}

impl RunStats {
    /// Log a one-screen summary.
    pub fn log_summary(&self, elapsed_secs: f64) {
        log::info!("Run finished in {:.1}s", elapsed_secs);
        log::info!(
            "  identifiers: {} listed, {} previously seen, {} added, {} removed",
            self.current_count,
            self.previous_count,
            self.added_count,
            self.removed_count
        );
        if !self.first_run {
            log::info!(
                "  chunks: {} fetched, {} failed, {} checkpoints",
                self.chunks_total,
                self.chunks_failed,
                self.checkpoints
            );
            log::info!(
                "  records: {} fetched, {} null, {} skipped, {} accepted",
                self.records_fetched,
                self.null_records,
                self.records_skipped,
                self.accepted
            );
        }
        log::info!("  feed items: {}", self.feed_items);
    }
}

/// Delta document listing the books accepted by one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaDocument {
    pub timestamp: DateTime<Utc>,
    pub count: usize,
    pub records: Vec<BookDescriptor>,
}

impl DeltaDocument {
    pub fn new(records: Vec<BookDescriptor>) -> Self {
        Self {
            timestamp: Utc::now(),
            count: records.len(),
            records,
        }
    }
}
