//! Chunked detail fetching: record processing, pacing, error budget and
//! progress reporting.

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{BookDescriptor, RecordOutcome, SkipReason};
use crate::services::{ClassificationPolicy, evaluate, extract};

/// What one chunk's records turned into.
#[derive(Debug, Default)]
pub struct ChunkOutcome {
    pub accepted: Vec<BookDescriptor>,
    /// Non-null records returned
    pub fetched: usize,
    pub nulls: usize,
    pub skipped: usize,
}

/// Extract and classify one record.
pub fn process_record(raw: Option<&Value>, policy: &dyn ClassificationPolicy) -> RecordOutcome {
    match extract(raw) {
        Ok(book) => evaluate(policy, book),
        Err(reason) => RecordOutcome::Skipped(reason),
    }
}

/// Process a detail response in the order returned.
///
/// Null slots are counted separately and never reach extraction.
pub fn process_records(
    records: &[Option<Value>],
    policy: &dyn ClassificationPolicy,
) -> ChunkOutcome {
    let mut result = ChunkOutcome::default();

    for raw in records {
        if raw.is_none() {
            result.nulls += 1;
            continue;
        }
        result.fetched += 1;

        match process_record(raw.as_ref(), policy) {
            RecordOutcome::Accepted(book) => {
                log::info!("New match: {} (ISBN: {})", book.title, book.isbn);
                result.accepted.push(book);
            }
            RecordOutcome::Skipped(reason) => {
                result.skipped += 1;
                log_skip(&reason);
            }
        }
    }

    result
}

fn log_skip(reason: &SkipReason) {
    match reason {
        SkipReason::NotMatched(_) => log::trace!("Skipping {}", reason),
        _ => log::debug!("Skipping {}", reason),
    }
}

/// Counts failed chunks and aborts once the threshold is exceeded.
#[derive(Debug, Clone)]
pub struct ErrorBudget {
    failed: usize,
    threshold: usize,
}

impl ErrorBudget {
    pub fn new(threshold: usize) -> Self {
        Self {
            failed: 0,
            threshold,
        }
    }

    /// Record one failure. Errors when more than `threshold` have failed.
    pub fn record_failure(&mut self) -> Result<()> {
        self.failed += 1;
        if self.failed > self.threshold {
            return Err(AppError::TooManyFailures {
                failed: self.failed,
                threshold: self.threshold,
            });
        }
        Ok(())
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}

/// Fixed delay between consecutive chunk requests.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Wait after chunk `index` unless it was the last of `total`.
    pub async fn after_chunk(&self, index: usize, total: usize) {
        if index + 1 < total && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Periodic progress log with rate and ETA.
#[derive(Debug)]
pub struct Progress {
    started: Instant,
    total_ids: usize,
    total_chunks: usize,
    interval: usize,
}

impl Progress {
    pub fn new(total_ids: usize, total_chunks: usize, interval: usize) -> Self {
        Self {
            started: Instant::now(),
            total_ids,
            total_chunks,
            interval,
        }
    }

    /// Log before chunk `index` (zero-based) when it falls on the interval.
    pub fn report(&self, index: usize, processed_ids: usize) {
        if self.interval == 0 || index % self.interval != 0 {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            processed_ids as f64 / elapsed
        } else {
            0.0
        };
        let eta_min = if rate > 0.0 {
            (self.total_ids - processed_ids.min(self.total_ids)) as f64 / rate / 60.0
        } else {
            0.0
        };

        log::info!(
            "Chunk {}/{}: {:.1}s elapsed, {:.1} ids/s, ~{:.1} min remaining",
            index + 1,
            self.total_chunks,
            elapsed,
            rate,
            eta_min
        );
    }
}

/// Number of chunks needed for `len` identifiers.
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size.max(1))
}
