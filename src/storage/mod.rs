//! Durable state for the feed generator.
//!
//! Two stores carry memory across runs and must move together:
//! - Baseline: every catalog identifier seen as of the last successful run
//! - History: the accepted books the feed is rendered from
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml           # Configuration
//! ├── isbns_previous.json   # Baseline identifier set
//! ├── feed_history.json     # Accepted books, most recent first
//! ├── new_records.json      # Books accepted by the latest run
//! └── index.xml             # Published RSS feed
//! ```

pub mod local;

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{BookDescriptor, DeltaDocument, Identifier};

// Re-export for convenience
pub use local::LocalStorage;

/// A set of files to replace together. `None` leaves a file untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateCommit<'a> {
    pub baseline: Option<&'a BTreeSet<Identifier>>,
    pub history: Option<&'a [BookDescriptor]>,
    pub delta: Option<&'a DeltaDocument>,
    pub feed: Option<&'a [u8]>,
}

impl StateCommit<'_> {
    /// Number of files this commit replaces.
    pub fn file_count(&self) -> usize {
        [
            self.baseline.is_some(),
            self.history.is_some(),
            self.delta.is_some(),
            self.feed.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

/// Trait for state storage backends.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the baseline identifier set.
    ///
    /// A missing or corrupt file yields an empty set; only I/O failures
    /// other than "not found" are errors.
    async fn load_baseline(&self) -> Result<BTreeSet<Identifier>>;

    /// Load the feed history with the same tolerance as the baseline.
    async fn load_history(&self) -> Result<Vec<BookDescriptor>>;

    /// Replace every file in `commit`, the baseline last.
    ///
    /// A failure while writing leaves every file untouched.
    async fn commit(&self, commit: &StateCommit<'_>) -> Result<()>;

    /// Mid-run commit. Never carries the feed.
    async fn checkpoint(&self, commit: &StateCommit<'_>) -> Result<()> {
        let commit = StateCommit {
            feed: None,
            ..*commit
        };
        self.commit(&commit).await
    }
}
