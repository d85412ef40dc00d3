//! Pipeline stages for feed generation.
//!
//! - `diff`: baseline vs. current snapshot
//! - `batch`: chunked fetch, pacing, error budget
//! - `history`: capped, deduplicated feed history
//! - `render`: descriptors to feed entries
//! - `run`: end-to-end orchestration (`run_feed`, `render_stored`)

pub mod batch;
pub mod diff;
pub mod history;
pub mod render;
pub mod run;

pub use diff::{DiffPlan, SnapshotDiff, calculate_diff, plan};
pub use history::FeedHistory;
pub use render::FeedRenderer;
pub use run::{FeedRunner, build_feed, render_stored, run_feed};
