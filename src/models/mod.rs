// src/models/mod.rs

//! Domain models for the feed generator.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod book;
mod config;
mod feed;
mod run;

// Re-export all public types
pub use book::{BookDescriptor, Contributor, Identifier, Subject};
pub use config::{
    BatchConfig, CatalogConfig, ClassifierConfig, Config, FeedConfig, FeedSource, PathsConfig,
};
pub use feed::{FeedChannel, FeedEntry};
pub use run::{DeltaDocument, RecordOutcome, RunStats, SkipReason};
