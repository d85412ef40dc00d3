//! Feed sink input model.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Channel-level metadata for one published feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedChannel {
    pub title: String,
    pub description: String,
    pub link: String,
    pub language: String,
    pub copyright: String,
    pub generator: String,
    pub managing_editor: Option<String>,
    pub last_build: DateTime<FixedOffset>,

    /// Newest entry timestamp, or the build time for an empty feed
    pub pub_date: DateTime<FixedOffset>,
}

/// One rendered feed item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedEntry {
    /// Catalog identifier, used as the stable guid
    pub id: String,
    pub title: String,
    pub link: String,
    pub author: Option<String>,
    pub description: String,
    pub published: DateTime<FixedOffset>,
    pub categories: Vec<String>,
}
