// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::CatalogConfig;

/// Create a configured asynchronous HTTP client.
///
/// The client timeout covers the slowest call (a detail batch); the listing
/// request applies its own per-request timeout.
pub fn create_async_client(config: &CatalogConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(
            config.detail_timeout_secs.max(config.list_timeout_secs),
        ))
        .build()?;
    Ok(client)
}
