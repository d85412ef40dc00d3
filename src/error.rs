// src/error.rs

//! Unified error handling for the feed generator.

use std::fmt;

use thiserror::Error;

/// Result type alias for feed operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catalog API returned something unusable
    #[error("Catalog error for {context}: {message}")]
    Catalog { context: String, message: String },

    /// Feed serialization failed
    #[error("Feed error: {0}")]
    Feed(String),

    /// Too many chunk fetches failed during one run
    #[error("Aborting run: {failed} chunk fetches failed (threshold {threshold})")]
    TooManyFailures { failed: usize, threshold: usize },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a catalog error with context.
    pub fn catalog(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Catalog {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a feed serialization error.
    pub fn feed(message: impl fmt::Display) -> Self {
        Self::Feed(message.to_string())
    }
}
