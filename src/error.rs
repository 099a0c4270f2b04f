// src/error.rs

//! Unified error handling for the collector application.

use std::fmt;

use thiserror::Error;

/// Result type alias for collector operations.
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

    /// Feed unreachable or returned a malformed response; aborts that
    /// feed's ingestion for the run, other feeds are unaffected
    #[error("feed fetch failed for {feed}: {message}")]
    Fetch { feed: String, message: String },

    /// Sample host is blacklisted from analysis
    #[error("target {0} is blacklisted from analysis")]
    BlockedTarget(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a feed fetch error.
    pub fn fetch(feed: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            feed: feed.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
