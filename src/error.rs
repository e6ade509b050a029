// src/error.rs

//! Unified error handling for the map client.

use std::fmt;

use thiserror::Error;

/// Result type alias for map client operations.
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

    /// A poll tick could not fetch its feed
    #[error("Fetch failed for {feed}: {message}")]
    TransientFetch { feed: String, message: String },

    /// A static reference asset could not be loaded or parsed
    #[error("Reference data '{resource}' unavailable: {message}")]
    ReferenceDataUnavailable { resource: String, message: String },

    /// A feed payload did not have the expected shape
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A map surface or presenter operation failed
    #[error("Surface error: {0}")]
    Surface(String),
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

    /// Create a transient fetch error for the named feed.
    pub fn fetch(feed: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::TransientFetch {
            feed: feed.into(),
            message: message.to_string(),
        }
    }

    /// Create a reference data error for the named resource.
    pub fn reference(resource: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::ReferenceDataUnavailable {
            resource: resource.into(),
            message: message.to_string(),
        }
    }

    /// Create a malformed payload error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload(message.into())
    }

    /// Create a surface error.
    pub fn surface(message: impl fmt::Display) -> Self {
        Self::Surface(message.to_string())
    }

    /// Whether this error only affects the current poll tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientFetch { .. } | Self::Http(_))
    }
}
