// src/error.rs

//! Unified error handling for the catalog pivot application.

use std::fmt;

use thiserror::Error;

/// Result type alias for catalog pivot operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Object storage write or read failed
    #[error("Storage error for {key}: {message}")]
    Storage { key: String, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Catalog origin answered with something other than 200
    #[error("Unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

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

    /// One or more fan-out publishes failed
    #[error("Publish failed for {failed} of {total} artifacts: {details}")]
    Publish {
        failed: usize,
        total: usize,
        details: String,
    },
}

impl AppError {
    /// Create a storage error for an object key.
    pub fn storage(key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Storage {
            key: key.into(),
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

    /// Aggregate per-artifact failures from a joined publish batch.
    pub fn publish(total: usize, failures: &[(String, AppError)]) -> Self {
        let details = failures
            .iter()
            .map(|(key, err)| format!("{key} ({err})"))
            .collect::<Vec<_>>()
            .join("; ");
        Self::Publish {
            failed: failures.len(),
            total,
            details,
        }
    }
}
