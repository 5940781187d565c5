//! Centralized error types for the trigger.

use thiserror::Error;

/// Failure reported by a search backend.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Failure reported by a poll state store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Main error type for trigger operations.
#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for trigger operations.
pub type TriggerResult<T> = Result<T, TriggerError>;

impl TriggerError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl StoreError {
    /// Create a backend error from any displayable cause.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}
