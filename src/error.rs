//! Bento error types

use thiserror::Error;

/// Bento error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A card, page or stored key does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected input (unknown size, mismatched reorder set, wrong payload kind)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Persistence gateway error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Enrichment provider error (transport, non-success status, malformed body)
    #[error("Enrichment error: {0}")]
    Enrichment(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Bento operations
pub type Result<T> = std::result::Result<T, Error>;
