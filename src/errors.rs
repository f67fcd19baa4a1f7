//! Error types for the ollamawire client core
//!
//! Synchronous calls surface every failure to the caller; the async
//! streamer converges all failure modes into its polled state instead.

use thiserror::Error;

/// Main error type for calls against the model server
#[derive(Error, Debug)]
pub enum OllamaError {
    /// The server answered with a non-success status. The message carries
    /// the error text accumulated from the response stream.
    #[error("{0}")]
    Protocol(String),

    /// HTTP transport failures, including mid-stream read errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request payload or response line (de)serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Background task failures (join errors)
    #[error("background task error: {0}")]
    Task(String),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, OllamaError>;
