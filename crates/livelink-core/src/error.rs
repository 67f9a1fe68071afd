//! Error types for the LiveLink system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for LiveLink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the LiveLink system
#[derive(Error, Debug)]
pub enum Error {
    /// Notification payload could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Streaming-platform API errors
    #[error("platform error: {0}")]
    Platform(String),

    /// Redirect sink errors (with the sink that produced them)
    #[error("redirect sink error ({sink}): {message}")]
    RedirectSink {
        /// Sink name
        sink: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client errors (from upstream APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication against an upstream API failed
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A required upstream resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Network-related errors
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a platform error
    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform(msg.into())
    }

    /// Create a redirect sink error
    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RedirectSink {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
