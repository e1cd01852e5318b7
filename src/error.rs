//! Error handling and custom error types
//!
//! Provides unified error handling across the proxy using thiserror. Failures of a
//! single image upload are modelled separately by [`IngestError`] because they never
//! fail a request.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider API error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Chat request has no messages")]
    EmptyMessages,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reason a single image was dropped from an outgoing message.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("invalid image reference: {0}")]
    InvalidReference(String),

    #[error("unsupported image type: {0}")]
    UnsupportedMimeType(String),

    #[error("image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("pre-sign request rejected: {0}")]
    PreSign(Error),

    #[error("upload rejected: {0}")]
    Transfer(Error),

    #[error("file registration rejected: {0}")]
    Registration(Error),

    #[error("file status request failed: {0}")]
    Status(Error),

    #[error("provider failed to index file: {0}")]
    Indexing(String),

    #[error("upload deadline exceeded")]
    DeadlineExceeded,

    #[error("upload task failed: {0}")]
    Task(String),
}
