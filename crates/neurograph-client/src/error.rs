//! Error types for the NeuroGraph client
//!
//! Collaborator calls report failures as `CoreError`/`SourceError` so the
//! session controller can classify them; `ClientError` covers setup.

use thiserror::Error;

/// Result type for client setup
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::HttpClient(err.to_string())
    }
}
