use thiserror::Error;

use crate::domain::filter::FilterError;
use crate::interfaces::SourceError;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type for NeuroGraph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Input rejected before any request was sent
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Network or connection failure talking to the generation service
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The generation service reported an error payload
    #[error("{0}")]
    ApplicationError(String),

    /// A single stream record could not be parsed
    #[error("Malformed stream record: {0}")]
    MalformedRecord(String),

    /// The stream closed before a terminal event arrived
    #[error("Graph generation ended before completion (incomplete generation)")]
    AbortedStream,

    /// Text source collaborator failure
    #[error("Text source error: {0}")]
    Source(#[from] SourceError),

    /// Illegal filter operation
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}
