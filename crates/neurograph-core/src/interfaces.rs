//! Collaborator interfaces for NeuroGraph
//!
//! The session controller reaches the outside world only through these
//! traits: a text source that turns queries and uploaded files into plain
//! text, and the remote graph generation service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::graph::{Edge, GraphData};
use crate::error::CoreResult;
use crate::stream::ByteStream;

/// Errors reported by a text source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Nothing matched the query
    #[error("Not found: {0}")]
    NotFound(String),

    /// The provider failed or could not be reached
    #[error("Provider error: {0}")]
    Provider(String),

    /// The file could not be turned into text
    #[error("Unsupported file: {0}")]
    Unsupported(String),
}

/// A file supplied by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Original file name
    pub filename: String,
    /// Raw file contents
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Create an uploaded file
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Plain text extracted from an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Extracted text
    pub text: String,
    /// Name of the file it came from
    pub filename: String,
}

/// Resolves user input into the plain text sent for generation
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Fetch text for a search query
    async fn resolve_query(&self, query: &str) -> Result<String, SourceError>;

    /// Extract text from an uploaded file
    async fn extract_file(&self, file: &UploadedFile) -> Result<ExtractedText, SourceError>;
}

/// Body of a streamed generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Text to extract a graph from
    pub text: String,
}

/// Body of a server-side re-filtering request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterGraphRequest {
    /// Text the graph was generated from
    pub text: String,
    /// Node ids to keep
    pub selected_nodes: Vec<String>,
    /// Edges to keep
    pub selected_edges: Vec<Edge>,
}

/// The remote graph generation service
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Start a generation and return the raw event stream body.
    ///
    /// Errors returned here happen before any byte of the body is read.
    async fn generate(&self, request: GenerateRequest) -> CoreResult<ByteStream>;

    /// Re-filter a graph on the service and return it whole
    async fn filter_graph(&self, request: FilterGraphRequest) -> CoreResult<GraphData>;
}
