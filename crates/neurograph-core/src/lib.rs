//!
//! NeuroGraph Core - graph model, filtering and stream ingestion
//!
//! This crate turns the chunked event stream of a remote graph generation
//! service into a strongly consistent, filterable graph view. It has no HTTP
//! dependency: the service and the text source are reached through the
//! traits in [`interfaces`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - graph model, selection and progress
pub mod domain;

/// Event stream decoding
pub mod stream;

/// Application services - the generation session
pub mod application;

/// Collaborator traits
pub mod interfaces;

/// Error types
pub mod error;

/// Fakes for the collaborator traits
#[cfg(feature = "testing")]
pub mod test_utils;

pub use error::{CoreError, CoreResult};

pub use domain::filter::{available_edges, edge_identity, FilterEngine, FilterError, FilterMode, SelectionTarget};
pub use domain::graph::{Edge, EdgeKey, Graph, GraphData, Node};
pub use domain::progress::ProgressState;
pub use domain::view::GraphView;

pub use stream::{ByteStream, EventDecoder, StreamEvent, StreamIngestor};

pub use application::{
    FailureKind, GenerationOutcome, SessionController, SessionFailure, SessionPhase, SessionSnapshot, TextInput,
};
pub use interfaces::{
    ExtractedText, FilterGraphRequest, GenerateRequest, GenerationService, SourceError, TextSource, UploadedFile,
};
