//! NeuroGraph Client - HTTP collaborators and command-line front end
//!
//! Implements the core's `GenerationService` and `TextSource` traits against
//! the graph generation service's HTTP API.

pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod text_source;

mod http;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use generation::HttpGenerationClient;
pub use text_source::HttpTextSource;
