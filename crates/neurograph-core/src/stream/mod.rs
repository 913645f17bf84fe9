//! Ingestion of the chunked generation event stream.
//!
//! Bytes are decoded incrementally ([`decoder`]), split into records,
//! parsed into [`StreamEvent`]s ([`event`]) and pulled by the session loop
//! through a [`StreamIngestor`] ([`ingestor`]).

pub mod decoder;
pub mod event;
pub mod ingestor;

pub use event::{StreamEvent, EVENT_MARKER};
pub use ingestor::{ByteStream, EventDecoder, StreamIngestor};
