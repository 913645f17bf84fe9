//! Fakes for the collaborator traits and helpers for building event streams.
//!
//! Enabled with the `testing` feature.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::domain::graph::GraphData;
use crate::error::{CoreError, CoreResult};
use crate::interfaces::{
    ExtractedText, FilterGraphRequest, GenerateRequest, GenerationService, SourceError, TextSource, UploadedFile,
};
use crate::stream::{ByteStream, EVENT_MARKER};

/// A `data: ` record line for `payload`, newline terminated
pub fn data_record(payload: &Value) -> String {
    format!("{EVENT_MARKER}{payload}\n")
}

/// Progress record with every field set
pub fn progress_record(percent: f64, status: &str, current: u64, total: u64) -> String {
    data_record(&json!({
        "progress": percent,
        "status": status,
        "current": current,
        "total": total,
    }))
}

/// Completion record carrying `nodes` and `edges` as given
pub fn complete_record(nodes: Value, edges: Value) -> String {
    data_record(&json!({ "done": true, "nodes": nodes, "edges": edges }))
}

/// Error record
pub fn error_record(message: &str) -> String {
    data_record(&json!({ "error": message }))
}

/// Split `bytes` into chunks of at most `size` bytes, ignoring code point
/// boundaries
pub fn split_every(bytes: &[u8], size: usize) -> Vec<Vec<u8>> {
    bytes.chunks(size.max(1)).map(<[u8]>::to_vec).collect()
}

/// Body yielding `chunks` in order, then closing
pub fn body_from_chunks(chunks: Vec<Vec<u8>>) -> ByteStream {
    stream::iter(chunks.into_iter().map(|chunk| Ok(Bytes::from(chunk)))).boxed()
}

/// Body yielding the concatenated records as one chunk
pub fn body_from_records(records: &[String]) -> ByteStream {
    body_from_chunks(vec![records.concat().into_bytes()])
}

/// Body yielding `chunks` and then failing with `error`
pub fn failing_body(chunks: Vec<Vec<u8>>, error: CoreError) -> ByteStream {
    let items: Vec<CoreResult<Bytes>> = chunks
        .into_iter()
        .map(|chunk| Ok(Bytes::from(chunk)))
        .chain(std::iter::once(Err(error)))
        .collect();
    stream::iter(items).boxed()
}

/// Write side of a body driven from the test
#[derive(Debug, Clone)]
pub struct BodySender {
    tx: mpsc::UnboundedSender<CoreResult<Bytes>>,
}

impl BodySender {
    /// Send raw bytes; returns `false` once the body has been dropped
    pub fn send(&self, chunk: impl Into<Bytes>) -> bool {
        self.tx.unbounded_send(Ok(chunk.into())).is_ok()
    }

    /// Send a transport error
    pub fn fail(&self, error: CoreError) -> bool {
        self.tx.unbounded_send(Err(error)).is_ok()
    }

    /// Close the body
    pub fn close(&self) {
        self.tx.close_channel();
    }
}

/// A body whose chunks are pushed by the test as it goes
pub fn controlled_body() -> (BodySender, ByteStream) {
    let (tx, rx) = mpsc::unbounded();
    (BodySender { tx }, rx.boxed())
}

/// Generation service replaying prepared responses in order
#[derive(Default)]
pub struct ScriptedGenerationService {
    bodies: Mutex<VecDeque<CoreResult<ByteStream>>>,
    filter_response: Mutex<Option<CoreResult<GraphData>>>,
    generate_requests: Mutex<Vec<GenerateRequest>>,
    filter_requests: Mutex<Vec<FilterGraphRequest>>,
}

impl fmt::Debug for ScriptedGenerationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedGenerationService")
            .field("queued_bodies", &self.bodies.lock().len())
            .field("generate_requests", &self.generate_requests.lock().len())
            .field("filter_requests", &self.filter_requests.lock().len())
            .finish()
    }
}

impl ScriptedGenerationService {
    /// Service with nothing scripted
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a body for the next `generate` call
    pub fn push_body(&self, body: ByteStream) -> &Self {
        self.bodies.lock().push_back(Ok(body));
        self
    }

    /// Queue records as a single-chunk body
    pub fn push_records(&self, records: &[String]) -> &Self {
        self.push_body(body_from_records(records))
    }

    /// Make the next `generate` call fail before streaming
    pub fn push_error(&self, error: CoreError) -> &Self {
        self.bodies.lock().push_back(Err(error));
        self
    }

    /// Response for every `filter_graph` call
    pub fn set_filter_response(&self, response: CoreResult<GraphData>) {
        *self.filter_response.lock() = Some(response);
    }

    /// Requests received by `generate`, in order
    pub fn generate_requests(&self) -> Vec<GenerateRequest> {
        self.generate_requests.lock().clone()
    }

    /// Requests received by `filter_graph`, in order
    pub fn filter_requests(&self) -> Vec<FilterGraphRequest> {
        self.filter_requests.lock().clone()
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerationService {
    async fn generate(&self, request: GenerateRequest) -> CoreResult<ByteStream> {
        self.generate_requests.lock().push(request);
        self.bodies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(CoreError::TransportError("no scripted response".to_string())))
    }

    async fn filter_graph(&self, request: FilterGraphRequest) -> CoreResult<GraphData> {
        self.filter_requests.lock().push(request);
        self.filter_response
            .lock()
            .clone()
            .unwrap_or_else(|| Err(CoreError::TransportError("no scripted response".to_string())))
    }
}

/// Text source answering from fixed tables
#[derive(Debug, Default)]
pub struct StaticTextSource {
    queries: HashMap<String, Result<String, SourceError>>,
    files: HashMap<String, Result<String, SourceError>>,
    calls: Mutex<usize>,
}

impl StaticTextSource {
    /// Source that knows no queries or files
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `query` to `text`
    pub fn with_query(mut self, query: &str, text: &str) -> Self {
        self.queries.insert(query.to_string(), Ok(text.to_string()));
        self
    }

    /// Fail resolution of `query`
    pub fn with_query_error(mut self, query: &str, error: SourceError) -> Self {
        self.queries.insert(query.to_string(), Err(error));
        self
    }

    /// Extract `text` from files named `filename`
    pub fn with_file(mut self, filename: &str, text: &str) -> Self {
        self.files.insert(filename.to_string(), Ok(text.to_string()));
        self
    }

    /// Fail extraction of files named `filename`
    pub fn with_file_error(mut self, filename: &str, error: SourceError) -> Self {
        self.files.insert(filename.to_string(), Err(error));
        self
    }

    /// Number of resolve/extract calls made
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl TextSource for StaticTextSource {
    async fn resolve_query(&self, query: &str) -> Result<String, SourceError> {
        *self.calls.lock() += 1;
        self.queries
            .get(query)
            .cloned()
            .unwrap_or_else(|| Err(SourceError::NotFound(query.to_string())))
    }

    async fn extract_file(&self, file: &UploadedFile) -> Result<ExtractedText, SourceError> {
        *self.calls.lock() += 1;
        let text = self
            .files
            .get(&file.filename)
            .cloned()
            .unwrap_or_else(|| Err(SourceError::Unsupported(file.filename.clone())))?;
        Ok(ExtractedText {
            text,
            filename: file.filename.clone(),
        })
    }
}
