//! Stream records and the events they decode to.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::graph::{Edge, Graph, Node};
use crate::domain::progress::ProgressState;
use crate::error::{CoreError, CoreResult};

/// Prefix marking a significant record
pub const EVENT_MARKER: &str = "data: ";

/// Longest record excerpt kept in malformed-record errors
const EXCERPT_LEN: usize = 120;

/// A discrete event decoded from the generation stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Non-terminal status update
    Progress(ProgressState),
    /// Terminal success carrying the sanitized graph
    Complete(Graph),
    /// Terminal application-level error reported by the service
    Failure(String),
}

impl StreamEvent {
    /// Whether no further events follow this one
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete(_) | StreamEvent::Failure(_))
    }

    /// Event type name, for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            StreamEvent::Progress(_) => "progress",
            StreamEvent::Complete(_) => "complete",
            StreamEvent::Failure(_) => "failure",
        }
    }
}

/// Payload of a significant record. Every field is optional; unknown fields
/// are ignored.
#[derive(Debug, Default, Deserialize)]
struct RecordPayload {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    progress: Option<Value>,
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    current: Option<Value>,
    #[serde(default)]
    total: Option<Value>,
    #[serde(default)]
    done: Option<Value>,
    #[serde(default)]
    nodes: Option<Vec<Node>>,
    #[serde(default)]
    edges: Option<Vec<Edge>>,
}

impl RecordPayload {
    fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(message) if message.is_empty() => None,
            Value::String(message) => Some(message.clone()),
            other => Some(other.to_string()),
        }
    }

    fn progress_value(&self) -> Option<f64> {
        self.progress.as_ref().and_then(Value::as_f64)
    }

    /// Display fields of the wrong JSON type keep their previous value
    fn status(&self) -> Option<String> {
        self.status.as_ref().and_then(Value::as_str).map(str::to_string)
    }

    fn counter(value: Option<&Value>) -> Option<u64> {
        value.and_then(Value::as_u64)
    }

    fn is_done(&self) -> bool {
        matches!(self.done, Some(Value::Bool(true)))
    }
}

/// Extract the payload of a significant record, or `None` for lines without
/// the event marker.
pub fn record_payload(line: &str) -> Option<&str> {
    line.strip_prefix(EVENT_MARKER)
}

/// Decode one significant record payload.
///
/// Precedence: error, then numeric progress, then the completion flag.
/// `Ok(None)` means the record is well formed but carries none of them.
pub fn decode_payload(payload: &str, previous: &ProgressState) -> CoreResult<Option<StreamEvent>> {
    let record: RecordPayload = serde_json::from_str(payload)
        .map_err(|err| CoreError::MalformedRecord(format!("{err}: {}", excerpt(payload))))?;

    if let Some(message) = record.error_message() {
        return Ok(Some(StreamEvent::Failure(message)));
    }

    if let Some(percent) = record.progress_value() {
        let progress = previous.merge(
            percent,
            record.status(),
            RecordPayload::counter(record.current.as_ref()),
            RecordPayload::counter(record.total.as_ref()),
        );
        return Ok(Some(StreamEvent::Progress(progress)));
    }

    if record.is_done() {
        let graph = Graph::new(
            record.nodes.unwrap_or_default(),
            record.edges.unwrap_or_default(),
        );
        return Ok(Some(StreamEvent::Complete(graph)));
    }

    Ok(None)
}

fn excerpt(payload: &str) -> String {
    if payload.chars().count() <= EXCERPT_LEN {
        payload.to_string()
    } else {
        let head: String = payload.chars().take(EXCERPT_LEN).collect();
        format!("{head}…")
    }
}
