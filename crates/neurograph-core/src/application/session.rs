use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::domain::filter::{FilterError, FilterMode};
use crate::domain::graph::{Edge, Graph, GraphData};
use crate::domain::progress::ProgressState;
use crate::domain::view::GraphView;
use crate::error::{CoreError, CoreResult};
use crate::interfaces::{FilterGraphRequest, GenerateRequest, GenerationService, TextSource, UploadedFile};
use crate::stream::{StreamEvent, StreamIngestor};

/// Message recorded when the service cannot be reached
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Could not reach the graph generation service";

/// Message recorded when the stream closes without a terminal event
pub const ABORTED_FAILURE_MESSAGE: &str = "Graph generation ended before completion (incomplete generation)";

/// What the user submitted for generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextInput {
    /// Free-form text, sent as is
    Custom(String),
    /// Search query resolved by the text source
    Query(String),
    /// Uploaded file whose text is extracted by the text source
    File(UploadedFile),
}

impl TextInput {
    /// Reject empty input before anything leaves the process
    pub fn validate(&self) -> CoreResult<()> {
        let message = match self {
            TextInput::Custom(text) if text.trim().is_empty() => "Please enter some text",
            TextInput::Query(query) if query.trim().is_empty() => "Please enter a search query",
            TextInput::File(file) if file.content.is_empty() => "The uploaded file is empty",
            _ => return Ok(()),
        };
        Err(CoreError::ValidationError(message.to_string()))
    }

    fn kind(&self) -> &'static str {
        match self {
            TextInput::Custom(_) => "custom",
            TextInput::Query(_) => "query",
            TextInput::File(_) => "file",
        }
    }
}

/// Lifecycle phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// Nothing generated yet
    #[default]
    Idle,
    /// A request is streaming
    Generating,
    /// The last request completed with a graph
    Ready,
    /// The last request failed
    Failed,
}

/// Category of a terminal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Network or connection failure
    Transport,
    /// Error reported by the service
    Application,
    /// Stream closed without a terminal event
    Aborted,
}

/// A user-visible, dismissible failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFailure {
    /// Failure category
    pub kind: FailureKind,
    /// Human readable message
    pub message: String,
}

impl SessionFailure {
    /// Failure reported by the service, shown verbatim
    pub fn application(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Application,
            message: message.into(),
        }
    }

    /// Classify an error that ended a request
    pub fn from_error(error: &CoreError) -> Self {
        match error {
            CoreError::ApplicationError(message) => Self::application(message.clone()),
            CoreError::AbortedStream => Self {
                kind: FailureKind::Aborted,
                message: ABORTED_FAILURE_MESSAGE.to_string(),
            },
            _ => Self {
                kind: FailureKind::Transport,
                message: TRANSPORT_FAILURE_MESSAGE.to_string(),
            },
        }
    }
}

/// Everything a reader may observe about the session, replaced atomically
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// Current phase
    pub phase: SessionPhase,
    /// Epoch of the latest request, 0 before the first one
    pub request_id: u64,
    /// Progress of the latest request
    pub progress: ProgressState,
    /// Graph plus selection, present only when `Ready`
    pub view: Option<GraphView>,
    /// Failure of the latest request, until dismissed
    pub failure: Option<SessionFailure>,
    /// Resolved text of the latest request
    pub text: Option<Arc<str>>,
    /// File name when the text came from an upload
    pub source_filename: Option<String>,
}

/// How a `generate` call ended
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// A graph was committed
    Ready,
    /// The request failed; the failure is also recorded in the snapshot
    Failed(SessionFailure),
    /// A newer request started first; nothing was applied
    Superseded,
}

struct ResolvedText {
    text: String,
    filename: Option<String>,
}

/// Orchestrates generation requests and owns the session state.
///
/// State lives in a watch channel: every mutation replaces the snapshot under
/// the channel lock, so readers always see a graph together with its
/// selection. Each request gets a new epoch; events carrying an older epoch
/// are dropped.
pub struct SessionController {
    text_source: Arc<dyn TextSource>,
    service: Arc<dyn GenerationService>,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    /// Create an idle controller
    pub fn new(text_source: Arc<dyn TextSource>, service: Arc<dyn GenerationService>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            text_source,
            service,
            state,
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Run one generation request to its end.
    ///
    /// Validation and text source errors are returned as `Err` and leave the
    /// state unchanged. Once the request is dispatched every outcome is
    /// recorded in the snapshot and reported as `Ok`.
    #[instrument(skip(self, input), fields(input = input.kind()))]
    pub async fn generate(&self, input: TextInput) -> CoreResult<GenerationOutcome> {
        input.validate()?;
        let resolved = self.resolve(input).await?;
        if resolved.text.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "No text to generate a graph from".to_string(),
            ));
        }

        let text: Arc<str> = Arc::from(resolved.text.as_str());
        let request_id = self.begin(text.clone(), resolved.filename);
        info!(request_id, chars = text.chars().count(), "Starting graph generation");

        let request = GenerateRequest {
            text: resolved.text,
        };
        let body = match self.service.generate(request).await {
            Ok(body) => body,
            Err(err) => {
                warn!(request_id, error = %err, "Generation request failed");
                return Ok(self.fail(request_id, SessionFailure::from_error(&err)));
            }
        };

        let mut ingestor = StreamIngestor::new(body);
        loop {
            match ingestor.next_event().await {
                Ok(Some(event)) => {
                    if let Some(outcome) = self.apply_event(request_id, event) {
                        return Ok(outcome);
                    }
                }
                Ok(None) => {
                    warn!(request_id, "Stream ended without a terminal event");
                    return Ok(self.fail(request_id, SessionFailure::from_error(&CoreError::AbortedStream)));
                }
                Err(err) => {
                    warn!(request_id, error = %err, "Stream read failed");
                    return Ok(self.fail(request_id, SessionFailure::from_error(&err)));
                }
            }
        }
    }

    /// Clear the recorded failure. The phase stays `Failed`.
    pub fn dismiss_failure(&self) -> bool {
        self.state.send_if_modified(|state| state.failure.take().is_some())
    }

    /// Apply a filter operation to the current view.
    ///
    /// The operation runs on a copy; the snapshot is replaced only when it
    /// succeeds.
    pub fn update_view<R>(
        &self,
        op: impl FnOnce(&mut GraphView) -> Result<R, FilterError>,
    ) -> CoreResult<R> {
        let mut outcome = Err(FilterError::NoGraph);
        self.state.send_if_modified(|state| {
            let Some(view) = state.view.as_mut() else {
                return false;
            };
            let mut next = view.clone();
            outcome = op(&mut next);
            if outcome.is_ok() {
                *view = next;
                true
            } else {
                false
            }
        });
        outcome.map_err(CoreError::from)
    }

    /// Switch the node selection mode; `Custom` opens a staged edit
    pub fn set_node_mode(&self, mode: FilterMode) -> CoreResult<()> {
        self.update_view(|view| view.set_node_mode(mode))
    }

    /// Switch the edge selection mode; `Custom` opens a staged edit
    pub fn set_edge_mode(&self, mode: FilterMode) -> CoreResult<()> {
        self.update_view(|view| view.set_edge_mode(mode))
    }

    /// Replace the staged node draft
    pub fn propose_nodes(&self, nodes: Vec<String>) -> CoreResult<()> {
        self.update_view(|view| view.propose_nodes(nodes))
    }

    /// Replace the staged edge draft
    pub fn propose_edges(&self, edges: Vec<Edge>) -> CoreResult<()> {
        self.update_view(|view| view.propose_edges(edges))
    }

    /// Toggle one node in the staged draft. Returns whether it is now included.
    pub fn toggle_staged_node(&self, id: &str) -> CoreResult<bool> {
        self.update_view(|view| view.toggle_staged_node(id))
    }

    /// Toggle one edge (by identity) in the staged draft
    pub fn toggle_staged_edge(&self, edge: &Edge) -> CoreResult<bool> {
        self.update_view(|view| view.toggle_staged_edge(edge))
    }

    /// Commit the staged selection edit
    pub fn commit_selection(&self) -> CoreResult<()> {
        self.update_view(GraphView::commit)
    }

    /// Discard the staged selection edit
    pub fn cancel_selection(&self) -> CoreResult<()> {
        self.update_view(GraphView::cancel)
    }

    /// Re-derive both selections to `All`
    pub fn reset_filters(&self) -> CoreResult<()> {
        self.update_view(|view| {
            view.reset_filters();
            Ok(())
        })
    }

    /// Edges available for the committed node selection
    pub fn available_edges(&self) -> CoreResult<Vec<Edge>> {
        let state = self.state.borrow();
        let view = state.view.as_ref().ok_or(FilterError::NoGraph)?;
        Ok(view.available_edges())
    }

    /// The subgraph to render, if a graph is loaded
    pub fn visible_graph(&self) -> Option<GraphData> {
        self.state.borrow().view.as_ref().map(GraphView::visible_graph)
    }

    /// Ask the service to re-filter the current graph with the committed
    /// selection. Local filter state is not touched.
    #[instrument(skip(self))]
    pub async fn refilter_remote(&self) -> CoreResult<GraphData> {
        let request = {
            let state = self.state.borrow();
            let view = state.view.as_ref().ok_or(FilterError::NoGraph)?;
            FilterGraphRequest {
                text: state.text.as_deref().unwrap_or_default().to_string(),
                selected_nodes: view.filters().selected_nodes().to_vec(),
                selected_edges: view.filters().selected_edges().to_vec(),
            }
        };
        debug!(
            nodes = request.selected_nodes.len(),
            edges = request.selected_edges.len(),
            "Requesting server-side re-filter"
        );
        let data = self.service.filter_graph(request).await?;
        Ok(Graph::from(data).to_data())
    }

    async fn resolve(&self, input: TextInput) -> CoreResult<ResolvedText> {
        let resolved = match input {
            TextInput::Custom(text) => ResolvedText { text, filename: None },
            TextInput::Query(query) => {
                let text = self
                    .text_source
                    .resolve_query(query.trim())
                    .await
                    .map_err(|err| {
                        warn!(error = %err, "Query resolution failed");
                        err
                    })?;
                ResolvedText { text, filename: None }
            }
            TextInput::File(file) => {
                let extracted = self.text_source.extract_file(&file).await.map_err(|err| {
                    warn!(filename = %file.filename, error = %err, "Text extraction failed");
                    err
                })?;
                ResolvedText {
                    text: extracted.text,
                    filename: Some(extracted.filename),
                }
            }
        };
        Ok(resolved)
    }

    /// Enter `Generating` under a new epoch and drop the previous graph
    fn begin(&self, text: Arc<str>, filename: Option<String>) -> u64 {
        let mut request_id = 0;
        self.state.send_modify(|state| {
            if state.phase == SessionPhase::Generating {
                info!(superseded = state.request_id, "Superseding in-flight request");
            }
            state.request_id += 1;
            request_id = state.request_id;
            state.phase = SessionPhase::Generating;
            state.progress = ProgressState::starting();
            state.view = None;
            state.failure = None;
            state.text = Some(text);
            state.source_filename = filename;
        });
        request_id
    }

    /// Apply one event if `request_id` is still current. Returns the outcome
    /// once the request is over.
    fn apply_event(&self, request_id: u64, event: StreamEvent) -> Option<GenerationOutcome> {
        let terminal = event.is_terminal();
        let mut outcome = None;
        let current = self.state.send_if_modified(|state| {
            if state.request_id != request_id {
                return false;
            }
            match event {
                StreamEvent::Progress(progress) => {
                    state.progress = progress;
                }
                StreamEvent::Complete(graph) => {
                    info!(
                        request_id,
                        nodes = graph.nodes().len(),
                        edges = graph.edges().len(),
                        "Graph generation complete"
                    );
                    state.phase = SessionPhase::Ready;
                    state.view = Some(GraphView::new(graph));
                    outcome = Some(GenerationOutcome::Ready);
                }
                StreamEvent::Failure(message) => {
                    warn!(request_id, message = %message, "Service reported an error");
                    let failure = SessionFailure::application(message);
                    state.phase = SessionPhase::Failed;
                    state.failure = Some(failure.clone());
                    outcome = Some(GenerationOutcome::Failed(failure));
                }
            }
            true
        });

        if !current {
            info!(request_id, "Discarding events of superseded request");
            return Some(GenerationOutcome::Superseded);
        }
        if terminal {
            outcome
        } else {
            None
        }
    }

    fn fail(&self, request_id: u64, failure: SessionFailure) -> GenerationOutcome {
        let current = self.state.send_if_modified(|state| {
            if state.request_id != request_id {
                return false;
            }
            state.phase = SessionPhase::Failed;
            state.failure = Some(failure.clone());
            true
        });
        if current {
            GenerationOutcome::Failed(failure)
        } else {
            info!(request_id, "Dropping failure of superseded request");
            GenerationOutcome::Superseded
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_validation_messages() {
        let cases = vec![
            (TextInput::Custom("  \n".into()), "Please enter some text"),
            (TextInput::Query("".into()), "Please enter a search query"),
            (TextInput::File(UploadedFile::new("notes.txt", Vec::new())), "The uploaded file is empty"),
        ];
        for (input, message) in cases {
            assert_eq!(input.validate(), Err(CoreError::ValidationError(message.to_string())));
        }
        assert_eq!(TextInput::Query("Rust".into()).validate(), Ok(()));
    }

    #[test]
    fn test_failure_classification() {
        assert_eq!(
            SessionFailure::from_error(&CoreError::TransportError("reset".into())),
            SessionFailure {
                kind: FailureKind::Transport,
                message: TRANSPORT_FAILURE_MESSAGE.to_string(),
            }
        );
        assert_eq!(
            SessionFailure::from_error(&CoreError::ApplicationError("Model overloaded".into())).message,
            "Model overloaded"
        );
        assert_eq!(
            SessionFailure::from_error(&CoreError::AbortedStream).kind,
            FailureKind::Aborted
        );
    }
}
