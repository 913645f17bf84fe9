//! Pull-based ingestion of a generation response body.

use std::collections::VecDeque;

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use tracing::{debug, trace, warn};

use super::decoder::{LineBuffer, Utf8ChunkDecoder};
use super::event::{decode_payload, record_payload, StreamEvent};
use crate::domain::progress::ProgressState;
use crate::error::{CoreError, CoreResult};

/// Raw response body of a streamed generation request
pub type ByteStream = BoxStream<'static, CoreResult<Bytes>>;

/// Push-based decoder from raw chunks to stream events.
///
/// Emits at most one terminal event; everything after it is discarded.
#[derive(Debug)]
pub struct EventDecoder {
    utf8: Utf8ChunkDecoder,
    lines: LineBuffer,
    progress: ProgressState,
    terminated: bool,
    malformed: usize,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDecoder {
    /// Decoder whose progress starts from [`ProgressState::starting`]
    pub fn new() -> Self {
        Self::with_progress(ProgressState::starting())
    }

    /// Decoder that merges progress reports into `initial`
    pub fn with_progress(initial: ProgressState) -> Self {
        Self {
            utf8: Utf8ChunkDecoder::new(),
            lines: LineBuffer::new(),
            progress: initial,
            terminated: false,
            malformed: 0,
        }
    }

    /// Decode one chunk of the body
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.terminated {
            return Vec::new();
        }
        let text = self.utf8.decode(chunk);
        let lines = self.lines.push(&text);
        self.process(lines)
    }

    /// Flush buffered input at end of stream.
    ///
    /// A final record without a trailing newline is still processed.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.terminated {
            return Vec::new();
        }
        let tail = self.utf8.finish();
        let mut lines = self.lines.push(&tail);
        lines.extend(self.lines.finish());
        self.process(lines)
    }

    /// Whether a terminal event has been emitted
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Number of significant records skipped as unparseable
    pub fn malformed_records(&self) -> usize {
        self.malformed
    }

    /// Last known progress
    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    fn process(&mut self, lines: Vec<String>) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for line in lines {
            let Some(payload) = record_payload(&line) else {
                if !line.is_empty() {
                    trace!(line = %line, "Ignoring unmarked record");
                }
                continue;
            };
            match decode_payload(payload, &self.progress) {
                Ok(Some(event)) => {
                    if let StreamEvent::Progress(progress) = &event {
                        self.progress = progress.clone();
                    }
                    let terminal = event.is_terminal();
                    events.push(event);
                    if terminal {
                        self.terminated = true;
                        break;
                    }
                }
                Ok(None) => trace!("Ignoring record without error, progress or completion"),
                Err(err) => {
                    self.malformed += 1;
                    warn!(error = %err, count = self.malformed, "Skipping malformed stream record");
                }
            }
        }
        events
    }
}

/// Pull-based reader turning a [`ByteStream`] into [`StreamEvent`]s.
///
/// `next_event` yields events in arrival order and returns `Ok(None)` once a
/// terminal event has been delivered or the body is exhausted. The caller
/// tells the two apart with [`StreamIngestor::terminal_received`].
pub struct StreamIngestor {
    body: ByteStream,
    decoder: EventDecoder,
    queued: VecDeque<StreamEvent>,
    exhausted: bool,
}

impl StreamIngestor {
    /// Ingest `body` from the starting progress state
    pub fn new(body: ByteStream) -> Self {
        Self::with_decoder(body, EventDecoder::new())
    }

    /// Ingest `body` with a preconfigured decoder
    pub fn with_decoder(body: ByteStream, decoder: EventDecoder) -> Self {
        Self {
            body,
            decoder,
            queued: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Next event, suspending on body reads as needed.
    ///
    /// A transport error is returned as `Err` and ends ingestion.
    pub async fn next_event(&mut self) -> CoreResult<Option<StreamEvent>> {
        loop {
            if let Some(event) = self.queued.pop_front() {
                debug!(event_type = event.event_type(), "Stream event");
                return Ok(Some(event));
            }
            if self.exhausted || self.decoder.is_terminated() {
                return Ok(None);
            }
            match self.body.next().await {
                Some(Ok(chunk)) => {
                    trace!(bytes = chunk.len(), "Read stream chunk");
                    let events = self.decoder.feed(&chunk);
                    self.queued.extend(events);
                }
                Some(Err(err)) => {
                    self.exhausted = true;
                    warn!(error = %err, "Stream read failed");
                    return Err(err);
                }
                None => {
                    self.exhausted = true;
                    let events = self.decoder.finish();
                    self.queued.extend(events);
                    if !self.decoder.is_terminated() {
                        debug!("Stream closed without a terminal event");
                    }
                }
            }
        }
    }

    /// Whether a terminal event has been decoded
    pub fn terminal_received(&self) -> bool {
        self.decoder.is_terminated()
    }

    /// Number of records skipped as malformed
    pub fn malformed_records(&self) -> usize {
        self.decoder.malformed_records()
    }

    /// Consume the ingestor as a stream of events.
    ///
    /// A body that closes without a terminal event ends with
    /// `Err(CoreError::AbortedStream)`.
    pub fn into_events(self) -> impl Stream<Item = CoreResult<StreamEvent>> + Send {
        stream::unfold(Some(self), |state| async move {
            let mut ingestor = state?;
            match ingestor.next_event().await {
                Ok(Some(event)) => Some((Ok(event), Some(ingestor))),
                Ok(None) if ingestor.terminal_received() => None,
                Ok(None) => Some((Err(CoreError::AbortedStream), None)),
                Err(err) => Some((Err(err), None)),
            }
        })
    }
}

impl std::fmt::Debug for StreamIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamIngestor")
            .field("decoder", &self.decoder)
            .field("queued", &self.queued.len())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
