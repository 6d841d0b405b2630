//! Discard routing: stdio is thrown away, but stderr produced before the
//! debugger attaches is held so that a process dying on startup (bad flag,
//! syntax error, missing module) still shows why.
//!
//! State machine:
//!
//! ```text
//!             stderr chunk (no marker)
//!               +------+
//!               v      |
//!         +-----------------+   marker chunk / flush   +-----------+
//!  ---->  | Buffering{..}   | -----------------------> | Discarded |
//!         +-----------------+                          +-----------+
//! ```
//!
//! A flush (on process error or positive exit code) also ends buffering, so
//! buffered text is reported at most once.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use super::{ProcessEvent, drain};
use crate::output::{OutputEvent, OutputSink};

/// Text the runtime prints on stderr once a debugger has connected.
pub const ATTACH_MARKER: &[u8] = b"Debugger attached.";

/// How long stderr may keep delivering data after the process exits before
/// the exit is reported with whatever has been buffered so far.
const EXIT_SETTLE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardState {
    /// Stderr chunks seen so far, in arrival order.
    Buffering { chunks: Vec<Bytes> },
    /// The marker was seen or the buffer was flushed. Terminal.
    Discarded,
}

/// Whether the router still wants stderr chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StderrFlow {
    Continue,
    Detach,
}

pub struct DiscardRouter {
    state: DiscardState,
    sink: Arc<dyn OutputSink>,
}

impl DiscardRouter {
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self {
            state: DiscardState::Buffering { chunks: Vec::new() },
            sink,
        }
    }

    pub fn state(&self) -> &DiscardState {
        &self.state
    }

    /// Feed one stderr chunk.
    ///
    /// Returns [`StderrFlow::Detach`] once stderr no longer matters: on the
    /// chunk carrying the marker (which is itself dropped) and on any chunk
    /// after the buffer has been discarded.
    pub fn on_stderr(&mut self, chunk: &[u8]) -> StderrFlow {
        let DiscardState::Buffering { chunks } = &mut self.state else {
            return StderrFlow::Detach;
        };

        if contains_marker(chunk) {
            debug!(buffered = chunks.len(), "debugger attached, discarding stderr");
            self.state = DiscardState::Discarded;
            return StderrFlow::Detach;
        }

        chunks.push(Bytes::copy_from_slice(chunk));
        StderrFlow::Continue
    }

    /// The process could not be started or waited on.
    pub fn on_error(&mut self, message: &str) {
        self.flush();
        self.sink.output(OutputEvent::stderr(message));
    }

    /// The process exited. Only strictly positive codes are reported.
    pub fn on_exit(&mut self, code: Option<i32>) {
        match code {
            Some(code) if code > 0 => {
                self.flush();
                self.sink
                    .output(OutputEvent::stderr(format!("Process exited with code {code}\r\n")));
            }
            _ => debug!(?code, "process exited"),
        }
    }

    pub fn on_event(&mut self, event: ProcessEvent) {
        match event {
            ProcessEvent::Error(message) => self.on_error(&message),
            ProcessEvent::Exit(code) => self.on_exit(code),
        }
    }

    /// Emit the buffered stderr as one event and stop buffering. No-op once
    /// discarded.
    fn flush(&mut self) {
        let DiscardState::Buffering { chunks } =
            std::mem::replace(&mut self.state, DiscardState::Discarded)
        else {
            return;
        };

        let buffered: Vec<u8> = chunks.concat();
        if !buffered.is_empty() {
            self.sink
                .output(OutputEvent::stderr(String::from_utf8_lossy(&buffered)));
        }
    }

    /// Drive the state machine from live pipes and process events.
    ///
    /// Stdout is drained immediately. Stderr is fed chunk by chunk until the
    /// router detaches, then drained in the background. When a process event
    /// arrives while stderr is still open, stderr is read for up to
    /// [`EXIT_SETTLE`] first so that output written just before exit is
    /// part of the flush.
    pub async fn run<O, E>(
        mut self,
        stdout: Option<O>,
        stderr: Option<E>,
        mut events: mpsc::UnboundedReceiver<ProcessEvent>,
    ) where
        O: AsyncRead + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        if let Some(stdout) = stdout {
            tokio::spawn(drain(stdout, "stdout"));
        }

        let mut stderr = stderr.map(ReaderStream::new);

        loop {
            let step = match stderr.as_mut() {
                Some(chunks) => tokio::select! {
                    biased;
                    chunk = chunks.next() => Step::Chunk(chunk),
                    event = events.recv() => Step::Event(event),
                },
                None => Step::Event(events.recv().await),
            };

            match step {
                Step::Chunk(Some(Ok(chunk))) => {
                    if self.on_stderr(&chunk) == StderrFlow::Detach {
                        if let Some(rest) = stderr.take() {
                            tokio::spawn(drain_chunks(rest));
                        }
                    }
                }
                Step::Chunk(Some(Err(e))) => {
                    warn!(error = %e, "error reading process stderr");
                    stderr = None;
                }
                Step::Chunk(None) => stderr = None,
                Step::Event(Some(event)) => {
                    if let Some(rest) = stderr.take() {
                        self.settle(rest).await;
                    }
                    self.on_event(event);
                }
                Step::Event(None) => {
                    if let Some(rest) = stderr.take() {
                        tokio::spawn(drain_chunks(rest));
                    }
                    break;
                }
            }
        }
    }

    /// Keep feeding stderr until EOF, detachment, or the settle deadline.
    async fn settle<E>(&mut self, mut chunks: ReaderStream<E>)
    where
        E: AsyncRead + Unpin + Send + 'static,
    {
        let deadline = Instant::now() + EXIT_SETTLE;
        loop {
            match tokio::time::timeout_at(deadline, chunks.next()).await {
                Ok(Some(Ok(chunk))) => {
                    if self.on_stderr(&chunk) == StderrFlow::Detach {
                        break;
                    }
                }
                Ok(Some(Err(e))) => {
                    warn!(error = %e, "error reading process stderr");
                    return;
                }
                Ok(None) => return,
                Err(_) => {
                    debug!("stderr still open after process event");
                    break;
                }
            }
        }
        tokio::spawn(drain_chunks(chunks));
    }
}

enum Step {
    Chunk(Option<std::io::Result<Bytes>>),
    Event(Option<ProcessEvent>),
}

async fn drain_chunks<E>(mut chunks: ReaderStream<E>)
where
    E: AsyncRead + Unpin,
{
    while chunks.next().await.is_some() {}
}

fn contains_marker(chunk: &[u8]) -> bool {
    chunk
        .windows(ATTACH_MARKER.len())
        .any(|window| window == ATTACH_MARKER)
}
