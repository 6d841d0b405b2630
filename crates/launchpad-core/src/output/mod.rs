//! Structured output events and the sinks that receive them.

pub mod tracker;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

pub use tracker::LineTracker;

/// Output channel an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputCategory {
    /// Informational text from the launcher itself (e.g. the command echo).
    Console,
    Stdout,
    Stderr,
}

/// One piece of user-visible output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEvent {
    pub category: OutputCategory,
    pub output: String,
}

impl OutputEvent {
    pub fn new(category: OutputCategory, output: impl Into<String>) -> Self {
        Self {
            category,
            output: output.into(),
        }
    }

    pub fn console(output: impl Into<String>) -> Self {
        Self::new(OutputCategory::Console, output)
    }

    pub fn stdout(output: impl Into<String>) -> Self {
        Self::new(OutputCategory::Stdout, output)
    }

    pub fn stderr(output: impl Into<String>) -> Self {
        Self::new(OutputCategory::Stderr, output)
    }
}

/// Receiver of output events.
///
/// Implementations must not block: events are emitted from I/O tasks.
pub trait OutputSink: Send + Sync {
    fn output(&self, event: OutputEvent);
}

impl<F> OutputSink for F
where
    F: Fn(OutputEvent) + Send + Sync,
{
    fn output(&self, event: OutputEvent) {
        self(event)
    }
}

/// Sink that forwards events into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutputEvent>,
}

impl ChannelSink {
    /// Create a sink and the stream yielding every event sent to it.
    ///
    /// The stream ends once every clone of the sink has been dropped.
    pub fn new() -> (Self, UnboundedReceiverStream<OutputEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, UnboundedReceiverStream::new(rx))
    }
}

impl OutputSink for ChannelSink {
    fn output(&self, event: OutputEvent) {
        if self.tx.send(event).is_err() {
            debug!("output receiver dropped, discarding event");
        }
    }
}
