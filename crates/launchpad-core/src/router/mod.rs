//! Stdio routing for a spawned process.
//!
//! Every launch attaches exactly one router, chosen from the configuration's
//! [`OutputCapture`]:
//!
//! - [`OutputCapture::Std`] -> [`CaptureRouter`]: stdout/stderr are split
//!   into lines and emitted as `stdout`/`stderr` events.
//! - [`OutputCapture::Console`] -> [`DiscardRouter`]: stdio is drained and
//!   dropped, except that stderr is held back until the debugger attaches so
//!   that an early failure can still be shown.
//!
//! Routers consume the raw pipes plus a channel of [`ProcessEvent`]s fed by
//! the process supervisor, and run until both pipes and the channel close.

pub mod capture;
pub mod discard;

use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio::sync::mpsc;

use crate::config::OutputCapture;
use crate::output::OutputSink;

pub use capture::CaptureRouter;
pub use discard::{ATTACH_MARKER, DiscardRouter, DiscardState, StderrFlow};

/// Process-level events delivered to a router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// The process could not be started or waited on.
    Error(String),
    /// The process exited; `None` when it was terminated by a signal.
    Exit(Option<i32>),
}

/// The router attached to one launch.
pub enum Router {
    Capture(CaptureRouter),
    Discard(DiscardRouter),
}

impl Router {
    /// Select the router for `capture`.
    pub fn for_capture(capture: OutputCapture, sink: Arc<dyn OutputSink>) -> Self {
        match capture {
            OutputCapture::Std => Router::Capture(CaptureRouter::new(sink)),
            OutputCapture::Console => Router::Discard(DiscardRouter::new(sink)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Router::Capture(_) => "capture",
            Router::Discard(_) => "discard",
        }
    }

    /// Route the process's streams and events until they are exhausted.
    pub async fn run<O, E>(
        self,
        stdout: Option<O>,
        stderr: Option<E>,
        events: mpsc::UnboundedReceiver<ProcessEvent>,
    ) where
        O: AsyncRead + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        match self {
            Router::Capture(router) => router.run(stdout, stderr, events).await,
            Router::Discard(router) => router.run(stdout, stderr, events).await,
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Router").field(&self.name()).finish()
    }
}

/// Read `reader` to EOF and drop everything, so the child never blocks on
/// a full pipe.
pub(crate) async fn drain<R>(mut reader: R, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
        tracing::debug!(stream, error = %e, "error draining process output");
    }
}
