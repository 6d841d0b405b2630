use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::ProcessEvent;
use crate::output::tracker::track_lines;
use crate::output::{OutputCategory, OutputEvent, OutputSink};

/// Forwards stdout and stderr line by line to the sink.
pub struct CaptureRouter {
    sink: Arc<dyn OutputSink>,
}

impl CaptureRouter {
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self { sink }
    }

    /// Read both streams to EOF concurrently. Spawn and wait failures are
    /// reported on `stderr`; exit codes are not.
    pub async fn run<O, E>(
        self,
        stdout: Option<O>,
        stderr: Option<E>,
        mut events: mpsc::UnboundedReceiver<ProcessEvent>,
    ) where
        O: AsyncRead + Unpin,
        E: AsyncRead + Unpin,
    {
        let sink = self.sink.as_ref();

        let stdout_lines = async {
            if let Some(stdout) = stdout {
                track_lines(stdout, OutputCategory::Stdout, sink).await;
            }
        };
        let stderr_lines = async {
            if let Some(stderr) = stderr {
                track_lines(stderr, OutputCategory::Stderr, sink).await;
            }
        };
        let process_events = async {
            while let Some(event) = events.recv().await {
                match event {
                    ProcessEvent::Error(message) => {
                        warn!(%message, "process error");
                        sink.output(OutputEvent::stderr(message));
                    }
                    ProcessEvent::Exit(code) => debug!(?code, "process exited"),
                }
            }
        };

        tokio::join!(stdout_lines, stderr_lines, process_events);
    }
}
