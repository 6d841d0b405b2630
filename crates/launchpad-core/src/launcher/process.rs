//! Process wrapper returned by a launch.
//!
//! The wrapper does not own the `Child` directly: a supervisor task owns it,
//! waits for exit, and feeds [`ProcessEvent`]s to the router. The wrapper
//! keeps the pid, the kill behavior, a cancellation token for termination
//! requests, and a watch channel that resolves once the process is gone.

use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::KillBehavior;
use crate::router::{ProcessEvent, Router};

/// How a launched process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// The process ran and exited. `code` is `None` when it was killed by a
    /// signal.
    Exited { code: Option<i32> },
    /// The process never started, or waiting on it failed.
    Failed,
}

impl ProcessExit {
    pub fn code(&self) -> Option<i32> {
        match self {
            ProcessExit::Exited { code } => *code,
            ProcessExit::Failed => None,
        }
    }

    pub fn success(&self) -> bool {
        self.code() == Some(0)
    }
}

/// Handle to a launched program.
pub struct LaunchedProcess {
    pid: Option<u32>,
    kill_behavior: KillBehavior,
    cancel: CancellationToken,
    exit: watch::Receiver<Option<ProcessExit>>,
    routing: JoinHandle<()>,
}

impl LaunchedProcess {
    /// Take over a freshly spawned child: attach `router` to its pipes and
    /// start supervising it.
    pub(crate) fn supervise(mut child: Child, kill_behavior: KillBehavior, router: Router) -> Self {
        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (exit_tx, exit_rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        let routing = tokio::spawn(router.run(stdout, stderr, events_rx));
        tokio::spawn(wait_for_exit(
            child,
            kill_behavior,
            cancel.clone(),
            events_tx,
            exit_tx,
        ));

        Self {
            pid,
            kill_behavior,
            cancel,
            exit: exit_rx,
            routing,
        }
    }

    /// A process that could not be started. The router receives `message`
    /// as a process error and the exit resolves immediately.
    pub(crate) fn spawn_failed(message: String, kill_behavior: KillBehavior, router: Router) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let _ = events_tx.send(ProcessEvent::Error(message));
        drop(events_tx);

        let (_exit_tx, exit_rx) = watch::channel(Some(ProcessExit::Failed));
        let routing = tokio::spawn(router.run(
            None::<ChildStdout>,
            None::<ChildStderr>,
            events_rx,
        ));

        Self {
            pid: None,
            kill_behavior,
            cancel: CancellationToken::new(),
            exit: exit_rx,
            routing,
        }
    }

    /// OS process id; `None` if the process never started.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn kill_behavior(&self) -> KillBehavior {
        self.kill_behavior
    }

    pub fn has_exited(&self) -> bool {
        self.exit.borrow().is_some()
    }

    /// Ask the supervisor to terminate the process according to its kill
    /// behavior. Returns immediately; use [`LaunchedProcess::wait`] to
    /// observe the exit.
    pub fn kill(&self) {
        debug!(pid = ?self.pid, behavior = ?self.kill_behavior, "kill requested");
        self.cancel.cancel();
    }

    /// Wait for the process to exit.
    pub async fn wait(&self) -> ProcessExit {
        let mut exit = self.exit.clone();
        let observed = match exit.wait_for(Option::is_some).await {
            Ok(value) => *value,
            Err(_) => None,
        };
        let fallback = *self.exit.borrow();
        observed.or(fallback).unwrap_or(ProcessExit::Failed)
    }

    /// Wait for the process to exit and for its router to finish, so every
    /// output event has been delivered to the sink.
    pub async fn join(self) -> ProcessExit {
        let exit = self.wait().await;
        if let Err(e) = self.routing.await {
            warn!(pid = ?self.pid, error = %e, "output router task failed");
        }
        exit
    }
}

impl std::fmt::Debug for LaunchedProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchedProcess")
            .field("pid", &self.pid)
            .field("kill_behavior", &self.kill_behavior)
            .field("exit", &*self.exit.borrow())
            .finish()
    }
}

async fn wait_for_exit(
    mut child: Child,
    kill_behavior: KillBehavior,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<ProcessEvent>,
    exit: watch::Sender<Option<ProcessExit>>,
) {
    let pid = child.id();

    let waited = tokio::select! {
        status = child.wait() => Some(status),
        _ = cancel.cancelled() => None,
    };
    let status = match waited {
        Some(status) => status,
        None => {
            terminate(&mut child, kill_behavior);
            child.wait().await
        }
    };

    let outcome = match status {
        Ok(status) => {
            let code = status.code();
            debug!(?pid, ?code, "process exited");
            let _ = events.send(ProcessEvent::Exit(code));
            ProcessExit::Exited { code }
        }
        Err(e) => {
            warn!(?pid, error = %e, "failed to wait for process");
            let _ = events.send(ProcessEvent::Error(format!(
                "failed to wait for process: {e}\n"
            )));
            ProcessExit::Failed
        }
    };

    exit.send_replace(Some(outcome));
}

fn terminate(child: &mut Child, behavior: KillBehavior) {
    match behavior {
        KillBehavior::None => {
            debug!(pid = ?child.id(), "kill behavior is none, leaving process running");
        }
        KillBehavior::Polite => {
            #[cfg(unix)]
            {
                if let Some(pid) = child.id() {
                    // SAFETY: pid is a child we spawned and have not yet reaped.
                    let ret = unsafe { libc::kill(pid as i32, libc::SIGTERM) };
                    if ret == 0 {
                        return;
                    }
                    warn!(pid, "SIGTERM failed, falling back to kill");
                }
            }
            force_kill(child);
        }
        KillBehavior::Forceful => force_kill(child),
    }
}

fn force_kill(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!(pid = ?child.id(), error = %e, "failed to kill process");
    }
}
