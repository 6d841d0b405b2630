//! Internal-console launcher: runs the program as a plain child process.

use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{LaunchContext, LaunchedProcess, ProgramLauncher};
use crate::config::{ConsoleMode, LaunchConfiguration};
use crate::env::{current_environment, merge_environment};
use crate::error::LaunchError;
use crate::normalize::{InvocationTuple, format_arguments};
use crate::output::OutputEvent;
use crate::platform::Platform;
use crate::router::Router;

/// Launches programs as child processes whose stdio is routed to the
/// output sink (capture) or discarded after the debugger attaches.
#[derive(Debug, Clone, Copy)]
pub struct SubprocessLauncher {
    platform: Platform,
}

impl SubprocessLauncher {
    /// A launcher for the host platform.
    pub fn new() -> Self {
        Self::with_platform(Platform::current())
    }

    /// A launcher that normalizes arguments for `platform`.
    ///
    /// Only argument normalization and environment-name matching follow
    /// `platform`; the shell used for shell-mode invocations is always the
    /// host's.
    pub fn with_platform(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn command(&self, invocation: &InvocationTuple, config: &LaunchConfiguration) -> Command {
        let mut cmd = if invocation.shell {
            shell_command(&invocation.command_line())
        } else {
            let mut cmd = Command::new(&invocation.executable);
            cmd.args(&invocation.args);
            cmd
        };

        cmd.current_dir(&invocation.cwd)
            .env_clear()
            .envs(merge_environment(
                current_environment(),
                &config.env,
                self.platform,
            ))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Default for SubprocessLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("cmd.exe");
    cmd.raw_arg("/d /s /c").raw_arg(format!("\"{line}\""));
    cmd
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(line);
    cmd
}

#[async_trait]
impl ProgramLauncher for SubprocessLauncher {
    fn name(&self) -> &str {
        "subprocess"
    }

    fn can_launch(&self, config: &LaunchConfiguration) -> bool {
        config.console == ConsoleMode::InternalConsole
    }

    async fn launch(
        &self,
        executable: &str,
        config: &LaunchConfiguration,
        context: &LaunchContext,
    ) -> Result<LaunchedProcess, LaunchError> {
        if !self.can_launch(config) {
            return Err(LaunchError::UnsupportedConsole {
                launcher: self.name().to_string(),
                console: config.console,
            });
        }

        let invocation = format_arguments(
            executable,
            &config.expanded_args(),
            &config.cwd,
            self.platform,
        );
        debug!(?invocation, capture = ?config.output_capture, "launching program");

        context
            .sink
            .output(OutputEvent::console(format!("{}\n", invocation.command_line())));

        if !invocation.cwd.is_dir() {
            return Err(LaunchError::WorkingDirectory {
                path: invocation.cwd,
            });
        }

        let router = Router::for_capture(config.output_capture, context.sink.clone());

        match self.command(&invocation, config).spawn() {
            Ok(child) => {
                info!(pid = ?child.id(), executable = %invocation.executable, router = router.name(), "program started");
                Ok(LaunchedProcess::supervise(child, config.kill_behavior, router))
            }
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                warn!(executable = %invocation.executable, error = %e, "program failed to start");
                let message = format!("failed to spawn {}: {e}\n", invocation.executable);
                Ok(LaunchedProcess::spawn_failed(message, config.kill_behavior, router))
            }
            Err(source) => Err(LaunchError::Spawn {
                executable: invocation.executable,
                source,
            }),
        }
    }
}
