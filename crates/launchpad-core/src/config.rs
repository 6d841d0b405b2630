//! Launch configuration consumed by the launcher.
//!
//! Field names follow the camelCase keys of a debug `launch.json` entry so
//! that a configuration can be deserialized directly from JSON or TOML.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the debuggee's console is shown.
///
/// Only [`ConsoleMode::InternalConsole`] is handled by the subprocess
/// launcher; the terminal variants belong to other launchers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConsoleMode {
    #[default]
    InternalConsole,
    IntegratedTerminal,
    ExternalTerminal,
}

/// How the debuggee's stdio reaches the user.
///
/// `Console` means the runtime's own console API output is what the user
/// sees (it arrives through the debugger), so raw stdio is discarded unless
/// the process fails early. `Std` routes raw stdout/stderr through the
/// output sink line by line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputCapture {
    #[default]
    Console,
    #[serde(alias = "capture")]
    Std,
}

/// Termination policy handed to the process wrapper.
///
/// The launcher never interprets this; it is carried on the returned
/// [`crate::LaunchedProcess`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KillBehavior {
    #[default]
    Forceful,
    Polite,
    None,
}

/// A debuggable-program launch request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LaunchConfiguration {
    pub console: ConsoleMode,
    /// Executable to run when the caller does not supply one.
    pub runtime_executable: Option<String>,
    /// Arguments for the runtime itself, placed before the program.
    pub runtime_args: Vec<String>,
    /// Program (script) passed to the runtime.
    pub program: Option<String>,
    /// Arguments for the program.
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Environment overrides. `None` removes the variable from the child.
    pub env: BTreeMap<String, Option<String>>,
    pub output_capture: OutputCapture,
    pub kill_behavior: KillBehavior,
}

impl LaunchConfiguration {
    /// Create a configuration running in `cwd` with every other field at
    /// its default.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            ..Self::default()
        }
    }

    pub fn console(mut self, console: ConsoleMode) -> Self {
        self.console = console;
        self
    }

    pub fn runtime_args(mut self, args: Vec<String>) -> Self {
        self.runtime_args = args;
        self
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Set (`Some`) or unset (`None`) an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.env.insert(key.into(), value);
        self
    }

    pub fn output_capture(mut self, capture: OutputCapture) -> Self {
        self.output_capture = capture;
        self
    }

    pub fn kill_behavior(mut self, behavior: KillBehavior) -> Self {
        self.kill_behavior = behavior;
        self
    }

    /// Expand the configuration into the runtime's argument list:
    /// runtime args, then the program, then the program's args.
    pub fn expanded_args(&self) -> Vec<String> {
        let mut expanded = Vec::with_capacity(self.runtime_args.len() + self.args.len() + 1);
        expanded.extend(self.runtime_args.iter().cloned());
        if let Some(program) = &self.program {
            expanded.push(program.clone());
        }
        expanded.extend(self.args.iter().cloned());
        expanded
    }
}
