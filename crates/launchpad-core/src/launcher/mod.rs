//! Program launchers.
//!
//! A [`ProgramLauncher`] decides whether it can handle a configuration
//! ([`ProgramLauncher::can_launch`]) and starts the program
//! ([`ProgramLauncher::launch`]). Selecting between launchers by console
//! mode is left to the caller; this crate provides the
//! [`SubprocessLauncher`] for the internal console.

pub mod process;
pub mod subprocess;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LaunchConfiguration;
use crate::error::LaunchError;
use crate::output::OutputSink;

pub use process::{LaunchedProcess, ProcessExit};
pub use subprocess::SubprocessLauncher;

/// Per-launch collaborators supplied by the caller.
#[derive(Clone)]
pub struct LaunchContext {
    /// Destination for console echo, captured output and failure reports.
    pub sink: Arc<dyn OutputSink>,
}

impl LaunchContext {
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self { sink }
    }
}

impl std::fmt::Debug for LaunchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchContext")
            .field("sink", &"<sink>")
            .finish()
    }
}

/// Adapter interface for starting a debuggable program.
///
/// Object-safe so launchers can be held as `Box<dyn ProgramLauncher>`.
#[async_trait]
pub trait ProgramLauncher: Send + Sync {
    /// Human-readable name (e.g. "subprocess").
    fn name(&self) -> &str;

    /// Whether this launcher handles `config`. Pure.
    fn can_launch(&self, config: &LaunchConfiguration) -> bool;

    /// Start `executable` as described by `config`.
    ///
    /// Returns as soon as the process is started; output and exit are
    /// reported asynchronously through `context.sink`.
    async fn launch(
        &self,
        executable: &str,
        config: &LaunchConfiguration,
        context: &LaunchContext,
    ) -> Result<LaunchedProcess, LaunchError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn ProgramLauncher) {}
};
