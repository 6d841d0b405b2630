//! Subprocess launch adapter for debuggable programs.
//!
//! Given a [`LaunchConfiguration`], the [`SubprocessLauncher`] spawns an OS
//! process with platform-correct argument and shell handling, then routes
//! the child's stdout/stderr through exactly one router:
//!
//! ```text
//! SubprocessLauncher::launch(executable, config, context)
//!     |
//!     +--> normalize::format_arguments  --> InvocationTuple
//!     |
//!     +--> spawn (cwd, merged env, shell flag)
//!     |
//!     +--> Router::for_capture(config.output_capture)
//!     |        |-- Capture: line-tracked stdout/stderr events
//!     |        `-- Discard: buffer stderr until "Debugger attached."
//!     |
//!     `--> LaunchedProcess { pid, kill_behavior, exit }
//! ```

pub mod config;
pub mod env;
pub mod error;
pub mod launcher;
pub mod normalize;
pub mod output;
pub mod platform;
pub mod router;

pub use config::{ConsoleMode, KillBehavior, LaunchConfiguration, OutputCapture};
pub use error::LaunchError;
pub use launcher::{LaunchContext, LaunchedProcess, ProcessExit, ProgramLauncher, SubprocessLauncher};
pub use normalize::{InvocationTuple, format_arguments};
pub use output::{ChannelSink, OutputCategory, OutputEvent, OutputSink};
pub use platform::Platform;
pub use router::{ProcessEvent, Router};
