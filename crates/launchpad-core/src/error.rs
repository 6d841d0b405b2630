use std::path::PathBuf;

use crate::config::ConsoleMode;

/// Failures that prevent a launch from returning a process handle.
///
/// Anything that goes wrong after the handle exists (missing executable,
/// non-zero exit) is reported through the output sink instead.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("launcher {launcher:?} cannot handle console mode {console:?}")]
    UnsupportedConsole {
        launcher: String,
        console: ConsoleMode,
    },

    #[error("working directory {} does not exist or is not a directory", path.display())]
    WorkingDirectory { path: PathBuf },

    #[error("failed to spawn {executable:?}")]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },
}
