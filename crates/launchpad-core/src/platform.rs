use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The operating-system family a launch is prepared for.
///
/// Argument normalization only distinguishes Windows from everything else,
/// so the platform is passed explicitly rather than read from `cfg!` at each
/// call site. [`Platform::current`] gives the host value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    pub fn is_windows(self) -> bool {
        self == Platform::Windows
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => f.write_str("windows"),
            Platform::Unix => f.write_str("unix"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" | "win32" => Ok(Platform::Windows),
            "unix" | "linux" | "macos" | "darwin" => Ok(Platform::Unix),
            other => Err(format!(
                "invalid platform {other:?} (expected windows or unix)"
            )),
        }
    }
}
