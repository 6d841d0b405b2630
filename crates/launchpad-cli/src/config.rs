//! Settings file management for launchpad.
//!
//! Provides a TOML settings file at `~/.config/launchpad/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use launchpad_core::{KillBehavior, LaunchConfiguration, OutputCapture};

/// Default tracing filter when neither `RUST_LOG`, `LAUNCHPAD_LOG`, nor the
/// config file set one.
pub const DEFAULT_LOG_FILTER: &str = "info";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub launch: LaunchSection,
    pub log: LogSection,
}

/// Overrides applied to every launch configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchSection {
    pub output_capture: Option<OutputCapture>,
    pub kill_behavior: Option<KillBehavior>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `launchpad_core=debug`.
    pub filter: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the launchpad config directory.
///
/// Uses XDG layout: `$XDG_CONFIG_HOME/launchpad` or `~/.config/launchpad`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("launchpad");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("launchpad")
}

/// Return the path to the launchpad config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<ConfigFile> {
    toml::from_str(contents).context("failed to parse config file")
}

/// Parse a serde enum from its string form (e.g. `"std"`).
fn parse_variant<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|e| format!("invalid value {value:?}: {e}"))
}

pub fn parse_output_capture(value: &str) -> Result<OutputCapture, String> {
    parse_variant(value)
}

pub fn parse_kill_behavior(value: &str) -> Result<KillBehavior, String> {
    parse_variant(value)
}

// -----------------------------------------------------------------------
// Resolved settings
// -----------------------------------------------------------------------

/// Fully resolved settings, ready for use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Replaces the launch file's `outputCapture` when set.
    pub output_capture: Option<OutputCapture>,
    /// Replaces the launch file's `killBehavior` when set.
    pub kill_behavior: Option<KillBehavior>,
    pub log_filter: String,
}

impl Settings {
    /// Resolve settings using the chain: CLI flag > env var > config file > default.
    ///
    /// - Output capture: `cli_output_capture` > `LAUNCHPAD_OUTPUT_CAPTURE` > `launch.output_capture`
    /// - Kill behavior: `LAUNCHPAD_KILL_BEHAVIOR` > `launch.kill_behavior`
    /// - Log filter: `LAUNCHPAD_LOG` > `log.filter` > [`DEFAULT_LOG_FILTER`]
    ///
    /// A missing config file is not an error; a malformed one is.
    pub fn resolve(cli_output_capture: Option<OutputCapture>) -> Result<Self> {
        let file_config = if config_path().exists() {
            Some(load_config()?)
        } else {
            None
        };
        let file_launch = file_config.as_ref().map(|c| &c.launch);

        let output_capture = match cli_output_capture {
            Some(capture) => Some(capture),
            None => match std::env::var("LAUNCHPAD_OUTPUT_CAPTURE") {
                Ok(value) => Some(
                    parse_output_capture(&value)
                        .map_err(anyhow::Error::msg)
                        .context("LAUNCHPAD_OUTPUT_CAPTURE env var is invalid")?,
                ),
                Err(_) => file_launch.and_then(|l| l.output_capture),
            },
        };

        let kill_behavior = match std::env::var("LAUNCHPAD_KILL_BEHAVIOR") {
            Ok(value) => Some(
                parse_kill_behavior(&value)
                    .map_err(anyhow::Error::msg)
                    .context("LAUNCHPAD_KILL_BEHAVIOR env var is invalid")?,
            ),
            Err(_) => file_launch.and_then(|l| l.kill_behavior),
        };

        let log_filter = std::env::var("LAUNCHPAD_LOG")
            .ok()
            .or_else(|| file_config.as_ref().and_then(|c| c.log.filter.clone()))
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            output_capture,
            kill_behavior,
            log_filter,
        })
    }

    /// Apply the resolved overrides to a launch configuration.
    pub fn apply(&self, config: &mut LaunchConfiguration) {
        if let Some(capture) = self.output_capture {
            config.output_capture = capture;
        }
        if let Some(behavior) = self.kill_behavior {
            config.kill_behavior = behavior;
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
