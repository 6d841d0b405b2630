//! `launchpad run` command: launch a program from a configuration file and
//! stream its output events to stdout as JSON lines.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use futures::StreamExt;
use tracing::info;

use launchpad_core::{
    ChannelSink, LaunchConfiguration, LaunchContext, OutputEvent, Platform, ProcessExit,
    ProgramLauncher, SubprocessLauncher,
};

use crate::config::Settings;

/// Load a launch configuration from `path`.
///
/// Files ending in `.json` are parsed as JSON, everything else as TOML. An
/// empty `cwd` becomes the directory holding the file; a relative one is
/// resolved against it.
pub fn load_launch_config(path: &Path) -> Result<LaunchConfiguration> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read launch configuration {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let mut config: LaunchConfiguration = if is_json {
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {} as JSON", path.display()))?
    } else {
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse {} as TOML", path.display()))?
    };

    let base = config_base_dir(path);
    if config.cwd.as_os_str().is_empty() {
        config.cwd = base;
    } else if config.cwd.is_relative() {
        config.cwd = base.join(&config.cwd);
    }

    Ok(config)
}

fn config_base_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Map a process outcome to the exit code `launchpad run` reports.
pub fn exit_code(exit: ProcessExit) -> i32 {
    match exit {
        ProcessExit::Exited { code: Some(code) } => code,
        ProcessExit::Exited { code: None } | ProcessExit::Failed => 1,
    }
}

fn print_event(out: &mut impl Write, event: &OutputEvent) -> Result<()> {
    let line = serde_json::to_string(event).context("failed to serialize output event")?;
    writeln!(out, "{line}").context("failed to write output event")?;
    out.flush().context("failed to flush stdout")
}

/// Launch the configuration at `config_path` and stream its events until
/// the program exits. Returns the exit code to report.
pub async fn run_launch(
    config_path: &Path,
    executable: Option<String>,
    settings: &Settings,
    platform: Option<Platform>,
) -> Result<i32> {
    let mut config = load_launch_config(config_path)?;
    settings.apply(&mut config);

    let executable = executable
        .or_else(|| config.runtime_executable.clone())
        .context("no executable: pass --executable or set runtimeExecutable")?;

    let launcher = platform.map_or_else(SubprocessLauncher::new, SubprocessLauncher::with_platform);
    if !launcher.can_launch(&config) {
        bail!(
            "console mode {:?} is not supported by the {} launcher",
            config.console,
            launcher.name()
        );
    }

    let (sink, mut events) = ChannelSink::new();
    let context = LaunchContext::new(Arc::new(sink));
    let launched = launcher.launch(&executable, &config, &context).await;
    // The router keeps its own handle on the sink; dropping ours lets the
    // event stream end once routing finishes.
    drop(context);

    let print_events = async {
        let mut stdout = std::io::stdout().lock();
        while let Some(event) = events.next().await {
            print_event(&mut stdout, &event)?;
        }
        Ok::<(), anyhow::Error>(())
    };

    let process = match launched {
        Ok(process) => process,
        Err(e) => {
            // Flush the console echo emitted before the failure.
            print_events.await?;
            return Err(e).with_context(|| format!("failed to launch {executable}"));
        }
    };

    let supervise = async move {
        tokio::select! {
            _ = process.wait() => {}
            _ = tokio::signal::ctrl_c() => {
                info!(pid = ?process.pid(), "interrupt received, stopping program");
                process.kill();
            }
        }
        process.join().await
    };

    let (exit, printed) = tokio::join!(supervise, print_events);
    printed?;

    info!(?exit, "program finished");
    Ok(exit_code(exit))
}
