//! End-to-end tests for the subprocess launcher.
//!
//! Each test writes a small shell script into a temp dir, launches it
//! through [`SubprocessLauncher`], and inspects the events that reach the
//! output sink.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use launchpad_core::{
    ChannelSink, ConsoleMode, KillBehavior, LaunchConfiguration, LaunchContext, LaunchError,
    OutputCapture, OutputCategory, OutputEvent, ProcessExit, ProgramLauncher, SubprocessLauncher,
};

// ===========================================================================
// Helpers
// ===========================================================================

/// Write an executable shell script and return its path.
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Launch `executable`, wait for it and its router, and collect every
/// event the sink received.
async fn run_to_completion(
    executable: &str,
    config: &LaunchConfiguration,
) -> (ProcessExit, Vec<OutputEvent>) {
    let (sink, stream) = ChannelSink::new();
    let context = LaunchContext::new(Arc::new(sink));

    let process = SubprocessLauncher::new()
        .launch(executable, config, &context)
        .await
        .expect("launch should return a process handle");
    drop(context);

    let exit = tokio::time::timeout(Duration::from_secs(10), process.join())
        .await
        .expect("process should finish within 10s");
    let events = stream.collect().await;
    (exit, events)
}

fn outputs(events: &[OutputEvent], category: OutputCategory) -> Vec<String> {
    events
        .iter()
        .filter(|e| e.category == category)
        .map(|e| e.output.clone())
        .collect()
}

// ===========================================================================
// Console echo
// ===========================================================================

#[tokio::test]
async fn echoes_command_line_first() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "quiet.sh", "exit 0");
    let config = LaunchConfiguration::new(tmp.path()).args(vec!["--flag".to_string()]);

    let (_, events) = run_to_completion(script.to_str().unwrap(), &config).await;

    assert_eq!(
        events[0],
        OutputEvent::console(format!("{} --flag\n", script.display()))
    );
}

// ===========================================================================
// Capture routing
// ===========================================================================

#[tokio::test]
async fn capture_routes_stdout_and_stderr_lines() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(
        tmp.path(),
        "chatty.sh",
        "echo out-1\necho err-1 >&2\necho out-2\nprintf tail",
    );
    let config = LaunchConfiguration::new(tmp.path()).output_capture(OutputCapture::Std);

    let (exit, events) = run_to_completion(script.to_str().unwrap(), &config).await;

    assert_eq!(exit, ProcessExit::Exited { code: Some(0) });
    assert_eq!(
        outputs(&events, OutputCategory::Stdout),
        vec!["out-1\n", "out-2\n", "tail"]
    );
    assert_eq!(outputs(&events, OutputCategory::Stderr), vec!["err-1\n"]);
}

#[tokio::test]
async fn capture_does_not_report_exit_code() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "fail.sh", "exit 3");
    let config = LaunchConfiguration::new(tmp.path()).output_capture(OutputCapture::Std);

    let (exit, events) = run_to_completion(script.to_str().unwrap(), &config).await;

    assert_eq!(exit.code(), Some(3));
    assert!(outputs(&events, OutputCategory::Stderr).is_empty());
}

// ===========================================================================
// Discard routing
// ===========================================================================

#[tokio::test]
async fn discard_surfaces_early_stderr_on_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(
        tmp.path(),
        "crash.sh",
        "echo 'ignored stdout'\necho 'Error: Cannot find module' >&2\nexit 1",
    );
    let config = LaunchConfiguration::new(tmp.path());

    let (exit, events) = run_to_completion(script.to_str().unwrap(), &config).await;

    assert_eq!(exit.code(), Some(1));
    assert!(outputs(&events, OutputCategory::Stdout).is_empty());
    assert_eq!(
        outputs(&events, OutputCategory::Stderr),
        vec!["Error: Cannot find module\n", "Process exited with code 1\r\n"]
    );
}

#[tokio::test]
async fn discard_is_silent_on_success() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(
        tmp.path(),
        "ok.sh",
        "echo hello\necho 'a warning' >&2\nexit 0",
    );
    let config = LaunchConfiguration::new(tmp.path());

    let (exit, events) = run_to_completion(script.to_str().unwrap(), &config).await;

    assert!(exit.success());
    assert_eq!(events.len(), 1, "only the console echo expected: {events:?}");
    assert_eq!(events[0].category, OutputCategory::Console);
}

#[tokio::test]
async fn discard_drops_everything_after_attach() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(
        tmp.path(),
        "attached.sh",
        "echo 'Debugger listening' >&2\nsleep 0.1\necho 'Debugger attached.' >&2\nsleep 0.1\necho 'late noise' >&2\nexit 2",
    );
    let config = LaunchConfiguration::new(tmp.path());

    let (exit, events) = run_to_completion(script.to_str().unwrap(), &config).await;

    assert_eq!(exit.code(), Some(2));
    assert_eq!(
        outputs(&events, OutputCategory::Stderr),
        vec!["Process exited with code 2\r\n"]
    );
}

#[tokio::test]
async fn discard_does_not_stall_on_large_stdout() {
    let tmp = tempfile::tempdir().unwrap();
    // Far more than a pipe buffer; the child blocks forever if stdout is
    // not drained.
    let script = write_script(
        tmp.path(),
        "flood.sh",
        "i=0\nwhile [ $i -lt 20000 ]; do echo 'xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx'; i=$((i+1)); done",
    );
    let config = LaunchConfiguration::new(tmp.path());

    let (exit, _) = run_to_completion(script.to_str().unwrap(), &config).await;
    assert!(exit.success());
}

// ===========================================================================
// Spawn and environment
// ===========================================================================

#[tokio::test]
async fn missing_executable_reports_error_event() {
    let tmp = tempfile::tempdir().unwrap();
    let config = LaunchConfiguration::new(tmp.path());

    let (exit, events) =
        run_to_completion("/nonexistent/path/to/runtime", &config).await;

    assert_eq!(exit, ProcessExit::Failed);
    let stderr = outputs(&events, OutputCategory::Stderr);
    assert_eq!(stderr.len(), 1, "expected exactly one error event: {events:?}");
    assert!(
        stderr[0].contains("failed to spawn /nonexistent/path/to/runtime"),
        "unexpected error text: {}",
        stderr[0]
    );
}

#[tokio::test]
async fn invalid_cwd_fails_the_launch() {
    let (sink, _stream) = ChannelSink::new();
    let context = LaunchContext::new(Arc::new(sink));
    let config = LaunchConfiguration::new("/nonexistent/launchpad/cwd");

    let result = SubprocessLauncher::new().launch("true", &config, &context).await;

    assert!(matches!(result, Err(LaunchError::WorkingDirectory { .. })));
}

#[tokio::test]
async fn terminal_console_is_rejected() {
    let (sink, _stream) = ChannelSink::new();
    let context = LaunchContext::new(Arc::new(sink));
    let config = LaunchConfiguration::new("/tmp").console(ConsoleMode::ExternalTerminal);

    let result = SubprocessLauncher::new().launch("true", &config, &context).await;

    assert!(matches!(result, Err(LaunchError::UnsupportedConsole { .. })));
}

#[tokio::test]
async fn runs_in_working_directory_with_env_overrides() {
    let tmp = tempfile::tempdir().unwrap();
    let work_dir = tmp.path().join("workdir");
    std::fs::create_dir(&work_dir).unwrap();
    let script = write_script(
        tmp.path(),
        "env.sh",
        "pwd\necho \"token=$LAUNCHPAD_TEST_TOKEN\"\necho \"home=${HOME:-unset}\"",
    );
    let config = LaunchConfiguration::new(&work_dir)
        .output_capture(OutputCapture::Std)
        .env("LAUNCHPAD_TEST_TOKEN", Some("abc123".to_string()))
        .env("HOME", None);

    let (_, events) = run_to_completion(script.to_str().unwrap(), &config).await;
    let stdout = outputs(&events, OutputCategory::Stdout);

    let reported = PathBuf::from(stdout[0].trim_end());
    assert_eq!(
        reported.canonicalize().unwrap(),
        work_dir.canonicalize().unwrap()
    );
    assert_eq!(stdout[1], "token=abc123\n");
    assert_eq!(stdout[2], "home=unset\n");
}

#[tokio::test]
async fn expanded_args_reach_the_program() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "args.sh", "for a in \"$@\"; do echo \"[$a]\"; done");
    let config = LaunchConfiguration::new(tmp.path())
        .output_capture(OutputCapture::Std)
        .runtime_args(vec!["--runtime".to_string()])
        .program("main.js")
        .args(vec!["has space".to_string()]);

    let (_, events) = run_to_completion(script.to_str().unwrap(), &config).await;

    assert_eq!(
        outputs(&events, OutputCategory::Stdout),
        vec!["[--runtime]\n", "[main.js]\n", "[has space]\n"]
    );
}

// ===========================================================================
// Process wrapper
// ===========================================================================

#[tokio::test]
async fn kill_terminates_long_running_process() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "sleepy.sh", "exec sleep 3600");
    let (sink, _stream) = ChannelSink::new();
    let context = LaunchContext::new(Arc::new(sink));
    let config = LaunchConfiguration::new(tmp.path()).kill_behavior(KillBehavior::Polite);

    let process = SubprocessLauncher::new()
        .launch(script.to_str().unwrap(), &config, &context)
        .await
        .unwrap();
    assert!(process.pid().is_some());
    assert_eq!(process.kill_behavior(), KillBehavior::Polite);
    assert!(!process.has_exited());

    process.kill();
    let exit = tokio::time::timeout(Duration::from_secs(5), process.wait())
        .await
        .expect("process should exit after kill");

    // Terminated by SIGTERM: no exit code.
    assert_eq!(exit, ProcessExit::Exited { code: None });
    assert!(process.has_exited());
}
