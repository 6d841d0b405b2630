//! Argument normalization: turn (executable, args, cwd) into the exact
//! invocation handed to the OS.
//!
//! Off Windows this is a pass-through. On Windows three things happen:
//! paths are rewritten to the native form, `.ps1` scripts are routed through
//! `powershell.exe`, and quoting plus shell mode is applied when both the
//! executable path and at least one argument contain a space. Shell mode stays
//! off when only the executable has a space: `cmd.exe` mis-parses a quoted
//! executable with no quoted arguments.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::platform::Platform;

/// Fully resolved invocation ready for process creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationTuple {
    pub executable: String,
    pub args: Vec<String>,
    /// Run the joined command line through the platform shell.
    pub shell: bool,
    pub cwd: PathBuf,
}

impl InvocationTuple {
    /// The executable and arguments joined with single spaces.
    ///
    /// This is the command line a shell sees when `shell` is set, and the
    /// text echoed to the console before launching.
    pub fn command_line(&self) -> String {
        std::iter::once(self.executable.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Normalize an invocation for `platform`.
///
/// Total over its input: every combination yields a tuple.
pub fn format_arguments(
    executable: &str,
    args: &[String],
    cwd: &Path,
    platform: Platform,
) -> InvocationTuple {
    let mut executable = executable.to_string();
    let mut args = args.to_vec();
    let mut cwd = cwd.to_path_buf();

    if platform.is_windows() {
        executable = fix_drive_letter_and_slashes(&executable);
        cwd = PathBuf::from(fix_drive_letter_and_slashes(&cwd.to_string_lossy()));

        if executable.ends_with(".ps1") {
            args.splice(0..0, ["-File".to_string(), executable]);
            executable = "powershell.exe".to_string();
        }
    }

    if !platform.is_windows() || !executable.contains(' ') {
        return InvocationTuple {
            executable,
            args,
            shell: false,
            cwd,
        };
    }

    let mut found_arg_with_space = false;
    let quoted: Vec<String> = args
        .iter()
        .map(|arg| {
            if arg.contains(' ') {
                found_arg_with_space = true;
                quote(arg)
            } else {
                arg.clone()
            }
        })
        .collect();

    if found_arg_with_space {
        InvocationTuple {
            executable: quote(&executable),
            args: quoted,
            shell: true,
            cwd,
        }
    } else {
        InvocationTuple {
            executable,
            args,
            shell: false,
            cwd,
        }
    }
}

fn quote(s: &str) -> String {
    format!("\"{s}\"")
}

/// Rewrite a Windows path to its native form: backslash separators and an
/// upper-case drive letter.
fn fix_drive_letter_and_slashes(path: &str) -> String {
    let mut fixed = path.replace('/', "\\");
    let bytes = fixed.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        fixed[..1].make_ascii_uppercase();
    }
    fixed
}
