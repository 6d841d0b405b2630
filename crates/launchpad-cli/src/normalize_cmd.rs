//! `launchpad normalize` command: print the normalized invocation as JSON.

use std::path::Path;

use anyhow::{Context, Result};

use launchpad_core::{InvocationTuple, Platform, format_arguments};

pub fn normalize(
    executable: &str,
    args: &[String],
    cwd: &Path,
    platform: Option<Platform>,
) -> InvocationTuple {
    format_arguments(
        executable,
        args,
        cwd,
        platform.unwrap_or_else(Platform::current),
    )
}

pub fn run_normalize(
    executable: &str,
    args: &[String],
    cwd: &Path,
    platform: Option<Platform>,
) -> Result<()> {
    let invocation = normalize(executable, args, cwd, platform);
    let json = serde_json::to_string_pretty(&invocation)
        .context("failed to serialize invocation")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_rules_quote_spaced_arguments() {
        let invocation = normalize(
            "c:/Program Files/nodejs/node.exe",
            &["--inspect".to_string(), "my app.js".to_string()],
            Path::new("c:/work"),
            Some(Platform::Windows),
        );
        assert!(invocation.shell);
        assert_eq!(invocation.executable, "\"C:\\Program Files\\nodejs\\node.exe\"");
        assert_eq!(invocation.args, vec!["--inspect", "\"my app.js\""]);
    }

    #[test]
    fn unix_rules_pass_through() {
        let args = vec!["has space".to_string()];
        let invocation = normalize("/usr/bin/node", &args, Path::new("/srv"), Some(Platform::Unix));
        assert!(!invocation.shell);
        assert_eq!(invocation.executable, "/usr/bin/node");
        assert_eq!(invocation.args, args);
    }
}
