mod config;
mod normalize_cmd;
mod run_cmd;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};

use launchpad_core::{OutputCapture, Platform};

use config::Settings;

#[derive(Parser)]
#[command(name = "launchpad", about = "Launch debuggable programs with routed stdio")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch a program described by a launch configuration file
    Run {
        /// Launch configuration (TOML, or JSON when the name ends in .json)
        config: PathBuf,
        /// Runtime executable (overrides runtimeExecutable in the file)
        #[arg(long)]
        executable: Option<String>,
        /// Output routing: console (discard after attach) or std (capture)
        #[arg(long, value_parser = config::parse_output_capture)]
        output_capture: Option<OutputCapture>,
        /// Platform rules for argument normalization (defaults to the host)
        #[arg(long)]
        platform: Option<Platform>,
    },
    /// Print the invocation a launch would use, without running it
    Normalize {
        /// Executable to invoke
        executable: String,
        /// Arguments passed to the executable
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
        /// Working directory for the invocation
        #[arg(long, default_value = ".")]
        cwd: PathBuf,
        /// Platform rules for argument normalization (defaults to the host)
        #[arg(long)]
        platform: Option<Platform>,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_output_capture = match &cli.command {
        Commands::Run { output_capture, .. } => *output_capture,
        _ => None,
    };
    let settings = Settings::resolve(cli_output_capture)?;

    // Events go to stdout as JSON lines; diagnostics stay on stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_filter)),
        )
        .init();

    match cli.command {
        Commands::Run {
            config,
            executable,
            platform,
            ..
        } => {
            let code = match run_cmd::run_launch(&config, executable, &settings, platform).await {
                Ok(code) => code,
                Err(e) => {
                    eprintln!("{e:#}");
                    1
                }
            };
            std::process::exit(code);
        }
        Commands::Normalize {
            executable,
            args,
            cwd,
            platform,
        } => {
            normalize_cmd::run_normalize(&executable, &args, &cwd, platform)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "launchpad",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
