// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! svctag CLI - hardware warranty and entitlement lookups.
//!
//! # Examples
//!
//! ```bash
//! # Look up one service tag
//! svctag check ABC1234
//!
//! # JSON output
//! svctag check ABC1234 --format json --pretty
//!
//! # Batch lookup from a CSV inventory
//! svctag process assets.csv -o entitlements.csv --failures failed.csv
//!
//! # REST facade
//! svctag serve --port 5000
//!
//! # Show resolved configuration
//! svctag config show
//! ```

mod commands;
mod output;
mod server;

#[cfg(test)]
mod server_tests;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use svctag_core::{EntitlementError, FailureKind};
use svctag_fetch::FetchError;
use svctag_store::StoreError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{check, config, process, serve};

// ============================================================================
// CLI Definition
// ============================================================================

/// svctag CLI - warranty and entitlement lookups.
#[derive(Parser)]
#[command(name = "svctag")]
#[command(about = "Warranty and entitlement lookups for Dell service tags")]
#[command(long_about = r"
svctag looks up asset and warranty entitlement records for Dell service tags.

Credentials are read from DELL_API_CLIENT_ID and DELL_API_CLIENT_SECRET
(a .env file in the working directory is loaded first).

Examples:
  svctag check ABC1234                   # Single lookup
  svctag check ABC1234 --export out.csv  # Single lookup to CSV
  svctag process assets.csv              # Batch lookup
  svctag serve                           # REST facade
  svctag config show                     # Resolved configuration
")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: ./svctag.yaml, then the user config dir).
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (no logging, errors only).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Look up a single service tag.
    Check(check::CheckArgs),

    /// Look up every tag in a CSV file.
    #[command(visible_alias = "p")]
    Process(process::ProcessArgs),

    /// Run the REST facade.
    Serve(serve::ServeArgs),

    /// Inspect configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Malformed input.
    Validation = 2,
    /// Credentials missing or rejected.
    Auth = 3,
    /// Network failure.
    Transport = 4,
    /// Unknown service tag.
    NotFound = 5,
    /// Unexpected response shape.
    Parse = 6,
}

impl ExitCode {
    /// Picks the exit code for a failed command.
    pub fn for_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(e) = cause.downcast_ref::<EntitlementError>() {
                return Self::from(e.kind());
            }
            if let Some(StoreError::MissingCredential(_)) = cause.downcast_ref::<StoreError>() {
                return Self::Auth;
            }
            if let Some(FetchError::Auth(_)) = cause.downcast_ref::<FetchError>() {
                return Self::Auth;
            }
        }
        Self::Error
    }
}

impl From<FailureKind> for ExitCode {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Validation => Self::Validation,
            FailureKind::Auth => Self::Auth,
            FailureKind::Transport => Self::Transport,
            FailureKind::NotFound => Self::NotFound,
            FailureKind::Parse => Self::Parse,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

/// Crates whose events are shown.
const LOG_TARGETS: &[&str] = &[
    "svctag",
    "svctag_core",
    "svctag_fetch",
    "svctag_providers",
    "svctag_store",
    "svctag_batch",
];

fn log_directives(level: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new(format!("{},tower_http=debug,info", log_directives("debug")))
    } else {
        EnvFilter::new(log_directives("warn"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);
    svctag_store::load_dotenv();

    let result = match &cli.command {
        Commands::Check(args) => check::run(args, &cli).await,
        Commands::Process(args) => process::run(args, &cli).await,
        Commands::Serve(args) => serve::run(args, &cli).await,
        Commands::Config(args) => config::run(args, &cli),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(ExitCode::for_error(&e) as i32);
    }
}
