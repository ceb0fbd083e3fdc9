//! fetchflow - retry, timeout and cancellation playground
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use fetchflow::OutputMode;
use fetchflow_app::config::{self, Settings};
use fetchflow_app::{LoadKind, UiState};
use fetchflow_core::logging;

/// fetchflow - load data from an unreliable backend with retries, timeouts
/// and cancellation
#[derive(Parser, Debug)]
#[command(name = "fetchflow")]
#[command(about = "Load data from a simulated unreliable backend", long_about = None)]
struct Args {
    /// Directory holding `.fetchflow/config.toml` (defaults to the current directory)
    #[arg(long, value_name = "PATH")]
    config_dir: Option<PathBuf>,

    /// Emit NDJSON events instead of text
    #[arg(long)]
    headless: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stable users endpoint, no retry or timeout
    Normal,
    /// Unstable users endpoint with automatic retries
    Retry,
    /// Slow users endpoint bounded by a time limit
    Timeout {
        /// Time limit in milliseconds (defaults to `timeout.limit_ms`)
        #[arg(long)]
        limit_ms: Option<u64>,
    },
    /// Users and products concurrently
    Parallel,
    /// Products endpoint
    Products,
    /// Search users by name or email
    Search {
        /// Case-insensitive substring; empty returns everyone
        #[arg(default_value = "")]
        query: String,
    },
    /// Write a default `.fetchflow/config.toml`
    Init,
}

impl Command {
    fn load_kind(&self, settings: &Settings) -> Option<LoadKind> {
        let kind = match self {
            Command::Normal => LoadKind::Normal,
            Command::Retry => LoadKind::WithRetry,
            Command::Timeout { limit_ms } => LoadKind::WithTimeout(
                limit_ms.map_or_else(|| settings.timeout.limit(), Duration::from_millis),
            ),
            Command::Parallel => LoadKind::Parallel,
            Command::Products => LoadKind::Products,
            Command::Search { query } => LoadKind::Search(query.clone()),
            Command::Init => return None,
        };
        Some(kind)
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Err(e) = logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let project_path = args
        .config_dir
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let settings = config::load_settings(&project_path);
    let Some(kind) = args.command.load_kind(&settings) else {
        let path = fetchflow::init(&project_path)?;
        eprintln!("✅ Wrote {}", path.display());
        return Ok(());
    };

    let mode = if args.headless {
        OutputMode::Headless
    } else {
        OutputMode::Text
    };

    let final_state = fetchflow::run(&settings, kind, mode).await?;
    if matches!(final_state, UiState::Error(_)) {
        std::process::exit(1);
    }
    Ok(())
}
