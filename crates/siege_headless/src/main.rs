//! Headless Grid Siege runner.
//!
//! This binary runs a match without graphics, controlled via JSON on stdin/stdout.
//! Designed for scripted play and CI testing.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p siege_headless
//!
//! # Run a scenario, reading commands from a file
//! cargo run -p siege_headless -- run --scenario scenarios/raid.ron --commands script.jsonl
//!
//! # Validate a scenario's formations
//! cargo run -p siege_headless -- check --scenario scenarios/standard.ron
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use siege_headless::{HeadlessConfig, HeadlessRunner, Response, Scenario, ScenarioError};

#[derive(Parser)]
#[command(name = "siege_headless")]
#[command(about = "Headless Grid Siege runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single match
    Run {
        /// Scenario file to load (standard mirror match if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Read commands from this file instead of stdin
        #[arg(short, long)]
        commands: Option<PathBuf>,

        /// Output state after every turn
        #[arg(long)]
        auto_state: bool,
    },

    /// Validate a scenario's formations without playing
    Check {
        /// Scenario file to check
        #[arg(short, long)]
        scenario: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Some(Commands::Run {
            scenario,
            commands,
            auto_state,
        }) => cmd_run(scenario.as_deref(), commands.as_deref(), auto_state),
        Some(Commands::Check { scenario }) => cmd_check(&scenario),
        None => {
            // Default: interactive mode
            cmd_run(None, None, false)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Headless run failed");
            emit(&Response::error(e.to_string(), None));
            ExitCode::FAILURE
        }
    }
}

fn load_scenario(path: Option<&Path>) -> Result<Scenario, ScenarioError> {
    path.map_or_else(|| Ok(Scenario::standard()), Scenario::load)
}

fn emit(response: &Response) {
    let mut stdout = io::stdout().lock();
    let _ = stdout.write_all(response.to_json_line().as_bytes());
    let _ = stdout.flush();
}

/// Run a single match.
fn cmd_run(
    scenario: Option<&Path>,
    commands: Option<&Path>,
    auto_state: bool,
) -> Result<ExitCode, ScenarioError> {
    let scenario = load_scenario(scenario)?;
    tracing::info!(scenario = %scenario.name, "Starting headless session");

    let config = HeadlessConfig {
        auto_state_output: auto_state,
    };
    let input: Box<dyn BufRead> = match commands {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };

    let mut runner = HeadlessRunner::from_scenario(&scenario, config, input, io::stdout().lock())?;
    let summary = runner.run()?;
    tracing::debug!(?summary, outcome = %runner.game().outcome(), "Session summary");
    Ok(ExitCode::SUCCESS)
}

/// Validate both formations of a scenario.
fn cmd_check(path: &Path) -> Result<ExitCode, ScenarioError> {
    let scenario = Scenario::load(path)?;
    let mut all_valid = true;
    for (faction, report) in scenario.check() {
        all_valid &= report.is_valid();
        for message in &report.messages {
            tracing::warn!(faction = faction.short_name(), "{message}");
        }
        emit(&Response::report(faction, report));
    }

    if all_valid {
        tracing::info!(scenario = %scenario.name, "Formations valid");
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
