//! # tce CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tce_cli::dry_run::{run_dry_run, DryRunArgs};
use tce_cli::rules::{run_rules, RulesArgs};

/// Training Compliance Engine admin tool.
///
/// Lints rule documents and replays status transitions of dossier fixtures
/// through the engine without a database.
#[derive(Parser, Debug)]
#[command(name = "tce", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check or list declarative rule documents.
    Rules(RulesArgs),

    /// Validate a dossier transition in memory.
    DryRun(DryRunArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Rules(args) => run_rules(&args),
        Commands::DryRun(args) => run_dry_run(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
