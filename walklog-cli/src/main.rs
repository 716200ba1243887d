//! Walklog CLI - Command-line interface
//!
//! Replays recorded GPS fixes through the walk tracker and exposes the
//! coordinate helpers of the `walklog` library.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use walklog::config::ConfigFile;
use walklog::logging::init_logging;

use commands::config::ConfigCommands;
use commands::geo::{DistanceArgs, TileArgs};
use commands::history::{StatsArgs, WalksArgs};
use commands::replay::ReplayArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "walklog", version, about = "Record, replay and summarise GPS walks")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a JSON file of fixes through the tracker
    Replay(ReplayArgs),

    /// Great-circle distance between two points
    Distance(DistanceArgs),

    /// Tile key containing a point
    Tile(TileArgs),

    /// List the most recent stored walks
    Walks(WalksArgs),

    /// Totals over every stored walk
    Stats(StatsArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = ConfigFile::load(cli.config.as_deref())?;

    let filter = if cli.verbose {
        "walklog=debug,info"
    } else {
        config.log_filter.as_str()
    };
    let log_file = cli.log_file.as_deref().or(config.log_file.as_deref());
    let _log_guard = init_logging(filter, log_file)?;

    match cli.command {
        Commands::Replay(args) => commands::replay::run(args, &config.tracker),
        Commands::Distance(args) => commands::geo::run_distance(args),
        Commands::Tile(args) => commands::geo::run_tile(args, config.tracker.tile_zoom),
        Commands::Walks(args) => commands::history::run_walks(args),
        Commands::Stats(args) => commands::history::run_stats(args),
        Commands::Config(command) => commands::config::run(command, cli.config.as_deref()),
    }
}
