//! Walk history commands: `walks` and `stats`.

use std::path::{Path, PathBuf};

use clap::Args;
use walklog::format::{format_distance, format_duration};
use walklog::record::{JsonDirWalkStore, WalkStore};

use crate::error::CliError;

/// Arguments for the `walks` command.
#[derive(Debug, Args)]
pub struct WalksArgs {
    /// Walk store directory (as written by `replay --output`)
    pub store: PathBuf,

    /// Number of walks to show
    #[arg(long, short = 'n', default_value_t = 10)]
    pub limit: usize,
}

/// Arguments for the `stats` command.
#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Walk store directory (as written by `replay --output`)
    pub store: PathBuf,
}

/// Open an existing store without creating it.
fn open_store(path: &Path) -> Result<JsonDirWalkStore, CliError> {
    if !path.is_dir() {
        return Err(CliError::NoStore(path.to_path_buf()));
    }
    Ok(JsonDirWalkStore::open(path)?)
}

/// List the most recent walks.
pub fn run_walks(args: WalksArgs) -> Result<(), CliError> {
    let store = open_store(&args.store)?;
    let walks = store.list_walks(args.limit)?;

    if walks.is_empty() {
        println!("No walks recorded yet.");
        return Ok(());
    }

    println!("Recent Walks");
    println!("============");
    println!();
    println!(
        "  {:<24} {:<17} {:>10} {:>10} {:>6}",
        "ID", "STARTED", "DISTANCE", "DURATION", "TILES"
    );
    for (id, walk) in &walks {
        println!(
            "  {:<24} {:<17} {:>10} {:>10} {:>6}",
            id.as_str(),
            walk.started_at.format("%Y-%m-%d %H:%M"),
            format_distance(walk.total_distance_m),
            format_duration(walk.total_time_sec),
            walk.tile_keys.len()
        );
    }
    Ok(())
}

/// Print totals over every stored walk.
pub fn run_stats(args: StatsArgs) -> Result<(), CliError> {
    let store = open_store(&args.store)?;
    let stats = store.stats()?;

    println!("Walk Statistics");
    println!("===============");
    println!();
    println!("  Walks:           {}", stats.walk_count);
    println!("  Total distance:  {}", format_distance(stats.total_distance_m));
    println!("  Explored tiles:  {}", stats.explored_tile_count);
    Ok(())
}
