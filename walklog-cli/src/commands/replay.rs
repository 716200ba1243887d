//! Replay recorded fixes through a live tracker.
//!
//! Reads a JSON array of samples:
//!
//! ```json
//! [
//!   { "latitude": 35.6812, "longitude": 139.7671, "captured_at_ms": 1714552200000 },
//!   { "latitude": 35.6821, "longitude": 139.7671, "captured_at_ms": 1714552205000 }
//! ]
//! ```
//!
//! Fixes are fed to a [`WalkTracker`] one per `--interval-ms`, so elapsed time
//! is measured exactly as it would be on a device.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Args;
use tracing::{info, warn};
use walklog::config::TrackerConfig;
use walklog::format::{format_distance, format_duration};
use walklog::record::{JsonDirWalkStore, WalkRecord, WalkStore};
use walklog::walk::{ChannelLocationProvider, PositionSample, WalkSummary, WalkTracker};

use crate::error::CliError;

/// How long to wait for the tracker to take in the last fixes.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Arguments for the `replay` command.
#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// JSON file containing an array of fixes
    pub input: PathBuf,

    /// Delay between fixes in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,

    /// Save the walk and its explored tiles to this directory
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Tile zoom level (defaults to the configured tile zoom)
    #[arg(long, short)]
    pub zoom: Option<u8>,
}

/// Run the replay command.
pub fn run(args: ReplayArgs, config: &TrackerConfig) -> Result<(), CliError> {
    let samples = load_samples(&args.input)?;
    let zoom = args.zoom.unwrap_or(config.tile_zoom);
    let interval = Duration::from_millis(args.interval_ms);

    info!(
        input = %args.input.display(),
        fixes = samples.len(),
        interval_ms = args.interval_ms,
        "Replaying walk"
    );

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    let summary = runtime.block_on(replay_walk(samples, interval, config.clone()))?;

    let record = WalkRecord::from_summary(&summary, Utc::now(), zoom);
    print_summary(&summary, &record, zoom);

    if let Some(output) = args.output {
        let store = JsonDirWalkStore::open(&output)?;
        let id = store.save_walk(&record)?;
        let added = store.upsert_explored_tiles(&record.tile_keys)?;

        println!();
        println!("Saved walk {} to {}", id, store.walk_path(&id).display());
        println!(
            "Newly explored tiles: {} (total {})",
            added,
            store.explored_tiles()?.len()
        );
    }

    Ok(())
}

/// Read fixes from a JSON file.
pub fn load_samples(path: &Path) -> Result<Vec<PositionSample>, CliError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::Input(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| CliError::Input(format!("{}: {}", path.display(), e)))
}

/// Feed `samples` through a tracker and return the stopped walk.
pub async fn replay_walk(
    samples: Vec<PositionSample>,
    interval: Duration,
    config: TrackerConfig,
) -> Result<WalkSummary, CliError> {
    let provider = Arc::new(ChannelLocationProvider::new());
    let tracker = WalkTracker::new(provider.clone(), config);
    let mut snapshots = tracker.subscribe();

    tracker.start()?;

    let expected = samples.len();
    for (i, sample) in samples.into_iter().enumerate() {
        if i > 0 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        provider.push_fix(sample);
    }

    // Every fix is either on the path or counted as rejected once processed
    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        snapshots
            .wait_for(|s| s.path.len() + s.rejected_fixes as usize >= expected)
            .await
            .map(|_| ())
    })
    .await;
    if !matches!(drained, Ok(Ok(()))) {
        warn!(expected, "Tracker did not take in every fix before stopping");
    }

    // Stop only fails to yield a summary if the session never started
    tracker
        .stop()
        .ok_or_else(|| CliError::Input("walk was not tracking".to_string()))
}

fn print_summary(summary: &WalkSummary, record: &WalkRecord, zoom: u8) {
    println!("Walk Summary");
    println!("============");
    println!();
    println!("  Samples:   {}", summary.sample_count());
    println!("  Distance:  {}", format_distance(summary.distance_m));
    println!("  Duration:  {}", format_duration(summary.elapsed_secs));
    println!("  Tiles:     {} (zoom {})", record.tile_keys.len(), zoom);
}
