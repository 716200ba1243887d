//! Coordinate utility commands: `distance` and `tile`.

use clap::Args;
use walklog::coord::{haversine_distance, tile_center, to_tile_key, MAX_MERCATOR_LAT};
use walklog::format::format_distance;

use crate::error::CliError;

/// Arguments for the `distance` command.
#[derive(Debug, Args)]
pub struct DistanceArgs {
    /// Latitude of the first point
    #[arg(allow_negative_numbers = true)]
    pub lat1: f64,
    /// Longitude of the first point
    #[arg(allow_negative_numbers = true)]
    pub lon1: f64,
    /// Latitude of the second point
    #[arg(allow_negative_numbers = true)]
    pub lat2: f64,
    /// Longitude of the second point
    #[arg(allow_negative_numbers = true)]
    pub lon2: f64,
}

/// Arguments for the `tile` command.
#[derive(Debug, Args)]
pub struct TileArgs {
    /// Latitude in degrees
    #[arg(allow_negative_numbers = true)]
    pub lat: f64,
    /// Longitude in degrees
    #[arg(allow_negative_numbers = true)]
    pub lon: f64,
    /// Zoom level (defaults to the configured tile zoom)
    #[arg(long, short)]
    pub zoom: Option<u8>,
}

/// Print the great-circle distance between two points.
pub fn run_distance(args: DistanceArgs) -> Result<(), CliError> {
    let meters = haversine_distance(args.lat1, args.lon1, args.lat2, args.lon2);
    println!("{} ({:.3} m)", format_distance(meters), meters);
    Ok(())
}

/// Print the tile key containing a point.
pub fn run_tile(args: TileArgs, default_zoom: u8) -> Result<(), CliError> {
    let zoom = args.zoom.unwrap_or(default_zoom);
    let key = to_tile_key(args.lat, args.lon, zoom);
    println!("{}", key);

    if key.is_within_bounds() {
        let (lat, lon) = tile_center(&key);
        println!("  center: {:.6}, {:.6}", lat, lon);
    } else {
        println!(
            "  outside the tile grid (latitude limit is ±{:.4})",
            MAX_MERCATOR_LAT
        );
    }
    Ok(())
}
