//! Persisted walk records.
//!
//! A stopped session becomes a [`WalkRecord`]: timestamps, totals, the route
//! as a GeoJSON `LineString` and the unique tiles it crossed. Records are
//! written through a [`WalkStore`].

mod store;

pub use store::{
    JsonDirWalkStore, MemoryWalkStore, StoreError, WalkId, WalkStats, WalkStore,
};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::coord::TileKey;
use crate::walk::WalkSummary;

/// GeoJSON `LineString` geometry.
///
/// Coordinates are `[longitude, latitude]` pairs in path order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<[f64; 2]>,
}

impl LineString {
    /// Create a line string from `[longitude, latitude]` pairs.
    pub fn new(coordinates: Vec<[f64; 2]>) -> Self {
        Self {
            kind: "LineString".to_string(),
            coordinates,
        }
    }
}

/// A completed walk, ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkRecord {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub total_distance_m: f64,
    pub total_time_sec: u64,
    pub route_geojson: LineString,
    /// Unique tiles crossed by the route, sorted.
    pub tile_keys: Vec<TileKey>,
}

impl WalkRecord {
    /// Build a record from the summary of a stopped session.
    ///
    /// Tiles are derived from every recorded sample at `zoom`.
    pub fn from_summary(summary: &WalkSummary, ended_at: DateTime<Utc>, zoom: u8) -> Self {
        let started_at = Utc
            .timestamp_millis_opt(summary.started_at_ms)
            .single()
            .unwrap_or(ended_at);

        Self {
            started_at,
            ended_at,
            total_distance_m: summary.distance_m,
            total_time_sec: summary.elapsed_secs,
            route_geojson: LineString::new(summary.line_string_coordinates()),
            tile_keys: summary.explored_tiles(zoom).into_iter().collect(),
        }
    }

    /// Number of points in the route.
    pub fn point_count(&self) -> usize {
        self.route_geojson.coordinates.len()
    }
}
