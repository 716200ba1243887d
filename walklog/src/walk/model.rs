//! Core data types for walk tracking.
//!
//! Samples are what the device reported; distance and tiles are always
//! derived from them, never stored alongside.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coord::{haversine_distance, TileKey};

use super::error::LocationError;
use super::path::WalkPath;

/// A single position fix delivered by the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// When the fix was captured, in epoch milliseconds.
    pub captured_at_ms: i64,
}

impl PositionSample {
    /// Create a new position sample.
    pub fn new(latitude: f64, longitude: f64, captured_at_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            captured_at_ms,
        }
    }

    /// Create a position sample stamped with the current wall-clock time.
    pub fn now(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude, chrono::Utc::now().timestamp_millis())
    }

    /// Great-circle distance to another sample in meters.
    pub fn distance_to(&self, other: &PositionSample) -> f64 {
        haversine_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }

    /// `[longitude, latitude]` pair as used by GeoJSON geometries.
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// Lifecycle state of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// No session has been started, or the last one was cleared.
    #[default]
    Idle,
    /// Fixes and elapsed time are being recorded.
    Tracking,
    /// The session was stopped; its results are frozen.
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Tracking => write!(f, "tracking"),
            SessionState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Point-in-time copy of the tracker state published to observers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerSnapshot {
    /// Session lifecycle state.
    pub state: SessionState,
    /// Most recent fix received, accepted or not.
    pub current_position: Option<PositionSample>,
    /// Accepted fixes in delivery order.
    pub path: Vec<PositionSample>,
    /// Cumulative distance of `path` in meters.
    pub distance_m: f64,
    /// Whole seconds elapsed since the session started.
    pub elapsed_secs: u64,
    /// Session start time in epoch milliseconds.
    pub started_at_ms: Option<i64>,
    /// Most recent provider error, if any.
    pub last_error: Option<LocationError>,
    /// Fixes dropped by the acceptance policy.
    pub rejected_fixes: u64,
}

impl TrackerSnapshot {
    /// Whether the snapshot was taken while tracking.
    pub fn is_tracking(&self) -> bool {
        self.state == SessionState::Tracking
    }
}

/// Frozen result of a stopped session.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkSummary {
    /// Accepted fixes in delivery order.
    pub path: WalkPath,
    /// Cumulative distance in meters.
    pub distance_m: f64,
    /// Whole seconds the session was tracking.
    pub elapsed_secs: u64,
    /// Session start time in epoch milliseconds.
    pub started_at_ms: i64,
}

impl WalkSummary {
    /// Number of recorded samples.
    pub fn sample_count(&self) -> usize {
        self.path.len()
    }

    /// Path as GeoJSON `[longitude, latitude]` coordinates.
    pub fn line_string_coordinates(&self) -> Vec<[f64; 2]> {
        self.path.line_string_coordinates()
    }

    /// Unique tiles visited at the given zoom level.
    pub fn explored_tiles(&self, zoom: u8) -> BTreeSet<TileKey> {
        self.path.explored_tiles(zoom)
    }
}
