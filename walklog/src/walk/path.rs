//! Walk path history and distance calculation.
//!
//! The path is append-only while a session is tracking and keeps fixes in
//! delivery order. Cumulative distance is recomputed from the full path on
//! every read, so a mid-session read always agrees with the samples recorded
//! so far.

use std::collections::BTreeSet;

use crate::coord::{explored_tiles, TileKey};

use super::model::PositionSample;

/// Ordered sequence of accepted position samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkPath {
    samples: Vec<PositionSample>,
}

impl WalkPath {
    /// Create an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample. Samples are never reordered.
    pub fn push(&mut self, sample: PositionSample) {
        self.samples.push(sample);
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the path has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recently appended sample.
    pub fn last(&self) -> Option<&PositionSample> {
        self.samples.last()
    }

    /// All samples, oldest first.
    pub fn samples(&self) -> &[PositionSample] {
        &self.samples
    }

    /// Remove all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Sum of great-circle distances between consecutive samples in meters.
    ///
    /// Paths with fewer than two samples have zero length.
    pub fn total_distance_m(&self) -> f64 {
        self.samples
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum()
    }

    /// Path as GeoJSON `[longitude, latitude]` coordinates.
    pub fn line_string_coordinates(&self) -> Vec<[f64; 2]> {
        self.samples.iter().map(PositionSample::lon_lat).collect()
    }

    /// Unique tiles visited at the given zoom level.
    pub fn explored_tiles(&self, zoom: u8) -> BTreeSet<TileKey> {
        explored_tiles(
            self.samples.iter().map(|s| (s.latitude, s.longitude)),
            zoom,
        )
    }
}

impl From<Vec<PositionSample>> for WalkPath {
    fn from(samples: Vec<PositionSample>) -> Self {
        Self { samples }
    }
}

impl From<WalkPath> for Vec<PositionSample> {
    fn from(path: WalkPath) -> Self {
        path.samples
    }
}
