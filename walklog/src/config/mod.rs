//! Configuration for walk tracking.
//!
//! [`TrackerConfig`] is the typed configuration injected into
//! [`crate::walk::WalkTracker`]. [`ConfigFile`] loads it, together with the
//! logging filter, from an INI file.

mod file;

pub use file::{config_file_path, ConfigError, ConfigFile};

use std::time::Duration;

use crate::coord::DEFAULT_TILE_ZOOM;
use crate::walk::{AcceptancePolicy, WatchOptions};

/// Default logging filter when neither the environment nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Configuration for a walk tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Options passed to the location provider's watch.
    pub watch: WatchOptions,

    /// Zoom level used to derive explored tiles.
    pub tile_zoom: u8,

    /// Which delivered fixes are appended to the path.
    pub acceptance: AcceptancePolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            watch: WatchOptions::default(),
            tile_zoom: DEFAULT_TILE_ZOOM,
            acceptance: AcceptancePolicy::AcceptAll,
        }
    }
}

impl TrackerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-fix timeout.
    pub fn with_fix_timeout(mut self, timeout: Duration) -> Self {
        self.watch.timeout = timeout;
        self
    }

    /// Set whether high-accuracy positioning is requested.
    pub fn with_high_accuracy(mut self, high_accuracy: bool) -> Self {
        self.watch.high_accuracy = high_accuracy;
        self
    }

    /// Set the maximum age of cached fixes.
    pub fn with_maximum_age(mut self, maximum_age: Duration) -> Self {
        self.watch.maximum_age = maximum_age;
        self
    }

    /// Set the explored-tile zoom level.
    pub fn with_tile_zoom(mut self, zoom: u8) -> Self {
        self.tile_zoom = zoom;
        self
    }

    /// Set the fix acceptance policy.
    pub fn with_acceptance(mut self, acceptance: AcceptancePolicy) -> Self {
        self.acceptance = acceptance;
        self
    }

    /// Per-fix timeout.
    pub fn fix_timeout(&self) -> Duration {
        self.watch.timeout
    }
}
