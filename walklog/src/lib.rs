//! Walklog - GPS walk recording and explored-area tracking
//!
//! This library records walks from a stream of device position fixes,
//! measures their great-circle length and elapsed time, and derives the
//! slippy-map tiles they crossed so explored areas can be accumulated.
//!
//! # Modules
//!
//! - [`coord`]: haversine distance and tile keys
//! - [`walk`]: session state machine, location provider boundary and the
//!   async [`walk::WalkTracker`]
//! - [`record`]: persisted walk records and stores
//! - [`config`]: tracker configuration and the INI config file
//! - [`format`]: human-readable distance and duration
//! - [`logging`]: tracing subscriber setup

pub mod config;
pub mod coord;
pub mod format;
pub mod logging;
pub mod record;
pub mod walk;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
