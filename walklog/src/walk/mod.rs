//! Walk tracking.
//!
//! This module records a walk from a stream of device position fixes:
//!
//! - [`WalkSession`]: synchronous state machine holding the path, elapsed
//!   time and last error of one session
//! - [`LocationProvider`]: boundary to the device location services
//! - [`WalkTracker`]: async driver that subscribes to a provider, ticks the
//!   elapsed counter and publishes [`TrackerSnapshot`]s
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──start──► Tracking ──stop──► Stopped ──start──► Tracking
//!   ▲                                   │
//!   └───────────────clear───────────────┘
//! ```
//!
//! Provider errors and per-fix timeouts are recorded in `last_error` but never
//! stop a session. Only a missing location capability prevents one from
//! starting.

mod error;
mod model;
mod path;
mod policy;
mod provider;
mod session;
mod tracker;

pub use error::{LocationError, TrackerError};
pub use model::{PositionSample, SessionState, TrackerSnapshot, WalkSummary};
pub use path::WalkPath;
pub use policy::AcceptancePolicy;
pub use provider::{
    BoxFuture, ChannelLocationProvider, FixEvent, FixSubscription, LocationProvider,
    WatchOptions, DEFAULT_FIX_TIMEOUT,
};
pub use session::{FixOutcome, WalkSession};
pub use tracker::{WalkTracker, TICK_INTERVAL};
