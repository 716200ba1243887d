//! Error types for walk tracking.

use std::time::Duration;

use thiserror::Error;

/// Errors reported by the device location provider.
///
/// These are surfaced through the tracker's `last_error` field. Only
/// [`LocationError::Unsupported`] prevents a session from starting; the others
/// are recorded while tracking continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// Location services are not present on this device.
    #[error("Location services are not supported on this device")]
    Unsupported,

    /// The user denied or revoked the location permission.
    #[error("Location permission denied: {0}")]
    PermissionDenied(String),

    /// The provider could not determine a position (signal lost, etc.).
    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    /// No fix arrived within the configured bound.
    #[error("No position fix within {0:?}")]
    Timeout(Duration),
}

impl LocationError {
    /// Whether this error blocks a session from starting.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LocationError::Unsupported)
    }
}

/// Rejected tracker requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// The location capability is missing; the session stays idle.
    #[error("Location services are unavailable")]
    Unavailable,

    /// `start` was called while a session is already tracking.
    #[error("A walk is already being tracked")]
    AlreadyTracking,

    /// `start` was called outside a Tokio runtime.
    #[error("Walk tracking requires a Tokio runtime")]
    NoRuntime,
}
