//! Walk session state machine.
//!
//! [`WalkSession`] holds everything one walk records and enforces the
//! lifecycle:
//!
//! ```text
//! Idle ──start──► Tracking ──stop──► Stopped
//!  ▲                 │                  │
//!  │                 └──────clear───────┤
//!  └─────────────────clear──────────────┘
//!        Stopped ──start──► Tracking (fresh session)
//! ```
//!
//! The session is synchronous and performs no I/O. Every event carries the
//! generation returned by [`WalkSession::start`]; events from an earlier
//! generation, or arriving after `stop`/`clear`, are ignored. This is what
//! keeps a late provider callback from mutating a finished walk.

use super::error::{LocationError, TrackerError};
use super::model::{PositionSample, SessionState, TrackerSnapshot, WalkSummary};
use super::path::WalkPath;
use super::policy::AcceptancePolicy;

/// What happened to a delivered fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOutcome {
    /// Appended to the path.
    Appended,
    /// Dropped by the acceptance policy; still the current position.
    Rejected,
    /// Not part of the active session.
    Ignored,
}

/// State of one walk-tracking session.
#[derive(Debug, Default)]
pub struct WalkSession {
    state: SessionState,
    generation: u64,
    policy: AcceptancePolicy,
    path: WalkPath,
    current_position: Option<PositionSample>,
    started_at_ms: Option<i64>,
    elapsed_secs: u64,
    last_error: Option<LocationError>,
    rejected_fixes: u64,
}

impl WalkSession {
    /// Create an idle session with the given acceptance policy.
    pub fn new(policy: AcceptancePolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a session is tracking.
    pub fn is_tracking(&self) -> bool {
        self.state == SessionState::Tracking
    }

    /// Generation of the most recent session.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether events tagged with `generation` belong to the active session.
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_tracking() && self.generation == generation
    }

    /// Accepted samples so far.
    pub fn path(&self) -> &WalkPath {
        &self.path
    }

    /// Most recent fix received.
    pub fn current_position(&self) -> Option<&PositionSample> {
        self.current_position.as_ref()
    }

    /// Whole seconds elapsed while tracking.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// Most recent provider error.
    pub fn last_error(&self) -> Option<&LocationError> {
        self.last_error.as_ref()
    }

    /// Fixes dropped by the acceptance policy this session.
    pub fn rejected_fixes(&self) -> u64 {
        self.rejected_fixes
    }

    /// Cumulative distance in meters, recomputed from the full path.
    pub fn distance_m(&self) -> f64 {
        self.path.total_distance_m()
    }

    /// Begin a new session.
    ///
    /// Valid from `Idle` or `Stopped`. Resets the path, counters, current
    /// position and error, and returns the new generation.
    pub fn start(&mut self, now_ms: i64) -> Result<u64, TrackerError> {
        if self.is_tracking() {
            return Err(TrackerError::AlreadyTracking);
        }

        self.reset();
        self.generation = self.generation.wrapping_add(1);
        self.state = SessionState::Tracking;
        self.started_at_ms = Some(now_ms);

        Ok(self.generation)
    }

    /// Record why a start request was refused.
    ///
    /// A stopped walk is discarded first, as a successful start would have
    /// done, so its frozen results never carry the refusal. The session ends
    /// up `Idle`. Does nothing while tracking.
    pub fn reject_start(&mut self, error: LocationError) {
        if self.is_tracking() {
            return;
        }
        if self.state == SessionState::Stopped {
            self.clear();
        }
        self.last_error = Some(error);
    }

    /// Apply a fix delivered by the provider.
    pub fn on_fix(&mut self, generation: u64, sample: PositionSample) -> FixOutcome {
        if !self.is_current(generation) {
            return FixOutcome::Ignored;
        }

        self.current_position = Some(sample);

        if self.policy.accepts(self.path.last(), &sample) {
            self.path.push(sample);
            FixOutcome::Appended
        } else {
            self.rejected_fixes += 1;
            FixOutcome::Rejected
        }
    }

    /// Record a provider error. Tracking continues.
    ///
    /// Returns false if the error does not belong to the active session.
    pub fn on_fix_error(&mut self, generation: u64, error: LocationError) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.last_error = Some(error);
        true
    }

    /// Advance the elapsed-time counter by one second.
    pub fn tick(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.elapsed_secs += 1;
        true
    }

    /// Stop tracking and freeze the results.
    ///
    /// Returns `None` (and changes nothing) unless the session is tracking.
    pub fn stop(&mut self) -> Option<WalkSummary> {
        if !self.is_tracking() {
            return None;
        }
        self.state = SessionState::Stopped;
        self.summary()
    }

    /// Discard the session, whatever its state, and return to `Idle`.
    pub fn clear(&mut self) {
        self.reset();
        // Invalidate anything still in flight for the discarded session
        self.generation = self.generation.wrapping_add(1);
        self.state = SessionState::Idle;
    }

    /// Results recorded so far, if a session was ever started.
    pub fn summary(&self) -> Option<WalkSummary> {
        let started_at_ms = self.started_at_ms?;
        Some(WalkSummary {
            path: self.path.clone(),
            distance_m: self.distance_m(),
            elapsed_secs: self.elapsed_secs,
            started_at_ms,
        })
    }

    /// Read-only copy for observers.
    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            state: self.state,
            current_position: self.current_position,
            path: self.path.samples().to_vec(),
            distance_m: self.distance_m(),
            elapsed_secs: self.elapsed_secs,
            started_at_ms: self.started_at_ms,
            last_error: self.last_error.clone(),
            rejected_fixes: self.rejected_fixes,
        }
    }

    fn reset(&mut self) {
        self.path.clear();
        self.current_position = None;
        self.started_at_ms = None;
        self.elapsed_secs = 0;
        self.last_error = None;
        self.rejected_fixes = 0;
    }
}
