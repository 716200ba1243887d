//! Async walk tracker.
//!
//! [`WalkTracker`] owns a [`WalkSession`] behind a mutex and drives it from a
//! background task. The task multiplexes four event sources:
//!
//! - cancellation from `stop`, `clear` or drop
//! - a one-second ticker advancing the elapsed counter
//! - fixes and errors from the provider subscription
//! - a per-fix deadline that records [`LocationError::Timeout`] when no fix
//!   arrives in time
//!
//! Every change is published as a [`TrackerSnapshot`] on a `watch` channel.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use walklog::config::TrackerConfig;
//! use walklog::walk::{ChannelLocationProvider, WalkTracker};
//!
//! let provider = Arc::new(ChannelLocationProvider::new());
//! let tracker = WalkTracker::new(provider.clone(), TrackerConfig::default());
//!
//! tracker.start()?;
//! // ... fixes arrive ...
//! let summary = tracker.stop();
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{LocationError, TrackerError};
use super::model::{TrackerSnapshot, WalkSummary};
use super::provider::{FixEvent, FixSubscription, LocationProvider};
use super::session::{FixOutcome, WalkSession};
use crate::config::TrackerConfig;

/// Interval of the elapsed-time ticker. Each tick adds one second.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// State shared between the tracker handle and its worker task.
struct Shared {
    session: Mutex<WalkSession>,
    snapshots: watch::Sender<TrackerSnapshot>,
}

impl Shared {
    /// Mutate the session and publish the result if it changed.
    fn apply<R>(&self, f: impl FnOnce(&mut WalkSession) -> R) -> R {
        let mut session = self.session.lock();
        let result = f(&mut session);

        let snapshot = session.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });

        result
    }
}

struct Worker {
    cancellation: CancellationToken,
    handle: JoinHandle<()>,
}

impl Worker {
    fn shutdown(self) {
        self.cancellation.cancel();
        self.handle.abort();
    }
}

/// Records a walk from a [`LocationProvider`].
pub struct WalkTracker {
    provider: Arc<dyn LocationProvider>,
    config: TrackerConfig,
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl WalkTracker {
    /// Create an idle tracker.
    pub fn new(provider: Arc<dyn LocationProvider>, config: TrackerConfig) -> Self {
        let session = WalkSession::new(config.acceptance);
        let (snapshots, _) = watch::channel(session.snapshot());

        Self {
            provider,
            config,
            shared: Arc::new(Shared {
                session: Mutex::new(session),
                snapshots,
            }),
            worker: Mutex::new(None),
        }
    }

    /// Tracker configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Begin recording a new walk.
    ///
    /// Discards the results of any previous session. Fails with
    /// [`TrackerError::Unavailable`] when the provider has no location
    /// services; the session then stays idle with `last_error` set to
    /// [`LocationError::Unsupported`]. Fails with [`TrackerError::NoRuntime`]
    /// outside a Tokio runtime, leaving the session untouched.
    pub fn start(&self) -> Result<(), TrackerError> {
        let mut worker = self.worker.lock();

        if self.shared.session.lock().is_tracking() {
            return Err(TrackerError::AlreadyTracking);
        }

        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| TrackerError::NoRuntime)?;

        if !self.provider.is_available() {
            self.shared
                .apply(|session| session.reject_start(LocationError::Unsupported));
            warn!("Cannot start walk: location services are unavailable");
            return Err(TrackerError::Unavailable);
        }

        let now_ms = chrono::Utc::now().timestamp_millis();
        let generation = self.shared.apply(|session| session.start(now_ms))?;

        if let Some(previous) = worker.take() {
            previous.shutdown();
        }

        // Subscribe before returning so no fix pushed after start is lost
        let subscription = self.provider.watch_position(&self.config.watch);
        let cancellation = CancellationToken::new();
        let handle = runtime.spawn(run_worker(
            Arc::clone(&self.shared),
            subscription,
            generation,
            self.config.watch.timeout,
            cancellation.clone(),
        ));
        *worker = Some(Worker {
            cancellation,
            handle,
        });

        info!(
            generation,
            high_accuracy = self.config.watch.high_accuracy,
            fix_timeout = ?self.config.watch.timeout,
            "Walk tracking started"
        );
        Ok(())
    }

    /// Stop recording and return the frozen results.
    ///
    /// The session is `Stopped` by the time this returns; fixes delivered
    /// afterwards are discarded. Returns `None` when not tracking.
    pub fn stop(&self) -> Option<WalkSummary> {
        let mut worker = self.worker.lock();
        let summary = self.shared.apply(|session| session.stop());

        if let Some(running) = worker.take() {
            running.shutdown();
        }

        if let Some(summary) = &summary {
            info!(
                distance_m = format!("{:.1}", summary.distance_m),
                elapsed_secs = summary.elapsed_secs,
                samples = summary.sample_count(),
                "Walk tracking stopped"
            );
        }
        summary
    }

    /// Discard the current session, whatever its state, and return to idle.
    pub fn clear(&self) {
        let mut worker = self.worker.lock();
        if let Some(running) = worker.take() {
            running.shutdown();
        }
        self.shared.apply(|session| session.clear());
        info!("Walk session cleared");
    }

    /// Current tracker state.
    pub fn snapshot(&self) -> TrackerSnapshot {
        self.shared.session.lock().snapshot()
    }

    /// Receive a snapshot every time the tracker state changes.
    pub fn subscribe(&self) -> watch::Receiver<TrackerSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// One-shot position query, independent of any session.
    pub async fn current_position(&self) -> FixEvent {
        self.provider.current_position(&self.config.watch).await
    }
}

impl Drop for WalkTracker {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.shutdown();
        }
    }
}

impl std::fmt::Debug for WalkTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalkTracker")
            .field("config", &self.config)
            .field("state", &self.shared.session.lock().state())
            .finish()
    }
}

/// Worker loop for one session generation.
///
/// Exits when cancelled or as soon as the session no longer belongs to
/// `generation`.
async fn run_worker(
    shared: Arc<Shared>,
    mut subscription: FixSubscription,
    generation: u64,
    fix_timeout: Duration,
    cancellation: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);

    // Only fix events and timeouts move the deadline, never ticks
    let fix_deadline = tokio::time::sleep(fix_timeout);
    tokio::pin!(fix_deadline);

    let mut listening = true;

    loop {
        let current = tokio::select! {
            biased;

            _ = cancellation.cancelled() => break,

            _ = ticker.tick() => shared.apply(|session| session.tick(generation)),

            event = subscription.recv(), if listening => {
                fix_deadline.as_mut().reset(Instant::now() + fix_timeout);
                match event {
                    Some(Ok(sample)) => {
                        match shared.apply(|session| session.on_fix(generation, sample)) {
                            FixOutcome::Appended => {
                                debug!(
                                    lat = format!("{:.6}", sample.latitude),
                                    lon = format!("{:.6}", sample.longitude),
                                    "Fix appended"
                                );
                                true
                            }
                            FixOutcome::Rejected => {
                                debug!(
                                    lat = format!("{:.6}", sample.latitude),
                                    lon = format!("{:.6}", sample.longitude),
                                    "Fix below minimum movement, not appended"
                                );
                                true
                            }
                            FixOutcome::Ignored => false,
                        }
                    }
                    Some(Err(error)) => {
                        warn!(generation, error = %error, "Location error while tracking");
                        shared.apply(|session| session.on_fix_error(generation, error))
                    }
                    None => {
                        // The deadline stays armed so timeouts keep being reported
                        warn!(generation, "Location updates ended while tracking");
                        listening = false;
                        shared.apply(|session| {
                            session.on_fix_error(
                                generation,
                                LocationError::PositionUnavailable(
                                    "location updates ended".to_string(),
                                ),
                            )
                        })
                    }
                }
            }

            _ = &mut fix_deadline => {
                fix_deadline.as_mut().reset(Instant::now() + fix_timeout);
                warn!(generation, timeout = ?fix_timeout, "No position fix received in time");
                shared.apply(|session| {
                    session.on_fix_error(generation, LocationError::Timeout(fix_timeout))
                })
            }
        };

        if !current {
            break;
        }
    }

    subscription.unsubscribe();
    debug!(generation, "Walk tracker worker stopped");
}
