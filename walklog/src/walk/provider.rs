//! Device location provider boundary.
//!
//! The tracker never talks to hardware directly. It consumes a
//! [`LocationProvider`], which offers a one-shot position query, a continuous
//! watch subscription and an availability check.
//!
//! # Subscriptions
//!
//! `watch_position` returns a [`FixSubscription`] backed by an unbounded
//! channel. Unsubscribing closes the receiving half, after which the provider
//! can no longer deliver into it. Unsubscribing twice is harmless, and
//! dropping the subscription has the same effect.
//!
//! # Example
//!
//! ```ignore
//! use walklog::walk::{ChannelLocationProvider, LocationProvider, PositionSample, WatchOptions};
//!
//! let provider = ChannelLocationProvider::new();
//! let mut subscription = provider.watch_position(&WatchOptions::default());
//!
//! provider.push_fix(PositionSample::now(35.6812, 139.7671));
//! let fix = subscription.recv().await;
//!
//! subscription.unsubscribe();
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::error::LocationError;
use super::model::PositionSample;

/// Default bound on how long to wait for each fix.
pub const DEFAULT_FIX_TIMEOUT: Duration = Duration::from_secs(10);

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A fix or the provider error that replaced it.
pub type FixEvent = Result<PositionSample, LocationError>;

/// Options passed to the provider when requesting positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    /// Request the most accurate positioning available (GPS over network).
    pub high_accuracy: bool,

    /// Maximum wait for a fix before a timeout error is reported.
    pub timeout: Duration,

    /// Maximum age of a cached fix the provider may return.
    ///
    /// Zero means every fix must be freshly acquired.
    pub maximum_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: DEFAULT_FIX_TIMEOUT,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Receiving end of a continuous position watch.
#[derive(Debug)]
pub struct FixSubscription {
    receiver: Option<mpsc::UnboundedReceiver<FixEvent>>,
}

impl FixSubscription {
    /// Wrap the receiving half of a provider channel.
    pub fn new(receiver: mpsc::UnboundedReceiver<FixEvent>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// A subscription that never yields anything.
    pub fn closed() -> Self {
        Self { receiver: None }
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the provider has ended the watch or the
    /// subscription was cancelled.
    pub async fn recv(&mut self) -> Option<FixEvent> {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.recv().await,
            None => None,
        }
    }

    /// Stop receiving events. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(mut receiver) = self.receiver.take() {
            receiver.close();
        }
    }

    /// Whether the subscription can still receive events.
    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }
}

/// Source of device positions.
///
/// Implementations must be `Send + Sync`; the tracker holds them as
/// `Arc<dyn LocationProvider>`.
pub trait LocationProvider: Send + Sync {
    /// Whether location services exist on this device.
    fn is_available(&self) -> bool;

    /// Obtain a single position.
    fn current_position(&self, options: &WatchOptions) -> BoxFuture<'_, FixEvent>;

    /// Start a continuous watch.
    fn watch_position(&self, options: &WatchOptions) -> FixSubscription;
}

#[derive(Debug, Default)]
struct ChannelInner {
    subscribers: Vec<mpsc::UnboundedSender<FixEvent>>,
    last_fix: Option<PositionSample>,
    last_options: Option<WatchOptions>,
}

impl ChannelInner {
    fn broadcast(&mut self, event: FixEvent) -> usize {
        // Closed subscriptions drop out here
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        self.subscribers.len()
    }
}

/// In-process provider fed by explicit calls.
///
/// Used to replay recorded fixes and to drive the tracker in tests. Every
/// pushed fix or error is delivered to all live subscriptions.
#[derive(Debug)]
pub struct ChannelLocationProvider {
    available: AtomicBool,
    inner: Mutex<ChannelInner>,
}

impl Default for ChannelLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelLocationProvider {
    /// Create an available provider with no subscribers.
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            inner: Mutex::new(ChannelInner::default()),
        }
    }

    /// Create a provider reporting that location services are missing.
    pub fn unavailable() -> Self {
        let provider = Self::new();
        provider.set_available(false);
        provider
    }

    /// Toggle whether location services are reported as present.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// End every open watch, as a device does when it stops delivering
    /// updates.
    pub fn disconnect_all(&self) {
        self.inner.lock().subscribers.clear();
    }

    /// Deliver a fix. Returns the number of subscriptions that received it.
    pub fn push_fix(&self, sample: PositionSample) -> usize {
        let mut inner = self.inner.lock();
        inner.last_fix = Some(sample);
        inner.broadcast(Ok(sample))
    }

    /// Deliver an error. Returns the number of subscriptions that received it.
    pub fn push_error(&self, error: LocationError) -> usize {
        self.inner.lock().broadcast(Err(error))
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }

    /// Options passed to the most recent `watch_position` call.
    pub fn last_watch_options(&self) -> Option<WatchOptions> {
        self.inner.lock().last_options.clone()
    }

    fn cached_fix(&self, maximum_age: Duration) -> Option<PositionSample> {
        if maximum_age.is_zero() {
            return None;
        }
        let last = self.inner.lock().last_fix?;
        let age_ms = chrono::Utc::now().timestamp_millis() - last.captured_at_ms;
        (age_ms >= 0 && (age_ms as u128) <= maximum_age.as_millis()).then_some(last)
    }
}

impl LocationProvider for ChannelLocationProvider {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn current_position(&self, options: &WatchOptions) -> BoxFuture<'_, FixEvent> {
        let options = options.clone();
        Box::pin(async move {
            if !self.is_available() {
                return Err(LocationError::Unsupported);
            }
            if let Some(cached) = self.cached_fix(options.maximum_age) {
                return Ok(cached);
            }

            // Wait for the next fresh fix
            let mut subscription = self.watch_position(&options);
            match tokio::time::timeout(options.timeout, subscription.recv()).await {
                Ok(Some(event)) => event,
                Ok(None) => Err(LocationError::PositionUnavailable(
                    "location updates ended".to_string(),
                )),
                Err(_) => Err(LocationError::Timeout(options.timeout)),
            }
        })
    }

    fn watch_position(&self, options: &WatchOptions) -> FixSubscription {
        if !self.is_available() {
            return FixSubscription::closed();
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        inner.subscribers.push(tx);
        inner.last_options = Some(options.clone());
        FixSubscription::new(rx)
    }
}
