//! Collaborator traits for location providers and permissions.
//!
//! - [`LocationSource`] - one-shot fetch and continuous watch (pull + push)
//! - [`PermissionProvider`] - foreground/background permission prompts
//! - [`ProviderStream`] - an open watch: event receiver plus synchronous unsubscribe
//!
//! Foreground and background tracking go through the same `watch` call; the
//! mode and its [`WatchOptions`] select the behaviour.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use super::raw::RawLocationEvent;
use super::state::TrackingMode;

/// Outcome of a permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Denied with "don't ask again"; only system settings can change it.
    DeniedForever,
}

/// Errors reported by a location provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// No fix available right now (services off, no signal).
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider gave up waiting for a fix.
    #[error("provider timed out")]
    Timeout,

    /// The provider stream cannot continue.
    #[error("provider failed: {0}")]
    Fatal(String),
}

impl SourceError {
    /// True if a stream reporting this error has ended.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Options for a one-shot fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Ask for GPS-grade accuracy.
    pub high_accuracy: bool,
    /// Upper bound the coordinator waits for the provider.
    pub timeout: Duration,
    /// Accept a cached fix up to this age.
    pub maximum_age: Duration,
}

impl FetchOptions {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
    pub const DEFAULT_MAXIMUM_AGE: Duration = Duration::from_secs(10);
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Self::DEFAULT_TIMEOUT,
            maximum_age: Self::DEFAULT_MAXIMUM_AGE,
        }
    }
}

/// Options for a continuous watch.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    /// Ask for GPS-grade accuracy.
    pub high_accuracy: bool,
    /// Minimum movement in meters between updates (0 = every update).
    pub distance_filter_m: f64,
    /// Desired update interval.
    pub interval: Duration,
    /// Fastest interval the app can handle.
    pub fastest_interval: Duration,
    /// Radius the device must leave before a stationary provider wakes up.
    pub stationary_radius_m: f64,
}

impl WatchOptions {
    /// Foreground defaults: every fix, every 3 seconds.
    pub fn foreground() -> Self {
        Self {
            high_accuracy: true,
            distance_filter_m: 0.0,
            interval: Duration::from_millis(3000),
            fastest_interval: Duration::from_millis(3000),
            stationary_radius_m: 0.0,
        }
    }

    /// Background defaults: 50 m filter, 10 s interval, 5 s fastest.
    pub fn background() -> Self {
        Self {
            high_accuracy: true,
            distance_filter_m: 50.0,
            interval: Duration::from_millis(10_000),
            fastest_interval: Duration::from_millis(5_000),
            stationary_radius_m: 50.0,
        }
    }

    /// Defaults for the given mode.
    pub fn for_mode(mode: TrackingMode) -> Self {
        match mode {
            TrackingMode::Foreground => Self::foreground(),
            TrackingMode::Background => Self::background(),
        }
    }
}

/// Event delivered on an open provider stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    Location(RawLocationEvent),
    Error(SourceError),
}

/// Synchronous unsubscribe for a provider stream.
///
/// Runs exactly once: on [`Unwatch::call`] or when dropped.
pub struct Unwatch(Option<Box<dyn FnOnce() + Send>>);

impl Unwatch {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    /// An unsubscribe with nothing to release.
    pub fn noop() -> Self {
        Self(None)
    }

    /// Release the provider subscription now.
    pub fn call(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl Drop for Unwatch {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Unwatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Unwatch")
            .field(&if self.0.is_some() { "armed" } else { "released" })
            .finish()
    }
}

/// An open provider watch.
///
/// The stream ends when the provider drops its sender. Dropping the
/// `ProviderStream` unsubscribes.
#[derive(Debug)]
pub struct ProviderStream {
    events: mpsc::Receiver<ProviderEvent>,
    unwatch: Unwatch,
}

impl ProviderStream {
    pub fn new(events: mpsc::Receiver<ProviderEvent>, unwatch: Unwatch) -> Self {
        Self { events, unwatch }
    }

    pub fn into_parts(self) -> (mpsc::Receiver<ProviderEvent>, Unwatch) {
        (self.events, self.unwatch)
    }
}

/// External location provider.
pub trait LocationSource: Send + Sync + 'static {
    /// Fetch a single fix.
    fn fetch_once(
        &self,
        options: &FetchOptions,
    ) -> impl Future<Output = Result<RawLocationEvent, SourceError>> + Send;

    /// Open a continuous stream for `mode`.
    fn watch(
        &self,
        mode: TrackingMode,
        options: &WatchOptions,
    ) -> impl Future<Output = Result<ProviderStream, SourceError>> + Send;
}

/// External permission collaborator.
pub trait PermissionProvider: Send + Sync + 'static {
    fn request_foreground(&self) -> impl Future<Output = PermissionStatus> + Send;

    fn request_background(&self) -> impl Future<Output = PermissionStatus> + Send;
}

/// Permission provider answering from fixed statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPermissions {
    pub foreground: PermissionStatus,
    pub background: PermissionStatus,
}

impl StaticPermissions {
    pub fn granted() -> Self {
        Self::uniform(PermissionStatus::Granted)
    }

    pub fn uniform(status: PermissionStatus) -> Self {
        Self {
            foreground: status,
            background: status,
        }
    }
}

impl PermissionProvider for StaticPermissions {
    async fn request_foreground(&self) -> PermissionStatus {
        self.foreground
    }

    async fn request_background(&self) -> PermissionStatus {
        self.background
    }
}
