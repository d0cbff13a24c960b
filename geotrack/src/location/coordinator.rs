//! Location Coordinator - single authority over tracking mode and current location.
//!
//! The coordinator owns at most one provider stream, normalizes every raw
//! event into a [`LocationSample`], keeps the current sample and a bounded
//! history, and fans updates out to subscribers in registration order.
//!
//! # State machine
//!
//! ```text
//!   Idle ── start(mode) ok ──▶ Foreground | Background
//!   Foreground ◀── start(other mode): stop, then start ──▶ Background
//!   any ── stop / fatal stream error / stream closed ──▶ Idle
//! ```
//!
//! # Interleaving
//!
//! Every start or stop bumps a generation counter. A start that is waiting on
//! a permission prompt or on the provider re-checks its generation when it
//! resumes and, if anything else happened in between, releases whatever it
//! opened and returns [`LocationError::Superseded`]. Streamed samples are only
//! stored and delivered while their stream's generation is still current,
//! inside the listener hub's delivery gate; `stop_tracking` passes through the
//! same gate before returning.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::error::LocationError;
use super::history::{SampleHistory, DEFAULT_HISTORY_CAPACITY};
use super::listeners::{ListenerHub, Subscription};
use super::normalize::normalize;
use super::sample::LocationSample;
use super::source::{
    FetchOptions, LocationSource, PermissionProvider, PermissionStatus, ProviderEvent, Unwatch,
    WatchOptions,
};
use super::state::{SampleSource, TrackingMode, TrackingState};

/// Configuration for the location coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    /// Number of samples retained in history.
    pub history_capacity: usize,

    /// One-shot fetch options (the timeout is enforced by the coordinator).
    pub fetch: FetchOptions,

    /// Watch options for foreground tracking.
    pub foreground: WatchOptions,

    /// Watch options for background tracking.
    pub background: WatchOptions,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            fetch: FetchOptions::default(),
            foreground: WatchOptions::foreground(),
            background: WatchOptions::background(),
        }
    }
}

impl CoordinatorConfig {
    /// Watch options for a tracking mode.
    pub fn watch_options(&self, mode: TrackingMode) -> &WatchOptions {
        match mode {
            TrackingMode::Foreground => &self.foreground,
            TrackingMode::Background => &self.background,
        }
    }
}

/// The single open provider stream.
struct ActiveWatch {
    mode: TrackingMode,
    generation: u64,
    unwatch: Unwatch,
    pump: Option<JoinHandle<()>>,
}

impl ActiveWatch {
    /// Unsubscribe from the provider and stop the pump task.
    fn shutdown(mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.unwatch.call();
    }
}

/// Mutable coordinator state. Never held across an await.
struct CoordinatorState {
    tracking: TrackingState,
    generation: u64,
    pending: Option<TrackingMode>,
    active: Option<ActiveWatch>,
    current: Option<Arc<LocationSample>>,
    history: SampleHistory,
}

impl CoordinatorState {
    fn store(&mut self, sample: Arc<LocationSample>) {
        self.history.push(Arc::clone(&sample));
        self.current = Some(sample);
    }

    fn active_generation(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.generation)
    }
}

/// Non-generic core shared with pump tasks.
struct Core {
    state: Mutex<CoordinatorState>,
    listeners: Arc<ListenerHub>,
    tracking_tx: watch::Sender<TrackingState>,
}

impl Core {
    fn set_tracking(&self, state: &mut CoordinatorState, tracking: TrackingState) {
        state.tracking = tracking;
        self.tracking_tx.send_if_modified(|current| {
            if *current != tracking {
                *current = tracking;
                true
            } else {
                false
            }
        });
    }

    /// Store a manual sample and notify subscribers.
    fn publish(&self, sample: &Arc<LocationSample>) {
        let _gate = self.listeners.gate();
        self.state.lock().store(Arc::clone(sample));
        self.listeners.notify(sample);
    }

    /// Store and notify a streamed sample if its stream is still the active one.
    fn publish_streamed(&self, generation: u64, sample: Arc<LocationSample>) -> bool {
        let _gate = self.listeners.gate();
        {
            let mut state = self.state.lock();
            if state.active_generation() != Some(generation) {
                return false;
            }
            state.store(Arc::clone(&sample));
        }
        self.listeners.notify(&sample);
        true
    }

    /// Return to idle after the stream of `generation` ended on its own.
    fn end_stream(&self, generation: u64, reason: &str) {
        let ended = {
            let mut state = self.state.lock();
            if state.active_generation() != Some(generation) {
                return;
            }
            state.generation += 1;
            let ended = state.active.take();
            self.set_tracking(&mut state, TrackingState::Idle);
            ended
        };

        if let Some(mut ended) = ended {
            tracing::warn!(mode = %ended.mode, reason, "Location stream ended, tracking stopped");
            // Called from the pump itself: detach instead of aborting
            ended.pump.take();
            ended.unwatch.call();
        }
    }
}

struct Shared<S, P> {
    source: S,
    permissions: P,
    config: CoordinatorConfig,
    core: Arc<Core>,
}

/// Location coordinator.
///
/// Cheap to clone; clones share the same state, so UI handlers can hold their
/// own copy and call into it concurrently.
pub struct LocationCoordinator<S, P> {
    shared: Arc<Shared<S, P>>,
}

impl<S, P> Clone for LocationCoordinator<S, P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: LocationSource, P: PermissionProvider> LocationCoordinator<S, P> {
    /// Create a coordinator with default configuration.
    pub fn new(source: S, permissions: P) -> Self {
        Self::with_config(source, permissions, CoordinatorConfig::default())
    }

    /// Create a coordinator with custom configuration.
    pub fn with_config(source: S, permissions: P, config: CoordinatorConfig) -> Self {
        let (tracking_tx, _) = watch::channel(TrackingState::Idle);
        let core = Arc::new(Core {
            state: Mutex::new(CoordinatorState {
                tracking: TrackingState::Idle,
                generation: 0,
                pending: None,
                active: None,
                current: None,
                history: SampleHistory::new(config.history_capacity),
            }),
            listeners: ListenerHub::new(),
            tracking_tx,
        });

        Self {
            shared: Arc::new(Shared {
                source,
                permissions,
                config,
                core,
            }),
        }
    }

    /// Fetch a single fix, store it as the current sample and notify subscribers.
    ///
    /// Foreground permission is requested first; a denial returns without
    /// touching the provider. On failure the previous current sample is left
    /// untouched. Does not change the tracking state.
    pub async fn request_one_shot(&self) -> Result<Arc<LocationSample>, LocationError> {
        let mode = TrackingMode::Foreground;
        match self.shared.permissions.request_foreground().await {
            PermissionStatus::Granted => {}
            PermissionStatus::Denied => {
                tracing::warn!("Location permission denied, one-shot fetch skipped");
                return Err(LocationError::PermissionDenied { mode });
            }
            PermissionStatus::DeniedForever => {
                tracing::warn!("Location permission permanently denied, one-shot fetch skipped");
                return Err(LocationError::PermissionDeniedForever { mode });
            }
        }

        let options = &self.shared.config.fetch;

        let raw = match tokio::time::timeout(options.timeout, self.shared.source.fetch_once(options))
            .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "One-shot location fetch failed");
                return Err(LocationError::ProviderUnavailable(e.to_string()));
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = options.timeout.as_millis() as u64,
                    "One-shot location fetch timed out"
                );
                return Err(LocationError::ProviderUnavailable(format!(
                    "no fix within {:?}",
                    options.timeout
                )));
            }
        };

        let sample = match normalize(&raw, SampleSource::Manual) {
            Ok(sample) => Arc::new(sample),
            Err(e) => {
                tracing::warn!(error = %e, shape = raw.shape(), "Dropping malformed one-shot fix");
                return Err(e);
            }
        };

        self.shared.core.publish(&sample);
        tracing::info!(
            latitude = sample.latitude(),
            longitude = sample.longitude(),
            accuracy = ?sample.accuracy(),
            "One-shot location received"
        );

        Ok(sample)
    }

    /// Start continuous tracking in `mode`.
    ///
    /// A different active mode is stopped first; the same mode already active
    /// is a no-op. Permission for the mode is requested before the provider
    /// stream is opened. On any failure the coordinator is left `Idle`.
    pub async fn start_tracking(&self, mode: TrackingMode) -> Result<(), LocationError> {
        let core = &self.shared.core;

        let (generation, previous) = {
            let mut state = core.state.lock();
            if state.active.as_ref().is_some_and(|a| a.mode == mode) {
                tracing::debug!(%mode, "Tracking already active");
                return Ok(());
            }

            state.generation += 1;
            state.pending = Some(mode);
            let previous = state.active.take();
            core.set_tracking(&mut state, TrackingState::Idle);
            (state.generation, previous)
        };

        if let Some(previous) = previous {
            tracing::info!(from = %previous.mode, to = %mode, "Switching tracking mode");
            previous.shutdown();
            // Let a delivery from the old stream finish before the new one opens
            drop(core.listeners.gate());
        }

        let status = match mode {
            TrackingMode::Foreground => self.shared.permissions.request_foreground().await,
            TrackingMode::Background => self.shared.permissions.request_background().await,
        };

        match status {
            PermissionStatus::Granted => {}
            PermissionStatus::Denied => {
                self.abandon_pending(generation);
                tracing::warn!(%mode, "Location permission denied");
                return Err(LocationError::PermissionDenied { mode });
            }
            PermissionStatus::DeniedForever => {
                self.abandon_pending(generation);
                tracing::warn!(%mode, "Location permission permanently denied");
                return Err(LocationError::PermissionDeniedForever { mode });
            }
        }

        if !self.is_current(generation) {
            tracing::debug!(%mode, "Start superseded while awaiting permission");
            return Err(LocationError::Superseded);
        }

        let options = self.shared.config.watch_options(mode);
        let stream = match self.shared.source.watch(mode, options).await {
            Ok(stream) => stream,
            Err(e) => {
                self.abandon_pending(generation);
                tracing::warn!(%mode, error = %e, "Failed to open location stream");
                return Err(LocationError::ProviderUnavailable(e.to_string()));
            }
        };
        let (events, unwatch) = stream.into_parts();

        let mut state = core.state.lock();
        if state.generation != generation {
            drop(state);
            unwatch.call();
            tracing::debug!(%mode, "Start superseded while opening stream, released it");
            return Err(LocationError::Superseded);
        }

        let pump = tokio::spawn(run_pump(Arc::downgrade(core), generation, mode, events));
        state.pending = None;
        state.active = Some(ActiveWatch {
            mode,
            generation,
            unwatch,
            pump: Some(pump),
        });
        core.set_tracking(&mut state, mode.into());
        drop(state);

        tracing::info!(
            %mode,
            interval_ms = options.interval.as_millis() as u64,
            distance_filter_m = options.distance_filter_m,
            "Location tracking started"
        );
        Ok(())
    }

    /// Stop tracking. Idempotent.
    ///
    /// The provider subscription is released before this returns, and no
    /// further sample from it reaches subscribers afterwards. Also cancels a
    /// start that is still pending.
    pub fn stop_tracking(&self) {
        let core = &self.shared.core;

        let (stopped, cancelled) = {
            let mut state = core.state.lock();
            state.generation += 1;
            let cancelled = state.pending.take();
            let stopped = state.active.take();
            core.set_tracking(&mut state, TrackingState::Idle);
            (stopped, cancelled)
        };

        if let Some(mode) = cancelled {
            tracing::info!(%mode, "Pending tracking start cancelled");
        }

        match stopped {
            Some(active) => {
                let mode = active.mode;
                active.shutdown();
                tracing::info!(%mode, "Location tracking stopped");
            }
            None => tracing::debug!("Stop requested while idle"),
        }

        drop(core.listeners.gate());
    }

    /// Register a listener for every new sample, manual or streamed.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<LocationSample>) + Send + Sync + 'static,
    {
        self.shared.core.listeners.register(Arc::new(listener))
    }

    /// Most recent sample, if any was ever received.
    pub fn current(&self) -> Option<Arc<LocationSample>> {
        self.shared.core.state.lock().current.clone()
    }

    /// Retained samples, oldest first.
    pub fn history(&self) -> Vec<Arc<LocationSample>> {
        self.shared.core.state.lock().history.to_vec()
    }

    pub fn history_len(&self) -> usize {
        self.shared.core.state.lock().history.len()
    }

    /// Current tracking state.
    pub fn state(&self) -> TrackingState {
        self.shared.core.state.lock().tracking
    }

    /// Mode of a start that is still waiting on permission or the provider.
    pub fn pending_mode(&self) -> Option<TrackingMode> {
        self.shared.core.state.lock().pending
    }

    /// Observe tracking state changes.
    pub fn watch_state(&self) -> watch::Receiver<TrackingState> {
        self.shared.core.tracking_tx.subscribe()
    }

    /// Number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.shared.core.listeners.len()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.shared.config
    }

    fn is_current(&self, generation: u64) -> bool {
        self.shared.core.state.lock().generation == generation
    }

    fn abandon_pending(&self, generation: u64) {
        let mut state = self.shared.core.state.lock();
        if state.generation == generation {
            state.pending = None;
        }
    }
}

impl<S, P> Drop for Shared<S, P> {
    fn drop(&mut self) {
        if let Some(active) = self.core.state.lock().active.take() {
            active.shutdown();
        }
    }
}

/// Forward provider events of one stream into the coordinator.
async fn run_pump(
    core: Weak<Core>,
    generation: u64,
    mode: TrackingMode,
    mut events: mpsc::Receiver<ProviderEvent>,
) {
    let source = mode.sample_source();

    while let Some(event) = events.recv().await {
        let Some(strong) = core.upgrade() else {
            return;
        };

        match event {
            ProviderEvent::Location(raw) => match normalize(&raw, source) {
                Ok(sample) => {
                    let sample = Arc::new(sample);
                    tracing::trace!(
                        %mode,
                        latitude = sample.latitude(),
                        longitude = sample.longitude(),
                        "Streamed location"
                    );
                    if !strong.publish_streamed(generation, sample) {
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(%mode, shape = raw.shape(), error = %e, "Dropping malformed provider event");
                }
            },
            ProviderEvent::Error(e) if e.is_fatal() => {
                strong.end_stream(generation, &e.to_string());
                return;
            }
            ProviderEvent::Error(e) => {
                tracing::warn!(%mode, error = %e, "Location provider reported an error");
            }
        }
    }

    if let Some(core) = core.upgrade() {
        core.end_stream(generation, "provider closed the stream");
    }
}
