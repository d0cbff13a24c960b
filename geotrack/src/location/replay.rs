//! Recorded-track location source.
//!
//! Track files are JSON lines, one raw provider payload per line, in any of
//! the shapes accepted by [`RawLocationEvent`]. Blank lines and lines starting
//! with `#` are ignored:
//!
//! ```text
//! # morning walk
//! {"coords": {"latitude": 12.9716, "longitude": 77.5946, "accuracy": 5}, "timestamp": 1704067200000}
//! {"time": 1704067210000, "latitude": 12.9721, "longitude": 77.5950, "bearing": 30, "provider": "gps"}
//! ```
//!
//! A watch emits the payloads at the watch interval, applies the distance
//! filter, and closes the stream once the track is exhausted.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::raw::RawLocationEvent;
use super::sample::haversine_m;
use super::source::{
    FetchOptions, LocationSource, ProviderEvent, ProviderStream, SourceError, Unwatch,
    WatchOptions,
};
use super::state::TrackingMode;

/// Buffer between the emitter task and the coordinator.
const CHANNEL_CAPACITY: usize = 64;

/// Shortest emit interval; a zero interval is raised to this.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Errors loading a track file.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read track file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid payload on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Location source replaying a recorded track.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    events: Arc<[RawLocationEvent]>,
    active: Arc<AtomicUsize>,
}

impl ReplaySource {
    pub fn from_events(events: Vec<RawLocationEvent>) -> Self {
        Self {
            events: events.into(),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Parse a JSON-lines track.
    pub fn parse(contents: &str) -> Result<Self, ReplayError> {
        let mut events = Vec::new();

        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let event = serde_json::from_str(line).map_err(|source| ReplayError::Parse {
                line: index + 1,
                source,
            })?;
            events.push(event);
        }

        Ok(Self::from_events(events))
    }

    /// Load a JSON-lines track file.
    pub fn from_path(path: &Path) -> Result<Self, ReplayError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Self::parse(&contents)?;

        tracing::info!(
            path = %path.display(),
            events = source.len(),
            "Loaded replay track"
        );
        Ok(source)
    }

    /// Number of payloads in the track.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of watches whose emitter is still running.
    pub fn active_watches(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl LocationSource for ReplaySource {
    async fn fetch_once(&self, _options: &FetchOptions) -> Result<RawLocationEvent, SourceError> {
        self.events
            .first()
            .cloned()
            .ok_or_else(|| SourceError::Unavailable("replay track is empty".to_string()))
    }

    async fn watch(
        &self,
        mode: TrackingMode,
        options: &WatchOptions,
    ) -> Result<ProviderStream, SourceError> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let emitter = Emitter {
            events: Arc::clone(&self.events),
            interval: options.interval.max(MIN_INTERVAL),
            distance_filter_m: options.distance_filter_m,
            _active: ActiveGuard::new(Arc::clone(&self.active)),
        };

        tracing::debug!(
            %mode,
            events = self.events.len(),
            interval_ms = emitter.interval.as_millis() as u64,
            distance_filter_m = emitter.distance_filter_m,
            "Starting replay"
        );
        tokio::spawn(emitter.run(tx, cancel.clone()));

        Ok(ProviderStream::new(rx, Unwatch::new(move || cancel.cancel())))
    }
}

/// Counts a running emitter for [`ReplaySource::active_watches`].
#[derive(Debug)]
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct Emitter {
    events: Arc<[RawLocationEvent]>,
    interval: Duration,
    distance_filter_m: f64,
    _active: ActiveGuard,
}

impl Emitter {
    async fn run(self, tx: mpsc::Sender<ProviderEvent>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        let mut last_emitted: Option<(f64, f64)> = None;
        let mut emitted = 0usize;
        let mut filtered = 0usize;

        for event in self.events.iter() {
            if let (Some(to), Some(from)) = (event.coordinates(), last_emitted) {
                if self.distance_filter_m > 0.0 && haversine_m(from, to) < self.distance_filter_m {
                    filtered += 1;
                    continue;
                }
            }

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::debug!(emitted, filtered, "Replay cancelled");
                    return;
                }

                _ = interval.tick() => {}
            }

            if tx.send(ProviderEvent::Location(event.clone())).await.is_err() {
                tracing::debug!(emitted, "Replay receiver dropped");
                return;
            }

            emitted += 1;
            if let Some(coordinates) = event.coordinates() {
                last_emitted = Some(coordinates);
            }
        }

        tracing::debug!(emitted, filtered, "Replay track exhausted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::raw::NativePayload;
    use std::io::Write;

    fn point(lat: f64, lon: f64) -> RawLocationEvent {
        RawLocationEvent::Native(NativePayload {
            latitude: Some(lat),
            longitude: Some(lon),
            ..Default::default()
        })
    }

    fn options(distance_filter_m: f64) -> WatchOptions {
        WatchOptions {
            distance_filter_m,
            interval: Duration::from_millis(100),
            ..WatchOptions::foreground()
        }
    }

    async fn drain(stream: ProviderStream) -> Vec<RawLocationEvent> {
        let (mut rx, _unwatch) = stream.into_parts();
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            if let ProviderEvent::Location(raw) = event {
                events.push(raw);
            }
        }
        events
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let track = r#"
# recorded on a walk
{"coords": {"latitude": 12.9, "longitude": 77.6}, "timestamp": 1704067200000}

{"time": 1704067210000, "latitude": 12.91, "longitude": 77.61, "bearing": 30}
{"latitude": 12.92, "longitude": 77.62, "source": "foreground"}
"#;
        let source = ReplaySource::parse(track).unwrap();
        assert_eq!(source.len(), 3);

        let shapes: Vec<&str> = source.events.iter().map(|e| e.shape()).collect();
        assert_eq!(shapes, vec!["position", "background", "native"]);
    }

    #[test]
    fn test_parse_reports_line_number() {
        let err = ReplaySource::parse("{\"latitude\": 1.0}\n\nnot json\n").unwrap_err();
        assert!(matches!(err, ReplayError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"latitude\": 1.0, \"longitude\": 2.0}}").unwrap();

        let source = ReplaySource::from_path(file.path()).unwrap();
        assert_eq!(source.len(), 1);

        let missing = ReplaySource::from_path(Path::new("/nonexistent/track.jsonl"));
        assert!(matches!(missing, Err(ReplayError::Io { .. })));
    }

    #[tokio::test]
    async fn test_fetch_once_returns_first_event() {
        let source = ReplaySource::from_events(vec![point(1.0, 2.0), point(3.0, 4.0)]);
        let event = source.fetch_once(&FetchOptions::default()).await.unwrap();
        assert_eq!(event.coordinates(), Some((1.0, 2.0)));

        let empty = ReplaySource::from_events(Vec::new());
        let err = empty.fetch_once(&FetchOptions::default()).await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_emits_whole_track_then_closes() {
        let source = ReplaySource::from_events(vec![point(0.0, 0.0), point(0.0, 0.0), point(1.0, 1.0)]);
        let stream = source
            .watch(TrackingMode::Foreground, &options(0.0))
            .await
            .unwrap();

        let events = drain(stream).await;
        assert_eq!(events.len(), 3);
        assert_eq!(source.active_watches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distance_filter() {
        // ~11 m, ~111 m and ~1.1 m steps north of the equator
        let track = vec![
            point(0.0, 0.0),
            point(0.0001, 0.0),
            point(0.001, 0.0),
            point(0.00101, 0.0),
            point(0.002, 0.0),
        ];
        let source = ReplaySource::from_events(track);
        let stream = source
            .watch(TrackingMode::Background, &options(50.0))
            .await
            .unwrap();

        let lats: Vec<f64> = drain(stream)
            .await
            .iter()
            .filter_map(|e| e.coordinates().map(|(lat, _)| lat))
            .collect();
        assert_eq!(lats, vec![0.0, 0.001, 0.002]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unwatch_cancels_emitter() {
        let track = (0..100).map(|i| point(i as f64 * 0.01, 0.0)).collect();
        let source = ReplaySource::from_events(track);
        let stream = source
            .watch(TrackingMode::Foreground, &options(0.0))
            .await
            .unwrap();
        assert_eq!(source.active_watches(), 1);

        let (mut rx, unwatch) = stream.into_parts();
        assert!(rx.recv().await.is_some());
        unwatch.call();

        // Remaining buffered events drain, then the channel closes
        while rx.recv().await.is_some() {}
        assert_eq!(source.active_watches(), 0);
    }
}
