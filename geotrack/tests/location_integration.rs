//! Integration tests for location coordination and upload.
//!
//! These tests drive the public API end to end with a replayed track:
//! - One-shot fixes and the current sample / history
//! - Foreground and background tracking, mode switches and stop
//! - Permission failures leaving the coordinator idle
//! - Uploading published samples through a recording transport
//!
//! Run with: `cargo test --test location_integration`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use geotrack::location::{
    CoordinatorConfig, LocationCoordinator, LocationError, LocationSample, PermissionStatus,
    ReplaySource, SampleSource, StaticPermissions, TrackingMode, TrackingState,
};
use geotrack::upload::{
    AutoUploadConfig, AutoUploader, Credentials, Destination, LocationRecord, TransportResponse,
    UploadClient, UploadError, UploadTransport,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// A short walk: five fixes roughly 110 m apart, in three payload shapes.
const WALK: &str = r#"
# recorded walk
{"latitude": 12.9700, "longitude": 77.5900, "accuracy": 5.0, "timestamp": 1704067200000}
{"coords": {"latitude": 12.9710, "longitude": 77.5900, "accuracy": 6.0, "speed": 1.4}, "timestamp": 1704067203000}
{"time": 1704067206000, "latitude": 12.9720, "longitude": 77.5900, "bearing": 0.0, "provider": "gps"}
{"latitude": 12.9730, "longitude": 77.5900, "timestamp": 1704067209000}
{"latitude": 12.9740, "longitude": 77.5900, "timestamp": 1704067212000}
"#;

type Coordinator = LocationCoordinator<ReplaySource, StaticPermissions>;

fn walk() -> ReplaySource {
    ReplaySource::parse(WALK).unwrap()
}

fn coordinator(permissions: StaticPermissions) -> (Coordinator, ReplaySource) {
    let source = walk();
    (LocationCoordinator::new(source.clone(), permissions), source)
}

/// Subscribe and collect every delivered sample.
fn record_samples(
    coordinator: &Coordinator,
) -> (
    geotrack::location::Subscription,
    Arc<Mutex<Vec<Arc<LocationSample>>>>,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = coordinator.subscribe(move |sample: &Arc<LocationSample>| {
        sink.lock().unwrap().push(Arc::clone(sample));
    });
    (subscription, seen)
}

/// Let paused time run far enough for the whole walk to replay.
async fn run_track() {
    tokio::time::sleep(Duration::from_secs(120)).await;
}

/// Transport recording request bodies and answering with a fixed status.
#[derive(Clone)]
struct RecordingTransport {
    status: u16,
    bodies: Arc<Mutex<Vec<String>>>,
}

impl RecordingTransport {
    fn new(status: u16) -> Self {
        Self {
            status,
            bodies: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }
}

impl UploadTransport for RecordingTransport {
    async fn post_json(
        &self,
        _url: &str,
        _headers: &[(&str, &str)],
        body: String,
    ) -> Result<TransportResponse, UploadError> {
        self.bodies.lock().unwrap().push(body.clone());
        Ok(TransportResponse {
            status: self.status,
            body: if self.status < 300 { body } else { String::new() },
        })
    }
}

fn destination() -> (Destination, Credentials) {
    (
        Destination::new("https://collector.test/rest/v1/locations"),
        Credentials::bearer("test-token"),
    )
}

// ============================================================================
// One-shot
// ============================================================================

#[tokio::test]
async fn test_one_shot_sets_current_and_history() {
    let (coordinator, _) = coordinator(StaticPermissions::granted());
    let (_sub, seen) = record_samples(&coordinator);

    let sample = coordinator.request_one_shot().await.unwrap();

    assert_eq!(sample.source(), SampleSource::Manual);
    assert_eq!(sample.coordinates(), (12.97, 77.59));
    assert_eq!(sample.accuracy(), Some(5.0));
    assert_eq!(coordinator.current().as_deref(), Some(sample.as_ref()));
    assert_eq!(coordinator.history_len(), 1);
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(coordinator.state(), TrackingState::Idle);
}

#[tokio::test]
async fn test_one_shot_denied_leaves_no_sample() {
    let (coordinator, _) = coordinator(StaticPermissions::uniform(PermissionStatus::Denied));

    let err = coordinator.request_one_shot().await.unwrap_err();

    assert!(err.is_permission());
    assert!(coordinator.current().is_none());
    assert_eq!(coordinator.history_len(), 0);
}

// ============================================================================
// Tracking
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_foreground_track_replays_in_order_then_goes_idle() {
    let (coordinator, source) = coordinator(StaticPermissions::granted());
    let (_sub, seen) = record_samples(&coordinator);

    coordinator
        .start_tracking(TrackingMode::Foreground)
        .await
        .unwrap();
    assert_eq!(coordinator.state(), TrackingState::Foreground);

    run_track().await;

    let seen = seen.lock().unwrap();
    let latitudes: Vec<f64> = seen.iter().map(|s| s.latitude()).collect();
    assert_eq!(latitudes, vec![12.970, 12.971, 12.972, 12.973, 12.974]);
    assert!(seen.iter().all(|s| s.source() == SampleSource::Foreground));
    assert_eq!(seen[2].course(), Some(0.0));

    assert_eq!(coordinator.history_len(), 5);
    assert_eq!(coordinator.current().unwrap().latitude(), 12.974);
    assert_eq!(coordinator.state(), TrackingState::Idle);
    assert_eq!(source.active_watches(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_switch_modes_keeps_single_stream() {
    let (coordinator, source) = coordinator(StaticPermissions::granted());
    let (_sub, seen) = record_samples(&coordinator);

    coordinator
        .start_tracking(TrackingMode::Foreground)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(4_000)).await;
    assert_eq!(source.active_watches(), 1);

    coordinator
        .start_tracking(TrackingMode::Background)
        .await
        .unwrap();
    assert_eq!(coordinator.state(), TrackingState::Background);
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(source.active_watches(), 1);

    run_track().await;

    let seen = seen.lock().unwrap();
    let first_background = seen
        .iter()
        .position(|s| s.source() == SampleSource::Background)
        .expect("background samples");
    assert!(first_background > 0);
    assert!(seen[..first_background]
        .iter()
        .all(|s| s.source() == SampleSource::Foreground));
    assert!(seen[first_background..]
        .iter()
        .all(|s| s.source() == SampleSource::Background));
    assert_eq!(coordinator.state(), TrackingState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_same_mode_start_is_noop() {
    let (coordinator, source) = coordinator(StaticPermissions::granted());

    coordinator
        .start_tracking(TrackingMode::Background)
        .await
        .unwrap();
    coordinator
        .start_tracking(TrackingMode::Background)
        .await
        .unwrap();

    assert_eq!(coordinator.state(), TrackingState::Background);
    assert_eq!(source.active_watches(), 1);
    coordinator.stop_tracking();
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_delivery() {
    let (coordinator, source) = coordinator(StaticPermissions::granted());
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    let _sub = coordinator.subscribe(move |_: &Arc<LocationSample>| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    coordinator
        .start_tracking(TrackingMode::Foreground)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(3_500)).await;

    coordinator.stop_tracking();
    let at_stop = delivered.load(Ordering::SeqCst);
    assert!(at_stop >= 1);
    assert_eq!(coordinator.state(), TrackingState::Idle);

    run_track().await;

    assert_eq!(delivered.load(Ordering::SeqCst), at_stop);
    assert_eq!(coordinator.history_len(), at_stop);
    assert_eq!(source.active_watches(), 0);

    // Stopping again is harmless
    coordinator.stop_tracking();
    assert_eq!(coordinator.state(), TrackingState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_denied_switch_leaves_idle() {
    let permissions = StaticPermissions {
        foreground: PermissionStatus::Granted,
        background: PermissionStatus::DeniedForever,
    };
    let (coordinator, source) = coordinator(permissions);

    coordinator
        .start_tracking(TrackingMode::Foreground)
        .await
        .unwrap();
    let err = coordinator
        .start_tracking(TrackingMode::Background)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LocationError::PermissionDeniedForever {
            mode: TrackingMode::Background
        }
    );
    // The foreground stream was stopped before the background prompt
    assert_eq!(coordinator.state(), TrackingState::Idle);
    assert!(coordinator.pending_mode().is_none());
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(source.active_watches(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_history_capacity_from_config() {
    let config = CoordinatorConfig {
        history_capacity: 3,
        ..CoordinatorConfig::default()
    };
    let coordinator = LocationCoordinator::with_config(walk(), StaticPermissions::granted(), config);

    coordinator
        .start_tracking(TrackingMode::Foreground)
        .await
        .unwrap();
    run_track().await;

    let history: Vec<f64> = coordinator.history().iter().map(|s| s.latitude()).collect();
    assert_eq!(history, vec![12.972, 12.973, 12.974]);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_events_are_skipped() {
    let track = r#"
{"latitude": 12.97, "longitude": 77.59, "timestamp": 1704067200000}
{"latitude": 12.98, "timestamp": 1704067203000}
{"latitude": 95.0, "longitude": 77.59, "timestamp": 1704067206000}
{"latitude": 12.99, "longitude": 77.59, "timestamp": 1704067209000}
"#;
    let coordinator =
        LocationCoordinator::new(ReplaySource::parse(track).unwrap(), StaticPermissions::granted());

    coordinator
        .start_tracking(TrackingMode::Foreground)
        .await
        .unwrap();
    run_track().await;

    let history: Vec<f64> = coordinator.history().iter().map(|s| s.latitude()).collect();
    assert_eq!(history, vec![12.97, 12.99]);
}

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_upload_one_shot_sample() {
    let (coordinator, _) = coordinator(StaticPermissions::granted());
    let transport = RecordingTransport::new(201);
    let client = UploadClient::new(transport.clone());
    let (destination, credentials) = destination();

    let sample = coordinator.request_one_shot().await.unwrap();
    let receipt = client
        .upload_sample(&sample, &destination, &credentials)
        .await
        .unwrap();

    assert_eq!(receipt.status, 201);
    let bodies = transport.bodies();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].starts_with('['));
    assert!(bodies[0].contains(r#""source":"manual""#));
    assert!(bodies[0].contains(r#""timestamp":"2024-01-01T00:00:00Z""#));
}

#[tokio::test]
async fn test_upload_rejected_and_invalid() {
    let transport = RecordingTransport::new(401);
    let client = UploadClient::new(transport.clone());
    let (destination, credentials) = destination();

    let record = LocationRecord::new(12.9, 77.6, "manual", "2024-01-01T00:00:00Z");
    let err = client
        .upload(&record, &destination, &credentials)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));

    let missing_longitude = LocationRecord {
        longitude: None,
        ..record
    };
    let err = client
        .upload(&missing_longitude, &destination, &credentials)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::InvalidSample(_)));
    assert_eq!(transport.bodies().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_auto_upload_background_only() {
    let (coordinator, _) = coordinator(StaticPermissions::granted());
    let transport = RecordingTransport::new(201);
    let client = Arc::new(UploadClient::new(transport.clone()));
    let (destination, credentials) = destination();

    let uploader = AutoUploader::attach(
        &coordinator,
        client,
        AutoUploadConfig {
            destination,
            credentials,
            sources: vec![SampleSource::Background],
        },
    )
    .unwrap();

    coordinator.request_one_shot().await.unwrap();
    coordinator
        .start_tracking(TrackingMode::Background)
        .await
        .unwrap();
    run_track().await;

    let stats = uploader.detach();
    assert_eq!(stats.attempted, 5);
    assert_eq!(stats.succeeded, 5);
    assert_eq!(stats.failed, 0);
    assert!(transport
        .bodies()
        .iter()
        .all(|body| body.contains(r#""source":"background""#)));
}
