//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation. Tracking defaults match the provider defaults in
//! [`crate::location::WatchOptions`].

use super::file::config_directory;
use super::settings::*;
use crate::location::DEFAULT_HISTORY_CAPACITY;
use crate::logging::{default_log_dir, default_log_file};

// =============================================================================
// Tracking
// =============================================================================

/// Default one-shot timeout (seconds).
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

/// Default maximum age of a cached one-shot fix (seconds).
pub const DEFAULT_MAXIMUM_AGE_SECS: u64 = 10;

/// Default foreground update interval (milliseconds).
pub const DEFAULT_FOREGROUND_INTERVAL_MS: u64 = 3_000;

/// Default foreground distance filter (meters).
pub const DEFAULT_FOREGROUND_DISTANCE_FILTER_M: f64 = 0.0;

// =============================================================================
// Background
// =============================================================================

/// Default background update interval (milliseconds).
pub const DEFAULT_BACKGROUND_INTERVAL_MS: u64 = 10_000;

/// Default fastest background interval (milliseconds).
pub const DEFAULT_BACKGROUND_FASTEST_INTERVAL_MS: u64 = 5_000;

/// Default background distance filter (meters).
pub const DEFAULT_BACKGROUND_DISTANCE_FILTER_M: f64 = 50.0;

/// Default stationary radius (meters).
pub const DEFAULT_STATIONARY_RADIUS_M: f64 = 50.0;

// =============================================================================
// Upload
// =============================================================================

/// Default upload request timeout (seconds).
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 15;

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            tracking: TrackingSettings {
                history_capacity: DEFAULT_HISTORY_CAPACITY,
                high_accuracy: true,
                fetch_timeout: DEFAULT_FETCH_TIMEOUT_SECS,
                maximum_age: DEFAULT_MAXIMUM_AGE_SECS,
                foreground_interval_ms: DEFAULT_FOREGROUND_INTERVAL_MS,
                foreground_distance_filter: DEFAULT_FOREGROUND_DISTANCE_FILTER_M,
            },
            background: BackgroundSettings {
                interval_ms: DEFAULT_BACKGROUND_INTERVAL_MS,
                fastest_interval_ms: DEFAULT_BACKGROUND_FASTEST_INTERVAL_MS,
                distance_filter: DEFAULT_BACKGROUND_DISTANCE_FILTER_M,
                stationary_radius: DEFAULT_STATIONARY_RADIUS_M,
            },
            upload: UploadSettings {
                endpoint: None,
                bearer_token: None,
                api_key: None,
                timeout: DEFAULT_UPLOAD_TIMEOUT_SECS,
                return_representation: true,
                auto: false,
                auto_sources: Vec::new(),
            },
            logging: LoggingSettings {
                directory: config_directory().join(default_log_dir()),
                file: default_log_file().to_string(),
                console: false,
                debug: false,
            },
        }
    }
}
