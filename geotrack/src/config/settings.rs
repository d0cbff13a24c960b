//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

use crate::location::SampleSource;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// One-shot and foreground tracking settings
    pub tracking: TrackingSettings,
    /// Background tracking settings
    pub background: BackgroundSettings,
    /// Upload destination and credentials
    pub upload: UploadSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// `[tracking]` configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSettings {
    /// Samples retained in history
    pub history_capacity: usize,
    /// Request GPS-grade accuracy
    pub high_accuracy: bool,
    /// One-shot timeout in seconds
    pub fetch_timeout: u64,
    /// Maximum age of a cached one-shot fix in seconds
    pub maximum_age: u64,
    /// Foreground update interval in milliseconds
    pub foreground_interval_ms: u64,
    /// Foreground distance filter in meters (0 = every update)
    pub foreground_distance_filter: f64,
}

/// `[background]` configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundSettings {
    /// Update interval in milliseconds
    pub interval_ms: u64,
    /// Fastest accepted interval in milliseconds
    pub fastest_interval_ms: u64,
    /// Distance filter in meters
    pub distance_filter: f64,
    /// Stationary radius in meters
    pub stationary_radius: f64,
}

/// `[upload]` configuration.
#[derive(Clone, PartialEq)]
pub struct UploadSettings {
    /// Collector endpoint URL
    pub endpoint: Option<String>,
    /// Bearer token for the Authorization header
    pub bearer_token: Option<String>,
    /// Optional `apikey` header value
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Ask the collector to echo stored records
    pub return_representation: bool,
    /// Upload streamed samples automatically while tracking
    pub auto: bool,
    /// Sources uploaded automatically (empty = all)
    pub auto_sources: Vec<SampleSource>,
}

impl std::fmt::Debug for UploadSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("UploadSettings")
            .field("endpoint", &self.endpoint)
            .field("bearer_token", &redact(&self.bearer_token))
            .field("api_key", &redact(&self.api_key))
            .field("timeout", &self.timeout)
            .field("return_representation", &self.return_representation)
            .field("auto", &self.auto)
            .field("auto_sources", &self.auto_sources)
            .finish()
    }
}

/// `[logging]` configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log directory
    pub directory: PathBuf,
    /// Log file name
    pub file: String,
    /// Mirror logs to stderr
    pub console: bool,
    /// Default to debug level
    pub debug: bool,
}
