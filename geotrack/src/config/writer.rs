//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let endpoint = config.upload.endpoint.as_deref().unwrap_or("");
    let bearer_token = config.upload.bearer_token.as_deref().unwrap_or("");
    let api_key = config.upload.api_key.as_deref().unwrap_or("");
    let auto_sources = config
        .upload
        .auto_sources
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"[tracking]
; Number of recent samples kept in memory (default: 100)
history_capacity = {}
; Request GPS-grade accuracy from the provider
high_accuracy = {}
; Seconds to wait for a one-shot fix before giving up (default: 15)
fetch_timeout = {}
; Accept a cached one-shot fix up to this many seconds old (default: 10)
maximum_age = {}
; Foreground update interval in milliseconds (default: 3000)
foreground_interval_ms = {}
; Foreground distance filter in meters, 0 reports every update (default: 0)
foreground_distance_filter = {}

[background]
; Background update interval in milliseconds (default: 10000)
interval_ms = {}
; Fastest update interval the app accepts in milliseconds (default: 5000)
fastest_interval_ms = {}
; Minimum movement in meters between background updates (default: 50)
distance_filter = {}
; Radius in meters the device must leave to wake a stationary provider (default: 50)
stationary_radius = {}

[upload]
; Collector endpoint receiving a JSON array of location records
; Example: endpoint = https://<project>.example.co/rest/v1/locations
endpoint = {}
; Bearer token sent as "Authorization: Bearer <token>"
; May also be supplied through the GEOTRACK_UPLOAD_TOKEN environment variable
bearer_token = {}
; Optional key sent in an "apikey" header (some REST collectors require both)
api_key = {}
; Request timeout in seconds (default: 15)
timeout = {}
; Ask the collector to echo stored records ("Prefer: return=representation")
return_representation = {}
; Upload samples automatically while tracking (default: false)
auto = {}
; Sources to upload automatically: manual, foreground, background
; Empty uploads every sample
auto_sources = {}

[logging]
; Log directory (default: ~/.geotrack/logs)
directory = {}
; Log file name, cleared at the start of each session
file = {}
; Mirror log output to stderr
console = {}
; Log at debug level unless RUST_LOG is set
debug = {}
"#,
        config.tracking.history_capacity,
        config.tracking.high_accuracy,
        config.tracking.fetch_timeout,
        config.tracking.maximum_age,
        config.tracking.foreground_interval_ms,
        config.tracking.foreground_distance_filter,
        config.background.interval_ms,
        config.background.fastest_interval_ms,
        config.background.distance_filter,
        config.background.stationary_radius,
        endpoint,
        bearer_token,
        api_key,
        config.upload.timeout,
        config.upload.return_representation,
        config.upload.auto,
        auto_sources,
        path_to_string(&config.logging.directory),
        config.logging.file,
        config.logging.console,
        config.logging.debug,
    )
}

/// Convert a path to a string, replacing home directory with ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
