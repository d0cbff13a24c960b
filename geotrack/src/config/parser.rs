//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::location::SampleSource;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [tracking] section
    if let Some(section) = ini.section(Some("tracking")) {
        if let Some(v) = section.get("history_capacity") {
            config.tracking.history_capacity = parse_positive(v)
                .map(|n| n as usize)
                .ok_or_else(|| invalid("tracking", "history_capacity", v, "must be a positive integer"))?;
        }
        if let Some(v) = section.get("high_accuracy") {
            config.tracking.high_accuracy = parse_bool(v);
        }
        if let Some(v) = section.get("fetch_timeout") {
            config.tracking.fetch_timeout = parse_positive(v).ok_or_else(|| {
                invalid("tracking", "fetch_timeout", v, "must be a positive integer (seconds)")
            })?;
        }
        if let Some(v) = section.get("maximum_age") {
            config.tracking.maximum_age = v.trim().parse().map_err(|_| {
                invalid("tracking", "maximum_age", v, "must be a non-negative integer (seconds)")
            })?;
        }
        if let Some(v) = section.get("foreground_interval_ms") {
            config.tracking.foreground_interval_ms = parse_positive(v).ok_or_else(|| {
                invalid(
                    "tracking",
                    "foreground_interval_ms",
                    v,
                    "must be a positive integer (milliseconds)",
                )
            })?;
        }
        if let Some(v) = section.get("foreground_distance_filter") {
            config.tracking.foreground_distance_filter = parse_meters(v).ok_or_else(|| {
                invalid("tracking", "foreground_distance_filter", v, METERS_REASON)
            })?;
        }
    }

    // [background] section
    if let Some(section) = ini.section(Some("background")) {
        if let Some(v) = section.get("interval_ms") {
            config.background.interval_ms = parse_positive(v).ok_or_else(|| {
                invalid("background", "interval_ms", v, "must be a positive integer (milliseconds)")
            })?;
        }
        if let Some(v) = section.get("fastest_interval_ms") {
            config.background.fastest_interval_ms = parse_positive(v).ok_or_else(|| {
                invalid(
                    "background",
                    "fastest_interval_ms",
                    v,
                    "must be a positive integer (milliseconds)",
                )
            })?;
        }
        if let Some(v) = section.get("distance_filter") {
            config.background.distance_filter = parse_meters(v)
                .ok_or_else(|| invalid("background", "distance_filter", v, METERS_REASON))?;
        }
        if let Some(v) = section.get("stationary_radius") {
            config.background.stationary_radius = parse_meters(v)
                .ok_or_else(|| invalid("background", "stationary_radius", v, METERS_REASON))?;
        }
    }

    // [upload] section
    if let Some(section) = ini.section(Some("upload")) {
        if let Some(v) = section.get("endpoint") {
            let v = v.trim();
            if !v.is_empty() {
                if !(v.starts_with("https://") || v.starts_with("http://")) {
                    return Err(invalid(
                        "upload",
                        "endpoint",
                        v,
                        "must be an http:// or https:// URL",
                    ));
                }
                config.upload.endpoint = Some(v.to_string());
            }
        }
        if let Some(v) = section.get("bearer_token") {
            config.upload.bearer_token = non_empty(v);
        }
        if let Some(v) = section.get("api_key") {
            config.upload.api_key = non_empty(v);
        }
        if let Some(v) = section.get("timeout") {
            config.upload.timeout = parse_positive(v).ok_or_else(|| {
                invalid("upload", "timeout", v, "must be a positive integer (seconds)")
            })?;
        }
        if let Some(v) = section.get("return_representation") {
            config.upload.return_representation = parse_bool(v);
        }
        if let Some(v) = section.get("auto") {
            config.upload.auto = parse_bool(v);
        }
        if let Some(v) = section.get("auto_sources") {
            config.upload.auto_sources = parse_sources(v).ok_or_else(|| {
                invalid(
                    "upload",
                    "auto_sources",
                    v,
                    "must be a comma-separated list of: manual, foreground, background",
                )
            })?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if v.is_empty() || v.contains(['/', '\\']) {
                return Err(invalid("logging", "file", v, "must be a plain file name"));
            }
            config.logging.file = v.to_string();
        }
        if let Some(v) = section.get("console") {
            config.logging.console = parse_bool(v);
        }
        if let Some(v) = section.get("debug") {
            config.logging.debug = parse_bool(v);
        }
    }

    Ok(config)
}

const METERS_REASON: &str = "must be a non-negative number (meters)";

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a strictly positive integer.
fn parse_positive(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|n| *n > 0)
}

/// Parse a finite, non-negative distance.
fn parse_meters(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|m| m.is_finite() && *m >= 0.0)
}

/// Parse a comma-separated source list. An empty value means "all sources".
fn parse_sources(value: &str) -> Option<Vec<SampleSource>> {
    let mut sources = Vec::new();
    for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let source = SampleSource::from_name(name)?;
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    Some(sources)
}

fn non_empty(value: &str) -> Option<String> {
    let v = value.trim();
    (!v.is_empty()).then(|| v.to_string())
}

/// Parse a boolean value from a config string.
///
/// Accepts: true/false, 1/0, yes/no, on/off (case-insensitive)
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
