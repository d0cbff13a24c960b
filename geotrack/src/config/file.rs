//! Configuration file handling for ~/.geotrack/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use ini::Ini;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub use super::settings::*;

use crate::location::{CoordinatorConfig, FetchOptions, WatchOptions};
use crate::upload::{AutoUploadConfig, Credentials, Destination};

/// Environment variable overriding `[upload] bearer_token`.
pub const UPLOAD_TOKEN_ENV: &str = "GEOTRACK_UPLOAD_TOKEN";

/// Environment variable overriding `[upload] api_key`.
pub const UPLOAD_API_KEY_ENV: &str = "GEOTRACK_UPLOAD_API_KEY";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.geotrack/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.geotrack/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        let path = config_file_path();
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file at `path` if it doesn't exist.
    ///
    /// Returns true if a file was written.
    pub fn ensure_exists_at(path: &Path) -> Result<bool, ConfigFileError> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save_to(path)?;
        Ok(true)
    }

    /// Overlay credentials from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = value(UPLOAD_TOKEN_ENV) {
            self.upload.bearer_token = Some(token.trim().to_string());
        }
        if let Some(key) = value(UPLOAD_API_KEY_ENV) {
            self.upload.api_key = Some(key.trim().to_string());
        }
    }

    /// Coordinator configuration from `[tracking]` and `[background]`.
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        let tracking = &self.tracking;
        let background = &self.background;

        CoordinatorConfig {
            history_capacity: tracking.history_capacity,
            fetch: FetchOptions {
                high_accuracy: tracking.high_accuracy,
                timeout: Duration::from_secs(tracking.fetch_timeout),
                maximum_age: Duration::from_secs(tracking.maximum_age),
            },
            foreground: WatchOptions {
                high_accuracy: tracking.high_accuracy,
                distance_filter_m: tracking.foreground_distance_filter,
                interval: Duration::from_millis(tracking.foreground_interval_ms),
                fastest_interval: Duration::from_millis(tracking.foreground_interval_ms),
                ..WatchOptions::foreground()
            },
            background: WatchOptions {
                high_accuracy: tracking.high_accuracy,
                distance_filter_m: background.distance_filter,
                interval: Duration::from_millis(background.interval_ms),
                fastest_interval: Duration::from_millis(background.fastest_interval_ms),
                stationary_radius_m: background.stationary_radius,
            },
        }
    }
}

impl UploadSettings {
    /// Destination and credentials, if both an endpoint and a token are set.
    pub fn target(&self) -> Option<(Destination, Credentials)> {
        let endpoint = self.endpoint.as_ref()?;
        let token = self.bearer_token.as_ref()?;

        let destination = Destination {
            endpoint: endpoint.clone(),
            return_representation: self.return_representation,
        };
        let mut credentials = Credentials::bearer(token.clone());
        if let Some(key) = &self.api_key {
            credentials = credentials.with_api_key(key.clone());
        }
        Some((destination, credentials))
    }

    /// Auto-upload configuration, if auto-upload is enabled and a target is set.
    pub fn auto_upload(&self) -> Option<AutoUploadConfig> {
        if !self.auto {
            return None;
        }
        let (destination, credentials) = self.target()?;
        Some(AutoUploadConfig {
            destination,
            credentials,
            sources: self.auto_sources.clone(),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Get the path to the config directory (~/.geotrack).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".geotrack")
}

/// Get the path to the config file (~/.geotrack/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
