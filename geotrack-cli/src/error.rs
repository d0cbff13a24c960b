//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use geotrack::config::ConfigFileError;
use geotrack::location::{LocationError, ReplayError};
use geotrack::upload::UploadError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to load or save the config file
    ConfigFile(ConfigFileError),
    /// Failed to load the replay track
    Replay(ReplayError),
    /// Location request failed
    Location(LocationError),
    /// Upload failed
    Upload(UploadError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Location(LocationError::PermissionDeniedForever { .. }) => {
                eprintln!();
                eprintln!("Location access was permanently denied.");
                eprintln!("Enable it in the system settings, then try again.");
            }
            CliError::Upload(UploadError::Rejected { status: 401 | 403, .. }) => {
                eprintln!();
                eprintln!("The collector rejected the credentials. Check:");
                eprintln!("  1. [upload] bearer_token in config.ini (or GEOTRACK_UPLOAD_TOKEN)");
                eprintln!("  2. [upload] api_key if the collector requires one");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Run 'geotrack init' to create a config file, then edit [upload].");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Replay(e) => write!(f, "Failed to load track: {}", e),
            CliError::Location(e) => write!(f, "Location request failed: {}", e),
            CliError::Upload(e) => write!(f, "Upload failed: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Replay(e) => Some(e),
            CliError::Location(e) => Some(e),
            CliError::Upload(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<ReplayError> for CliError {
    fn from(e: ReplayError) -> Self {
        CliError::Replay(e)
    }
}

impl From<LocationError> for CliError {
    fn from(e: LocationError) -> Self {
        CliError::Location(e)
    }
}

impl From<UploadError> for CliError {
    fn from(e: UploadError) -> Self {
        CliError::Upload(e)
    }
}
