//! Configuration for geotrack.
//!
//! User settings live in `~/.geotrack/config.ini`:
//!
//! - `[tracking]` - history size, one-shot timeout, foreground watch options
//! - `[background]` - background watch options
//! - `[upload]` - collector endpoint, credentials, auto-upload
//! - `[logging]` - log directory and level
//!
//! # Example
//!
//! ```
//! use geotrack::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! let coordinator_config = config.coordinator_config();
//! assert_eq!(coordinator_config.history_capacity, 100);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use file::{
    config_directory, config_file_path, ConfigFileError, UPLOAD_API_KEY_ENV, UPLOAD_TOKEN_ENV,
};
pub use defaults::*;
pub use settings::{
    BackgroundSettings, ConfigFile, LoggingSettings, TrackingSettings, UploadSettings,
};
