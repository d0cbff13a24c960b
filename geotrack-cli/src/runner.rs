//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and the async runtime
//! so command handlers only deal with their own work.

use std::future::Future;
use std::path::{Path, PathBuf};

use geotrack::config::{config_file_path, ConfigFile};
use geotrack::logging::{init_logging, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    /// Where the configuration was loaded from
    config_path: PathBuf,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Config file to load instead of ~/.geotrack/config.ini
    /// * `debug_mode` - When true, enables debug-level logging unless RUST_LOG is set
    pub fn new(config_path: Option<&Path>, debug_mode: bool) -> Result<Self, CliError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);

        // Load config file (or use defaults if not present)
        let mut config = ConfigFile::load_from(&config_path)?;
        config.apply_env_overrides();

        let logging = &config.logging;
        let logging_guard = init_logging(
            &logging.directory,
            &logging.file,
            logging.console,
            debug_mode || logging.debug,
        )
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("geotrack v{}", geotrack::VERSION);
        info!(
            config = %self.config_path.display(),
            log = %self.logging_guard.log_path().display(),
            "geotrack CLI: {} command",
            command
        );
    }

    /// Run a future to completion on a fresh multi-threaded runtime.
    pub fn block_on<F: Future>(&self, future: F) -> Result<F::Output, CliError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("geotrack")
            .build()
            .map_err(CliError::Runtime)?;

        Ok(runtime.block_on(future))
    }
}
