//! geotrack - device location tracking with remote upload
//!
//! This library keeps a single source of truth for a device's location,
//! switching between one-shot fixes, foreground tracking and background
//! tracking, and uploads samples to an HTTP collector.
//!
//! # High-Level API
//!
//! ```ignore
//! use geotrack::location::{LocationCoordinator, ReplaySource, StaticPermissions, TrackingMode};
//! use geotrack::upload::{Credentials, Destination, ReqwestTransport, UploadClient};
//!
//! let coordinator = LocationCoordinator::new(source, StaticPermissions::granted());
//! let sample = coordinator.request_one_shot().await?;
//!
//! let client = UploadClient::new(ReqwestTransport::new()?);
//! client
//!     .upload_sample(&sample, &Destination::new(endpoint), &Credentials::bearer(token))
//!     .await?;
//! ```
//!
//! # Modules
//!
//! - [`location`] - coordinator, samples, provider traits, replay source
//! - [`upload`] - upload client and auto-uploader
//! - [`config`] - `~/.geotrack/config.ini`
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod location;
pub mod logging;
pub mod upload;

/// Version of the geotrack library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
