//! Location Module
//!
//! This module provides a **single source of truth** for the device's current
//! location and tracking mode. Every provider (one-shot fetch, foreground
//! watch, background watch) reports through the [`LocationCoordinator`], which
//! normalizes raw payloads into [`LocationSample`]s, keeps the current sample
//! and a bounded history, and notifies subscribers.
//!
//! # Tracking modes
//!
//! At most one provider stream is open at any time:
//!
//! - **Idle** - no stream; one-shot fetches are still available
//! - **Foreground** - frequent high-accuracy updates (3 s, no distance filter)
//! - **Background** - battery-friendly updates (10 s, 50 m distance filter)
//!
//! Switching between foreground and background stops the current stream
//! before the new one is opened.
//!
//! # Usage
//!
//! ```ignore
//! use geotrack::location::{LocationCoordinator, ReplaySource, StaticPermissions, TrackingMode};
//!
//! let source = ReplaySource::from_path(Path::new("walk.jsonl"))?;
//! let coordinator = LocationCoordinator::new(source, StaticPermissions::granted());
//!
//! let _sub = coordinator.subscribe(|sample| {
//!     println!("{:.5}, {:.5} ({})", sample.latitude(), sample.longitude(), sample.source());
//! });
//!
//! coordinator.start_tracking(TrackingMode::Foreground).await?;
//! // ...
//! coordinator.stop_tracking();
//! ```
//!
//! # Components
//!
//! - [`state`] - `SampleSource`, `TrackingMode`, `TrackingState`
//! - [`sample`] - `LocationSample` and coordinate helpers
//! - [`raw`] - raw provider payload shapes
//! - [`normalize`] - raw payload to sample mapping
//! - [`history`] - bounded `SampleHistory`
//! - [`source`] - `LocationSource` and `PermissionProvider` traits
//! - [`listeners`] - subscriber registry and `Subscription` handles
//! - [`coordinator`] - `LocationCoordinator`
//! - [`replay`] - `ReplaySource` for recorded tracks

mod coordinator;
mod error;
mod history;
mod listeners;
mod normalize;
pub mod raw;
mod replay;
mod sample;
mod source;
mod state;

pub use coordinator::{CoordinatorConfig, LocationCoordinator};
pub use error::LocationError;
pub use history::{SampleHistory, DEFAULT_HISTORY_CAPACITY};
pub use listeners::{Listener, Subscription};
pub use normalize::normalize;
pub use raw::RawLocationEvent;
pub use replay::{ReplayError, ReplaySource};
pub use sample::{haversine_m, validate_coordinates, LocationSample};
pub use source::{
    FetchOptions, LocationSource, PermissionProvider, PermissionStatus, ProviderEvent,
    ProviderStream, SourceError, StaticPermissions, Unwatch, WatchOptions,
};
pub use state::{SampleSource, TrackingMode, TrackingState};
