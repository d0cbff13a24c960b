//! Core state types for location tracking.
//!
//! - [`SampleSource`] - Which path produced a sample (manual fetch or a stream)
//! - [`TrackingMode`] - Which continuous stream the caller asked for
//! - [`TrackingState`] - What the coordinator is doing right now

use serde::{Deserialize, Serialize};

/// Origin of a location sample.
///
/// Stamped by the coordinator from the path that produced the event, never
/// taken from the provider payload itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleSource {
    /// One-shot fetch requested by the caller.
    Manual,
    /// Continuous updates while the app is in the foreground.
    Foreground,
    /// Continuous updates while the app is in the background.
    Background,
}

impl SampleSource {
    /// All sources, in wire-name order.
    pub const ALL: [SampleSource; 3] = [Self::Manual, Self::Foreground, Self::Background];

    /// Wire name used by upload records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Foreground => "foreground",
            Self::Background => "background",
        }
    }

    /// Look up a source by its wire name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for SampleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Continuous tracking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackingMode {
    /// Sample while the app is foregrounded.
    Foreground,
    /// Sample while the app is backgrounded.
    Background,
}

impl TrackingMode {
    /// Source tag stamped on samples produced by this mode's stream.
    pub fn sample_source(&self) -> SampleSource {
        match self {
            Self::Foreground => SampleSource::Foreground,
            Self::Background => SampleSource::Background,
        }
    }
}

impl std::fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Foreground => write!(f, "foreground"),
            Self::Background => write!(f, "background"),
        }
    }
}

/// Tracking state of the coordinator.
///
/// Exactly one provider stream is active in `Foreground` or `Background`;
/// none in `Idle`. A start that is still waiting on a permission prompt
/// reports `Idle` until it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingState {
    #[default]
    Idle,
    Foreground,
    Background,
}

impl TrackingState {
    /// The active mode, if any.
    pub fn mode(&self) -> Option<TrackingMode> {
        match self {
            Self::Idle => None,
            Self::Foreground => Some(TrackingMode::Foreground),
            Self::Background => Some(TrackingMode::Background),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl From<TrackingMode> for TrackingState {
    fn from(mode: TrackingMode) -> Self {
        match mode {
            TrackingMode::Foreground => Self::Foreground,
            TrackingMode::Background => Self::Background,
        }
    }
}

impl std::fmt::Display for TrackingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Foreground => write!(f, "foreground"),
            Self::Background => write!(f, "background"),
        }
    }
}
