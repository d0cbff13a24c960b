//! Error types for location coordination.

use thiserror::Error;

use super::state::TrackingMode;

/// Errors surfaced by the location coordinator.
///
/// Permission and provider errors are reported to the caller and never
/// retried automatically.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    /// The user declined the permission prompt for this mode.
    #[error("{mode} location permission denied")]
    PermissionDenied { mode: TrackingMode },

    /// The permission was permanently declined; re-prompting will not help.
    #[error("{mode} location permission permanently denied, enable it in system settings")]
    PermissionDeniedForever { mode: TrackingMode },

    /// The provider failed or timed out.
    #[error("Location provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A provider payload could not be turned into a sample.
    #[error("Malformed location sample: {0}")]
    MalformedSample(String),

    /// A later `start_tracking` or `stop_tracking` won while this start was pending.
    #[error("Tracking request superseded by a later start or stop")]
    Superseded,
}

impl LocationError {
    /// True for permission failures that the UI should route to a prompt or settings.
    pub fn is_permission(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. } | Self::PermissionDeniedForever { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LocationError::PermissionDeniedForever {
            mode: TrackingMode::Background,
        };
        assert!(err.to_string().starts_with("background location permission"));
        assert!(err.is_permission());

        let err = LocationError::ProviderUnavailable("timed out".into());
        assert_eq!(err.to_string(), "Location provider unavailable: timed out");
        assert!(!err.is_permission());
    }
}
