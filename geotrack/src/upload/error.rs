//! Error types for location uploads.

use thiserror::Error;

/// Errors that can occur when uploading a location record.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The record failed validation; nothing was sent.
    #[error("Invalid location record: {0}")]
    InvalidSample(String),

    /// The request could not be delivered (connect, timeout, body read).
    #[error("Upload request failed: {0}")]
    Network(String),

    /// The destination answered with a non-2xx status.
    #[error("Upload rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The request body could not be encoded.
    #[error("Failed to encode upload body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl UploadError {
    /// True if nothing reached the network.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::InvalidSample(_) | Self::Encode(_))
    }

    /// HTTP status of a rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display_includes_status_and_body() {
        let err = UploadError::Rejected {
            status: 401,
            body: r#"{"message":"Invalid API key"}"#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"Upload rejected with HTTP 401: {"message":"Invalid API key"}"#
        );
        assert_eq!(err.status(), Some(401));
        assert!(!err.is_local());
    }

    #[test]
    fn test_invalid_sample_is_local() {
        assert!(UploadError::InvalidSample("missing longitude".into()).is_local());
        assert!(!UploadError::Network("connection refused".into()).is_local());
    }
}
