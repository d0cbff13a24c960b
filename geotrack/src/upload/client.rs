//! Upload client.
//!
//! Validates a record, then sends it as a one-element JSON array in a single
//! POST. Authentication follows REST collector conventions: a bearer token,
//! plus an optional `apikey` header when the collector wants the key twice.

use std::fmt;

use serde_json::Value;

use super::error::UploadError;
use super::record::{LocationRecord, UploadRecord};
use super::transport::UploadTransport;
use crate::location::LocationSample;

/// Where records are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Collector endpoint, e.g. `https://<project>.example.co/rest/v1/locations`.
    pub endpoint: String,

    /// Ask the collector to echo the stored records.
    pub return_representation: bool,
}

impl Destination {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            return_representation: true,
        }
    }
}

/// Upload credentials. Never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub bearer_token: String,
    pub api_key: Option<String>,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: token.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bearer_token", &"<redacted>")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Successful upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    /// HTTP status (2xx).
    pub status: u16,

    /// Records echoed by the collector; empty if it returned none.
    pub records: Vec<Value>,
}

/// Client posting location records through an [`UploadTransport`].
#[derive(Debug, Clone)]
pub struct UploadClient<T> {
    transport: T,
}

impl<T: UploadTransport> UploadClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Validate `record` and POST it to `destination`.
    ///
    /// Validation failures return [`UploadError::InvalidSample`] without any
    /// network call. Exactly one request is made otherwise; there is no retry.
    pub async fn upload(
        &self,
        record: &LocationRecord,
        destination: &Destination,
        credentials: &Credentials,
    ) -> Result<UploadReceipt, UploadError> {
        let record = record.validate()?;
        self.send(&record, destination, credentials).await
    }

    /// Upload a normalized sample.
    pub async fn upload_sample(
        &self,
        sample: &LocationSample,
        destination: &Destination,
        credentials: &Credentials,
    ) -> Result<UploadReceipt, UploadError> {
        self.upload(&LocationRecord::from(sample), destination, credentials)
            .await
    }

    async fn send(
        &self,
        record: &UploadRecord,
        destination: &Destination,
        credentials: &Credentials,
    ) -> Result<UploadReceipt, UploadError> {
        let body = serde_json::to_string(&[record])?;
        let authorization = format!("Bearer {}", credentials.bearer_token);

        let mut headers: Vec<(&str, &str)> = vec![
            ("Content-Type", "application/json"),
            ("Authorization", authorization.as_str()),
        ];
        if let Some(key) = credentials.api_key.as_deref() {
            headers.push(("apikey", key));
        }
        if destination.return_representation {
            headers.push(("Prefer", "return=representation"));
        }

        let response = self
            .transport
            .post_json(&destination.endpoint, &headers, body)
            .await?;

        if !response.is_success() {
            tracing::warn!(
                endpoint = %destination.endpoint,
                status = response.status,
                "Location upload rejected"
            );
            return Err(UploadError::Rejected {
                status: response.status,
                body: response.body,
            });
        }

        let records = parse_echo(&response.body);
        tracing::info!(
            endpoint = %destination.endpoint,
            status = response.status,
            source = %record.source,
            echoed = records.len(),
            "Location uploaded"
        );

        Ok(UploadReceipt {
            status: response.status,
            records,
        })
    }
}

/// Records echoed in a response body. Empty or non-JSON bodies yield none.
fn parse_echo(body: &str) -> Vec<Value> {
    if body.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(body) {
        Ok(Value::Array(records)) => records,
        Ok(Value::Null) => Vec::new(),
        Ok(other) => vec![other],
        Err(e) => {
            tracing::debug!(error = %e, "Upload response body is not JSON");
            Vec::new()
        }
    }
}
