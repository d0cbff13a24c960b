//! HTTP transport abstraction for uploads.
//!
//! The [`UploadTransport`] trait is the seam between the upload client and the
//! network, so tests can count and inspect requests without a server.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::error::UploadError;

/// Default request timeout for uploads.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for posting JSON bodies.
///
/// Implementations return any HTTP response, successful or not; only failures
/// to deliver the request map to [`UploadError::Network`].
pub trait UploadTransport: Send + Sync {
    /// POST `body` to `url` with the given headers.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `headers` - Slice of (header_name, header_value) tuples
    /// * `body` - JSON body
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: String,
    ) -> impl Future<Output = Result<TransportResponse, UploadError>> + Send;
}

/// Transport backed by an async `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with the default timeout.
    pub fn new() -> Result<Self, UploadError> {
        Self::with_timeout(DEFAULT_UPLOAD_TIMEOUT)
    }

    /// Creates a transport with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("geotrack/{}", crate::VERSION))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| UploadError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl UploadTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: String,
    ) -> Result<TransportResponse, UploadError> {
        trace!(url = url, bytes = body.len(), "HTTP POST request starting");

        let mut request = self.client.post(url).body(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = match request.send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(UploadError::Network(format!("Request failed: {}", e)));
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => Ok(TransportResponse { status, body }),
            Err(e) => {
                warn!(url = url, error = %e, "Failed to read response body");
                Err(UploadError::Network(format!(
                    "Failed to read response: {}",
                    e
                )))
            }
        }
    }
}
