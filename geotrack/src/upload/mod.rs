//! Location Upload Module
//!
//! Sends location records to a remote HTTP collector as a JSON array with
//! bearer authentication.
//!
//! # Components
//!
//! - [`record`] - `LocationRecord` (caller input) and validated `UploadRecord`
//! - [`client`] - `UploadClient`, `Destination`, `Credentials`, `UploadReceipt`
//! - [`transport`] - `UploadTransport` seam and the `reqwest` implementation
//! - [`auto`] - opt-in `AutoUploader` attached to a coordinator
//!
//! Uploads are single attempts. Whether and when to upload is the caller's
//! decision: call [`UploadClient::upload`] directly or attach an
//! [`AutoUploader`].

mod auto;
mod client;
mod error;
mod record;
mod transport;

pub use auto::{AutoUploadConfig, AutoUploadStats, AutoUploader};
pub use client::{Credentials, Destination, UploadClient, UploadReceipt};
pub use error::UploadError;
pub use record::{LocationRecord, UploadRecord};
pub use transport::{ReqwestTransport, TransportResponse, UploadTransport, DEFAULT_UPLOAD_TIMEOUT};
