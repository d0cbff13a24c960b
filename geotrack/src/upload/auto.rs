//! Automatic upload of coordinator samples.
//!
//! The [`AutoUploader`] subscribes to a coordinator and spawns one upload task
//! per accepted sample on the runtime it was attached from. Outcomes are
//! logged and counted; failures are not retried and samples are not queued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::runtime::{Handle, TryCurrentError};

use super::client::{Credentials, Destination, UploadClient};
use super::transport::UploadTransport;
use crate::location::{
    LocationCoordinator, LocationSource, PermissionProvider, SampleSource, Subscription,
};

/// What the auto-uploader sends and where.
#[derive(Debug, Clone)]
pub struct AutoUploadConfig {
    pub destination: Destination,
    pub credentials: Credentials,
    /// Sources to upload; empty uploads every sample.
    pub sources: Vec<SampleSource>,
}

impl AutoUploadConfig {
    fn accepts(&self, source: SampleSource) -> bool {
        self.sources.is_empty() || self.sources.contains(&source)
    }
}

/// Snapshot of auto-upload outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoUploadStats {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl AutoUploadStats {
    /// Uploads still running.
    ///
    /// The counters are read one at a time, so a snapshot may show more
    /// finished than attempted uploads; that reads as zero.
    pub fn in_flight(&self) -> u64 {
        self.attempted
            .saturating_sub(self.succeeded)
            .saturating_sub(self.failed)
    }
}

#[derive(Debug, Default)]
struct Counters {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

/// Uploads every accepted sample the coordinator publishes.
///
/// Dropping the uploader (or calling [`AutoUploader::detach`]) unsubscribes;
/// uploads already spawned run to completion.
#[derive(Debug)]
pub struct AutoUploader {
    subscription: Subscription,
    counters: Arc<Counters>,
}

impl AutoUploader {
    /// Subscribe to `coordinator`, spawning uploads on the current runtime.
    ///
    /// Fails if called outside a tokio runtime.
    pub fn attach<S, P, T>(
        coordinator: &LocationCoordinator<S, P>,
        client: Arc<UploadClient<T>>,
        config: AutoUploadConfig,
    ) -> Result<Self, TryCurrentError>
    where
        S: LocationSource,
        P: PermissionProvider,
        T: UploadTransport + 'static,
    {
        let handle = Handle::try_current()?;
        let counters = Arc::new(Counters::default());
        let config = Arc::new(config);

        tracing::info!(
            endpoint = %config.destination.endpoint,
            sources = ?config.sources,
            "Auto-upload attached"
        );

        let listener_counters = Arc::clone(&counters);
        let subscription = coordinator.subscribe(move |sample| {
            if !config.accepts(sample.source()) {
                return;
            }

            listener_counters.attempted.fetch_add(1, Ordering::SeqCst);
            let sample = Arc::clone(sample);
            let client = Arc::clone(&client);
            let config = Arc::clone(&config);
            let counters = Arc::clone(&listener_counters);

            handle.spawn(async move {
                match client
                    .upload_sample(&sample, &config.destination, &config.credentials)
                    .await
                {
                    Ok(receipt) => {
                        counters.succeeded.fetch_add(1, Ordering::SeqCst);
                        tracing::debug!(status = receipt.status, "Auto-upload complete");
                    }
                    Err(e) => {
                        counters.failed.fetch_add(1, Ordering::SeqCst);
                        tracing::warn!(
                            error = %e,
                            source = %sample.source(),
                            "Auto-upload failed"
                        );
                    }
                }
            });
        });

        Ok(Self {
            subscription,
            counters,
        })
    }

    pub fn stats(&self) -> AutoUploadStats {
        AutoUploadStats {
            attempted: self.counters.attempted.load(Ordering::SeqCst),
            succeeded: self.counters.succeeded.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
        }
    }

    /// Stop uploading new samples and return the final counts so far.
    pub fn detach(self) -> AutoUploadStats {
        let stats = self.stats();
        self.subscription.unsubscribe();
        tracing::info!(
            attempted = stats.attempted,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "Auto-upload detached"
        );
        stats
    }
}
