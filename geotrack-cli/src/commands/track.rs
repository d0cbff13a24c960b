//! Track command - continuous foreground or background tracking.
//!
//! Prints every sample the coordinator publishes until the duration elapses,
//! the replayed track ends, or Ctrl+C is pressed.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use geotrack::location::{LocationSample, TrackingMode, TrackingState};
use geotrack::upload::{AutoUploadConfig, AutoUploadStats, AutoUploader};
use tokio::sync::watch;
use tracing::{info, warn};

use super::common::{format_sample, upload_client, Coordinator, ModeArg, SourceArgs, TargetArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Longest wait for in-flight uploads after tracking stops.
const UPLOAD_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Arguments for the track command.
#[derive(Debug, Args)]
pub struct TrackArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Tracking mode
    #[arg(long, value_enum, default_value = "foreground")]
    pub mode: ModeArg,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECS")]
    pub duration: Option<u64>,

    /// Switch to the other mode after this many seconds
    #[arg(long, value_name = "SECS")]
    pub switch_after: Option<u64>,

    /// Upload every sample while tracking (overrides [upload] auto)
    #[arg(long)]
    pub upload: bool,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Why tracking ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Duration,
    Interrupted,
    TrackEnded,
}

/// Run the track command.
pub fn run(args: TrackArgs, config_path: Option<&Path>, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path, debug)?;
    runner.log_startup("track");

    let coordinator = args.source.coordinator(&runner)?;
    let auto_upload = auto_upload_config(&args, &runner)?;

    runner.block_on(track(&runner, coordinator, &args, auto_upload))?
}

/// Explicit `--upload` wins; otherwise `[upload] auto` decides.
fn auto_upload_config(
    args: &TrackArgs,
    runner: &CliRunner,
) -> Result<Option<AutoUploadConfig>, CliError> {
    let settings = &runner.config().upload;
    if args.upload {
        let (destination, credentials) = args.target.resolve(settings)?;
        return Ok(Some(AutoUploadConfig {
            destination,
            credentials,
            sources: settings.auto_sources.clone(),
        }));
    }
    Ok(settings.auto_upload())
}

async fn track(
    runner: &CliRunner,
    coordinator: Coordinator,
    args: &TrackArgs,
    auto_upload: Option<AutoUploadConfig>,
) -> Result<(), CliError> {
    let received = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&received);
    let printer = coordinator.subscribe(move |sample: &Arc<LocationSample>| {
        counter.fetch_add(1, Ordering::SeqCst);
        println!("{}", format_sample(sample));
    });

    let uploader = match auto_upload {
        Some(config) => {
            let client = Arc::new(upload_client(&runner.config().upload)?);
            let uploader = AutoUploader::attach(&coordinator, client, config)
                .map_err(|e| CliError::Runtime(io::Error::other(e)))?;
            Some(uploader)
        }
        None => None,
    };

    let mode = TrackingMode::from(args.mode);
    coordinator.start_tracking(mode).await?;
    println!("Tracking in {} mode (Ctrl+C to stop)", mode);

    let first_leg = match (args.switch_after, args.duration) {
        (Some(switch), Some(total)) => Some(switch.min(total)),
        (Some(switch), None) => Some(switch),
        (None, total) => total,
    };
    let mut reason = wait_for_stop(coordinator.watch_state(), first_leg).await;

    let switch = args
        .switch_after
        .filter(|switch| args.duration.map_or(true, |total| *switch < total));
    if let (StopReason::Duration, Some(switch)) = (reason, switch) {
        let other = match mode {
            TrackingMode::Foreground => TrackingMode::Background,
            TrackingMode::Background => TrackingMode::Foreground,
        };
        coordinator.start_tracking(other).await?;
        println!("Switched to {} mode", other);

        let remaining = args.duration.map(|total| total - switch);
        reason = wait_for_stop(coordinator.watch_state(), remaining).await;
    }

    coordinator.stop_tracking();
    printer.unsubscribe();

    let count = received.load(Ordering::SeqCst);
    info!(?reason, samples = count, "Tracking stopped");
    match reason {
        StopReason::Duration => println!("Duration elapsed."),
        StopReason::Interrupted => println!("Interrupted."),
        StopReason::TrackEnded => println!("Track ended."),
    }
    println!(
        "{} samples received, {} kept in history",
        count,
        coordinator.history_len()
    );

    if let Some(uploader) = uploader {
        let stats = drain(uploader).await;
        println!(
            "Uploads: {} attempted, {} succeeded, {} failed",
            stats.attempted, stats.succeeded, stats.failed
        );
    }

    Ok(())
}

/// Wait for Ctrl+C, the end of the provider stream, or `secs` seconds if set.
async fn wait_for_stop(mut state: watch::Receiver<TrackingState>, secs: Option<u64>) -> StopReason {
    let deadline = async {
        match secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };

    let ended = async {
        loop {
            if state.borrow_and_update().is_idle() {
                return;
            }
            if state.changed().await.is_err() {
                return;
            }
        }
    };

    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = deadline => StopReason::Duration,
        _ = ended => StopReason::TrackEnded,
        _ = interrupted => StopReason::Interrupted,
    }
}

/// Wait for in-flight uploads, then detach.
async fn drain(uploader: AutoUploader) -> AutoUploadStats {
    let deadline = tokio::time::Instant::now() + UPLOAD_DRAIN_TIMEOUT;
    while uploader.stats().in_flight() > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    uploader.detach()
}
