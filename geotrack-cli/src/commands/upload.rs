//! Upload command - send a single location record to the collector.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use clap::Args;
use geotrack::upload::LocationRecord;

use super::common::{upload_client, TargetArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the upload command.
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Horizontal accuracy in meters
    #[arg(long)]
    pub accuracy: Option<f64>,

    /// Ground speed in meters per second
    #[arg(long)]
    pub speed: Option<f64>,

    /// Heading in degrees from true north
    #[arg(long)]
    pub heading: Option<f64>,

    /// Sample source: manual, foreground or background
    #[arg(long, default_value = "manual")]
    pub source: String,

    /// RFC 3339 timestamp (defaults to now)
    #[arg(long)]
    pub timestamp: Option<String>,

    #[command(flatten)]
    pub target: TargetArgs,
}

impl UploadArgs {
    /// Build the record to upload. Validation happens in the upload client.
    pub fn record(&self) -> LocationRecord {
        let timestamp = self
            .timestamp
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

        LocationRecord {
            accuracy: self.accuracy,
            speed: self.speed,
            heading: self.heading,
            ..LocationRecord::new(self.lat, self.lon, self.source.clone(), timestamp)
        }
    }
}

/// Run the upload command.
pub fn run(args: UploadArgs, config_path: Option<&Path>, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path, debug)?;
    runner.log_startup("upload");

    let settings = &runner.config().upload;
    let (destination, credentials) = args.target.resolve(settings)?;
    let client = upload_client(settings)?;
    let record = args.record();

    let receipt = runner.block_on(client.upload(&record, &destination, &credentials))??;

    println!("Uploaded to {} (HTTP {})", destination.endpoint, receipt.status);
    for stored in &receipt.records {
        println!("  {}", stored);
    }
    Ok(())
}
