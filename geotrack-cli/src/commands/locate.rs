//! Locate command - fetch a single fix.

use std::path::Path;

use clap::Args;
use tracing::info;

use super::common::{format_sample, upload_client, SourceArgs, TargetArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the locate command.
#[derive(Debug, Args)]
pub struct LocateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Upload the fix after printing it
    #[arg(long)]
    pub upload: bool,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Run the locate command.
pub fn run(args: LocateArgs, config_path: Option<&Path>, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path, debug)?;
    runner.log_startup("locate");

    let coordinator = args.source.coordinator(&runner)?;
    let target = if args.upload {
        Some(args.target.resolve(&runner.config().upload)?)
    } else {
        None
    };

    runner.block_on(async {
        let sample = coordinator.request_one_shot().await?;
        println!("{}", format_sample(&sample));

        if let Some((destination, credentials)) = target {
            let client = upload_client(&runner.config().upload)?;
            let receipt = client
                .upload_sample(&sample, &destination, &credentials)
                .await?;
            info!(status = receipt.status, "Fix uploaded");
            println!("Uploaded (HTTP {})", receipt.status);
        }

        Ok::<(), CliError>(())
    })?
}
