//! Init command - write a default config file.

use std::path::Path;

use clap::Args;
use geotrack::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Arguments for the init command.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file with defaults
    #[arg(long)]
    pub force: bool,
}

/// Run the init command.
pub fn run(args: InitArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);

    if args.force {
        ConfigFile::default().save_to(&path)?;
        println!("Wrote default config to {}", path.display());
    } else if ConfigFile::ensure_exists_at(&path)? {
        println!("Created {}", path.display());
    } else {
        println!("Config already exists at {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    println!();
    println!("Set [upload] endpoint and bearer_token before uploading,");
    println!("or export GEOTRACK_UPLOAD_TOKEN instead of storing the token.");
    Ok(())
}
