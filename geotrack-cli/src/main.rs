//! geotrack CLI - device location tracking with remote upload.
//!
//! Location input comes from a recorded track (`--replay`), so every command
//! runs the same coordinator the library exposes to apps.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::init::InitArgs;
use commands::locate::LocateArgs;
use commands::track::TrackArgs;
use commands::upload::UploadArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "geotrack")]
#[command(version = geotrack::VERSION)]
#[command(about = "Track device location and upload samples to a collector", long_about = None)]
struct Cli {
    /// Config file (default: ~/.geotrack/config.ini)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a single location fix
    Locate(LocateArgs),

    /// Track location continuously in foreground or background mode
    Track(TrackArgs),

    /// Upload a single location record
    Upload(UploadArgs),

    /// Create ~/.geotrack/config.ini with default settings
    Init(InitArgs),
}

fn main() {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result: Result<(), CliError> = match cli.command {
        Commands::Locate(args) => commands::locate::run(args, config, cli.debug),
        Commands::Track(args) => commands::track::run(args, config, cli.debug),
        Commands::Upload(args) => commands::upload::run(args, config, cli.debug),
        Commands::Init(args) => commands::init::run(args, config),
    };

    if let Err(e) = result {
        e.exit();
    }
}
