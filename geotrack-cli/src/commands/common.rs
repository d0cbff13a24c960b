//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use geotrack::config::UploadSettings;
use geotrack::location::{
    LocationCoordinator, LocationSample, PermissionStatus, ReplaySource, StaticPermissions,
    TrackingMode,
};
use geotrack::upload::{Credentials, Destination, ReqwestTransport, UploadClient};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Coordinator type used by every command.
pub type Coordinator = LocationCoordinator<ReplaySource, StaticPermissions>;

/// Permission answer for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PermissionArg {
    /// Permission prompt accepted
    Granted,
    /// Permission prompt declined
    Denied,
    /// Permission permanently declined in system settings
    DeniedForever,
}

impl From<PermissionArg> for PermissionStatus {
    fn from(arg: PermissionArg) -> Self {
        match arg {
            PermissionArg::Granted => PermissionStatus::Granted,
            PermissionArg::Denied => PermissionStatus::Denied,
            PermissionArg::DeniedForever => PermissionStatus::DeniedForever,
        }
    }
}

/// Tracking mode for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ModeArg {
    /// Frequent high-accuracy updates
    Foreground,
    /// Battery-friendly updates with a distance filter
    Background,
}

impl From<ModeArg> for TrackingMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Foreground => TrackingMode::Foreground,
            ModeArg::Background => TrackingMode::Background,
        }
    }
}

/// Location provider arguments shared by `locate` and `track`.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Recorded track to replay (JSON Lines of raw provider payloads)
    #[arg(long, value_name = "FILE")]
    pub replay: PathBuf,

    /// Answer to the foreground permission prompt
    #[arg(long, value_enum, default_value = "granted")]
    pub permission: PermissionArg,

    /// Answer to the background permission prompt (defaults to --permission)
    #[arg(long, value_enum)]
    pub background_permission: Option<PermissionArg>,
}

impl SourceArgs {
    pub fn permissions(&self) -> StaticPermissions {
        StaticPermissions {
            foreground: self.permission.into(),
            background: self.background_permission.unwrap_or(self.permission).into(),
        }
    }

    /// Load the replay track and build a coordinator from the runner's config.
    pub fn coordinator(&self, runner: &CliRunner) -> Result<Coordinator, CliError> {
        let source = ReplaySource::from_path(&self.replay)?;
        if source.is_empty() {
            return Err(CliError::Config(format!(
                "{} contains no location events",
                self.replay.display()
            )));
        }

        Ok(LocationCoordinator::with_config(
            source,
            self.permissions(),
            runner.config().coordinator_config(),
        ))
    }
}

/// Upload destination overrides shared by commands that upload.
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
    /// Collector endpoint (overrides [upload] endpoint)
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Bearer token (overrides [upload] bearer_token and GEOTRACK_UPLOAD_TOKEN)
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,
}

impl TargetArgs {
    /// Merge flags over the config file and return the upload target.
    pub fn resolve(&self, settings: &UploadSettings) -> Result<(Destination, Credentials), CliError> {
        let mut settings = settings.clone();
        if let Some(endpoint) = &self.endpoint {
            settings.endpoint = Some(endpoint.clone());
        }
        if let Some(token) = &self.token {
            settings.bearer_token = Some(token.clone());
        }

        if settings.endpoint.is_none() {
            return Err(CliError::Config(
                "No upload endpoint. Set [upload] endpoint in config.ini or use --endpoint"
                    .to_string(),
            ));
        }

        settings.target().ok_or_else(|| {
            CliError::Config(
                "No upload credentials. Set [upload] bearer_token, GEOTRACK_UPLOAD_TOKEN or use --token"
                    .to_string(),
            )
        })
    }
}

/// Build the HTTP upload client using the configured timeout.
pub fn upload_client(settings: &UploadSettings) -> Result<UploadClient<ReqwestTransport>, CliError> {
    let transport = ReqwestTransport::with_timeout(settings.timeout())?;
    Ok(UploadClient::new(transport))
}

/// Format a sample as a single output line.
pub fn format_sample(sample: &LocationSample) -> String {
    let mut line = format!(
        "{} {:>10}  {:.6}, {:.6}",
        sample.timestamp().format("%Y-%m-%dT%H:%M:%SZ"),
        sample.source().as_str(),
        sample.latitude(),
        sample.longitude()
    );

    if let Some(accuracy) = sample.accuracy() {
        line.push_str(&format!("  ±{:.0} m", accuracy));
    }
    if let Some(speed) = sample.speed() {
        line.push_str(&format!("  {:.1} m/s", speed));
    }
    if let Some(heading) = sample.heading() {
        line.push_str(&format!("  {:.0}°", heading));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use geotrack::config::ConfigFile;
    use geotrack::location::SampleSource;

    #[test]
    fn test_permission_arg_mapping() {
        let args = SourceArgs {
            replay: PathBuf::from("track.jsonl"),
            permission: PermissionArg::Granted,
            background_permission: Some(PermissionArg::DeniedForever),
        };
        let permissions = args.permissions();
        assert_eq!(permissions.foreground, PermissionStatus::Granted);
        assert_eq!(permissions.background, PermissionStatus::DeniedForever);

        let args = SourceArgs {
            background_permission: None,
            permission: PermissionArg::Denied,
            ..args
        };
        assert_eq!(
            args.permissions(),
            StaticPermissions::uniform(PermissionStatus::Denied)
        );
    }

    #[test]
    fn test_mode_arg_mapping() {
        assert_eq!(TrackingMode::from(ModeArg::Foreground), TrackingMode::Foreground);
        assert_eq!(TrackingMode::from(ModeArg::Background), TrackingMode::Background);
    }

    #[test]
    fn test_target_flags_override_config() {
        let mut settings = ConfigFile::default().upload;
        settings.endpoint = Some("https://config.test/locations".to_string());
        settings.bearer_token = Some("config-token".to_string());

        let (destination, credentials) = TargetArgs::default().resolve(&settings).unwrap();
        assert_eq!(destination.endpoint, "https://config.test/locations");
        assert_eq!(credentials.bearer_token, "config-token");

        let args = TargetArgs {
            endpoint: Some("https://flag.test/locations".to_string()),
            token: Some("flag-token".to_string()),
        };
        let (destination, credentials) = args.resolve(&settings).unwrap();
        assert_eq!(destination.endpoint, "https://flag.test/locations");
        assert_eq!(credentials.bearer_token, "flag-token");
    }

    #[test]
    fn test_target_requires_endpoint_and_token() {
        let settings = ConfigFile::default().upload;
        let err = TargetArgs::default().resolve(&settings).unwrap_err();
        assert!(err.to_string().contains("endpoint"));

        let args = TargetArgs {
            endpoint: Some("https://flag.test/locations".to_string()),
            token: None,
        };
        let err = args.resolve(&settings).unwrap_err();
        assert!(err.to_string().contains("credentials"));
    }

    #[test]
    fn test_format_sample() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let sample = LocationSample::new(12.9, 77.6, timestamp, SampleSource::Foreground)
            .unwrap()
            .with_accuracy(Some(5.0));

        let line = format_sample(&sample);
        assert!(line.starts_with("2024-01-01T12:00:00Z"));
        assert!(line.contains("foreground"));
        assert!(line.contains("12.900000, 77.600000"));
        assert!(line.contains("±5 m"));
        assert!(!line.contains("m/s"));
    }
}
