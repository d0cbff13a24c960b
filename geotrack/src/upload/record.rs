//! Upload records.
//!
//! [`LocationRecord`] is what callers hand to the uploader: every field may be
//! missing, as when a record is assembled from loosely-typed UI state.
//! [`LocationRecord::validate`] turns it into an [`UploadRecord`], the exact
//! shape sent on the wire:
//!
//! ```json
//! {"latitude": 12.9, "longitude": 77.6, "accuracy": null, "speed": null,
//!  "heading": null, "source": "manual", "timestamp": "2024-01-01T00:00:00Z"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::UploadError;
use crate::location::{validate_coordinates, LocationSample, SampleSource};

/// A location record before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationRecord {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    /// One of `manual`, `foreground`, `background`.
    pub source: Option<String>,
    /// RFC 3339 timestamp.
    pub timestamp: Option<String>,
}

impl LocationRecord {
    /// Record with the required fields set.
    pub fn new(
        latitude: f64,
        longitude: f64,
        source: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            source: Some(source.into()),
            timestamp: Some(timestamp.into()),
            ..Default::default()
        }
    }

    /// Check required fields and produce the wire record.
    pub fn validate(&self) -> Result<UploadRecord, UploadError> {
        let latitude = self
            .latitude
            .ok_or_else(|| UploadError::InvalidSample("missing latitude".to_string()))?;
        let longitude = self
            .longitude
            .ok_or_else(|| UploadError::InvalidSample("missing longitude".to_string()))?;
        validate_coordinates(latitude, longitude).map_err(UploadError::InvalidSample)?;

        let source = match self.source.as_deref() {
            None => return Err(UploadError::InvalidSample("missing source".to_string())),
            Some(name) => SampleSource::from_name(name).ok_or_else(|| {
                UploadError::InvalidSample(format!("unknown source '{}'", name))
            })?,
        };

        let timestamp = match self.timestamp.as_deref() {
            None => return Err(UploadError::InvalidSample("missing timestamp".to_string())),
            Some(ts) => DateTime::parse_from_rfc3339(ts)
                .map_err(|e| UploadError::InvalidSample(format!("invalid timestamp '{}': {}", ts, e)))?
                .with_timezone(&Utc),
        };

        Ok(UploadRecord {
            latitude,
            longitude,
            accuracy: finite("accuracy", self.accuracy)?,
            speed: finite("speed", self.speed)?,
            heading: finite("heading", self.heading)?,
            source,
            timestamp,
        })
    }
}

impl From<&LocationSample> for LocationRecord {
    fn from(sample: &LocationSample) -> Self {
        Self {
            latitude: Some(sample.latitude()),
            longitude: Some(sample.longitude()),
            accuracy: sample.accuracy(),
            speed: sample.speed(),
            heading: sample.heading(),
            source: Some(sample.source().as_str().to_string()),
            timestamp: Some(sample.timestamp().to_rfc3339()),
        }
    }
}

/// A validated record as sent to the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub source: SampleSource,
    pub timestamp: DateTime<Utc>,
}

fn finite(field: &str, value: Option<f64>) -> Result<Option<f64>, UploadError> {
    match value {
        Some(v) if !v.is_finite() => Err(UploadError::InvalidSample(format!(
            "{} is not a finite number",
            field
        ))),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_record_serializes_nulls() {
        let record = LocationRecord::new(12.9, 77.6, "manual", "2024-01-01T00:00:00Z")
            .validate()
            .unwrap();

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"latitude":12.9,"longitude":77.6,"accuracy":null,"speed":null,"heading":null,"source":"manual","timestamp":"2024-01-01T00:00:00Z"}"#
        );
    }

    #[test]
    fn test_offset_timestamp_normalized_to_utc() {
        let record = LocationRecord::new(1.0, 2.0, "background", "2024-01-01T05:30:00+05:30")
            .validate()
            .unwrap();
        assert_eq!(record.timestamp.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(record.source, SampleSource::Background);
    }

    #[test]
    fn test_missing_fields_rejected() {
        let complete = LocationRecord::new(12.9, 77.6, "manual", "2024-01-01T00:00:00Z");

        let cases = [
            LocationRecord { latitude: None, ..complete.clone() },
            LocationRecord { longitude: None, ..complete.clone() },
            LocationRecord { source: None, ..complete.clone() },
            LocationRecord { timestamp: None, ..complete.clone() },
        ];

        for record in cases {
            assert!(
                matches!(record.validate(), Err(UploadError::InvalidSample(_))),
                "{:?} should be rejected",
                record
            );
        }
    }

    #[test]
    fn test_invalid_values_rejected() {
        let complete = LocationRecord::new(12.9, 77.6, "manual", "2024-01-01T00:00:00Z");

        let cases = [
            LocationRecord { latitude: Some(95.0), ..complete.clone() },
            LocationRecord { longitude: Some(f64::NAN), ..complete.clone() },
            LocationRecord { source: Some("gps".into()), ..complete.clone() },
            LocationRecord { timestamp: Some("yesterday".into()), ..complete.clone() },
            LocationRecord { speed: Some(f64::INFINITY), ..complete.clone() },
        ];

        for record in cases {
            assert!(
                matches!(record.validate(), Err(UploadError::InvalidSample(_))),
                "{:?} should be rejected",
                record
            );
        }
    }

    #[test]
    fn test_from_sample() {
        let timestamp = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let sample = LocationSample::new(12.9, 77.6, timestamp, SampleSource::Foreground)
            .unwrap()
            .with_accuracy(Some(5.0))
            .with_heading(Some(90.0));

        let record = LocationRecord::from(&sample).validate().unwrap();
        assert_eq!(record.accuracy, Some(5.0));
        assert_eq!(record.heading, Some(90.0));
        assert_eq!(record.speed, None);
        assert_eq!(record.source, SampleSource::Foreground);
        assert_eq!(record.timestamp, timestamp);
    }
}
