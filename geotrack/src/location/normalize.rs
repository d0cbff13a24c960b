//! Normalization of raw provider payloads into [`LocationSample`]s.
//!
//! Rules:
//! - latitude/longitude must be present, finite and in range
//! - unknown optional fields stay `None`, negative sentinels are dropped
//! - `source` comes from the producing path, not from the payload
//! - a missing or unusable timestamp falls back to the receive time

use chrono::{DateTime, Utc};

use super::error::LocationError;
use super::raw::RawLocationEvent;
use super::sample::LocationSample;
use super::state::SampleSource;

/// Map a raw provider event to a canonical sample stamped with `source`.
pub fn normalize(
    event: &RawLocationEvent,
    source: SampleSource,
) -> Result<LocationSample, LocationError> {
    let Some((latitude, longitude)) = event.coordinates() else {
        return Err(LocationError::MalformedSample(format!(
            "{} payload missing latitude or longitude",
            event.shape()
        )));
    };

    let timestamp = provider_timestamp(event.timestamp_millis()).unwrap_or_else(|| {
        tracing::debug!(
            shape = event.shape(),
            "Provider timestamp missing, using receive time"
        );
        Utc::now()
    });

    let sample = LocationSample::new(latitude, longitude, timestamp, source)?;

    let sample = match event {
        RawLocationEvent::Position(p) => sample
            .with_accuracy(p.coords.accuracy)
            .with_speed(p.coords.speed)
            .with_heading(p.coords.heading)
            .with_altitude(p.coords.altitude),
        RawLocationEvent::Background(b) => sample
            .with_accuracy(b.accuracy)
            .with_speed(b.speed)
            .with_course(b.bearing)
            .with_altitude(b.altitude),
        RawLocationEvent::Native(n) => sample
            .with_accuracy(n.accuracy)
            .with_speed(n.speed)
            .with_heading(n.heading)
            .with_altitude(n.altitude),
    };

    Ok(sample)
}

/// Convert provider epoch milliseconds to a UTC timestamp.
fn provider_timestamp(millis: Option<f64>) -> Option<DateTime<Utc>> {
    let millis = millis.filter(|ms| ms.is_finite() && *ms > 0.0)?;
    DateTime::from_timestamp_millis(millis.round() as i64)
}
