//! The normalized location record.
//!
//! A [`LocationSample`] is built once by normalization and then shared
//! read-only (as `Arc<LocationSample>`) with the history and every subscriber.
//! Optional kinematic fields use `None` for "unknown"; a zero is a real reading.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::LocationError;
use super::state::SampleSource;

/// Mean Earth radius in meters (haversine).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// One normalized location reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSample {
    latitude: f64,
    longitude: f64,
    accuracy: Option<f64>,
    speed: Option<f64>,
    heading: Option<f64>,
    altitude: Option<f64>,
    course: Option<f64>,
    timestamp: DateTime<Utc>,
    source: SampleSource,
}

impl LocationSample {
    /// Create a sample with validated coordinates and no kinematic data.
    pub fn new(
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
        source: SampleSource,
    ) -> Result<Self, LocationError> {
        validate_coordinates(latitude, longitude).map_err(LocationError::MalformedSample)?;

        Ok(Self {
            latitude,
            longitude,
            accuracy: None,
            speed: None,
            heading: None,
            altitude: None,
            course: None,
            timestamp,
            source,
        })
    }

    /// Horizontal accuracy radius in meters. Negative sentinels become unknown.
    pub fn with_accuracy(mut self, accuracy: Option<f64>) -> Self {
        self.accuracy = non_negative(accuracy);
        self
    }

    /// Ground speed in meters per second. Negative sentinels become unknown.
    pub fn with_speed(mut self, speed: Option<f64>) -> Self {
        self.speed = non_negative(speed);
        self
    }

    /// Device heading in degrees, wrapped to `[0, 360)`.
    pub fn with_heading(mut self, heading: Option<f64>) -> Self {
        self.heading = bearing(heading);
        self
    }

    /// Altitude in meters. May be negative.
    pub fn with_altitude(mut self, altitude: Option<f64>) -> Self {
        self.altitude = altitude.filter(|v| v.is_finite());
        self
    }

    /// Direction of travel in degrees, wrapped to `[0, 360)`.
    pub fn with_course(mut self, course: Option<f64>) -> Self {
        self.course = bearing(course);
        self
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Position as `(latitude, longitude)`.
    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    pub fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }

    pub fn speed(&self) -> Option<f64> {
        self.speed
    }

    pub fn heading(&self) -> Option<f64> {
        self.heading
    }

    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    pub fn course(&self) -> Option<f64> {
        self.course
    }

    /// When the provider produced the reading.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn source(&self) -> SampleSource {
        self.source
    }

    /// Great-circle distance to another sample in meters.
    pub fn distance_to(&self, other: &LocationSample) -> f64 {
        haversine_m(self.coordinates(), other.coordinates())
    }
}

/// Check that a coordinate pair is finite and inside geographic bounds.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), String> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(format!(
            "non-finite coordinates ({}, {})",
            latitude, longitude
        ));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("latitude {} outside -90..90", latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("longitude {} outside -180..180", longitude));
    }
    Ok(())
}

/// Great-circle distance between two `(lat, lon)` points in meters.
pub fn haversine_m(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

fn bearing(value: Option<f64>) -> Option<f64> {
    non_negative(value).map(|v| v % 360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(lat: f64, lon: f64) -> LocationSample {
        LocationSample::new(lat, lon, Utc::now(), SampleSource::Manual).unwrap()
    }

    #[test]
    fn test_new_sample_has_unknown_kinematics() {
        let sample = at(12.9, 77.6);

        assert_eq!(sample.coordinates(), (12.9, 77.6));
        assert_eq!(sample.accuracy(), None);
        assert_eq!(sample.speed(), None);
        assert_eq!(sample.heading(), None);
        assert_eq!(sample.altitude(), None);
        assert_eq!(sample.course(), None);
        assert_eq!(sample.source(), SampleSource::Manual);
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        let now = Utc::now();
        assert!(LocationSample::new(90.5, 0.0, now, SampleSource::Manual).is_err());
        assert!(LocationSample::new(0.0, -180.1, now, SampleSource::Manual).is_err());
        assert!(LocationSample::new(f64::NAN, 0.0, now, SampleSource::Manual).is_err());
        assert!(LocationSample::new(0.0, f64::INFINITY, now, SampleSource::Manual).is_err());

        // Bounds are inclusive
        assert!(LocationSample::new(-90.0, 180.0, now, SampleSource::Manual).is_ok());
    }

    #[test]
    fn test_zero_is_a_reading_not_unknown() {
        let sample = at(0.0, 0.0).with_speed(Some(0.0)).with_heading(Some(0.0));
        assert_eq!(sample.speed(), Some(0.0));
        assert_eq!(sample.heading(), Some(0.0));
    }

    #[test]
    fn test_sentinels_become_unknown() {
        let sample = at(1.0, 1.0)
            .with_accuracy(Some(-1.0))
            .with_speed(Some(-1.0))
            .with_heading(Some(f64::NAN))
            .with_altitude(Some(-12.5));

        assert_eq!(sample.accuracy(), None);
        assert_eq!(sample.speed(), None);
        assert_eq!(sample.heading(), None);
        assert_eq!(sample.altitude(), Some(-12.5));
    }

    #[test]
    fn test_bearings_wrap() {
        let sample = at(1.0, 1.0).with_heading(Some(360.0)).with_course(Some(725.0));
        assert_eq!(sample.heading(), Some(0.0));
        assert_eq!(sample.course(), Some(5.0));
    }

    #[test]
    fn test_haversine() {
        assert_eq!(haversine_m((10.0, 10.0), (10.0, 10.0)), 0.0);

        // One degree of latitude is ~111.2 km
        let d = haversine_m((0.0, 0.0), (1.0, 0.0));
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);

        let a = at(12.9716, 77.5946);
        let b = at(13.0827, 80.2707);
        let d = a.distance_to(&b);
        assert!((d - 290_000.0).abs() < 5_000.0, "got {}", d);
    }
}
