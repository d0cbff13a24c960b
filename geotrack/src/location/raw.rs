//! Raw provider payloads.
//!
//! Each provider reports locations in its own shape. Coordinates and
//! kinematics are optional at this level so that malformed payloads can be
//! represented and rejected by normalization instead of failing
//! deserialization.
//!
//! Shapes are told apart structurally (untagged):
//!
//! | Variant        | Distinguishing field | Timestamp field  |
//! |----------------|----------------------|------------------|
//! | `Position`     | `coords` object      | `timestamp` (ms) |
//! | `Background`   | `time`               | `time` (ms)      |
//! | `Native`       | anything else        | `timestamp` (ms) |

use serde::{Deserialize, Serialize};

/// A raw location event as delivered by an external provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLocationEvent {
    /// Geolocation-API shape: `{ coords: {...}, timestamp }`.
    Position(PositionPayload),
    /// Background-geolocation shape: flat fields, `bearing`, `time`, `provider`.
    Background(BackgroundPayload),
    /// Flat shape emitted by the native location module.
    Native(NativePayload),
}

/// Geolocation-API position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionPayload {
    pub coords: PositionCoords,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub mocked: Option<bool>,
}

/// The `coords` object of a geolocation-API position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionCoords {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub altitude_accuracy: Option<f64>,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
}

/// Background-geolocation location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundPayload {
    /// Epoch milliseconds. Required to select this shape.
    pub time: f64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    /// Direction of travel.
    #[serde(default)]
    pub bearing: Option<f64>,
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Underlying provider name, e.g. `gps`, `network`, `fused`.
    #[serde(default)]
    pub provider: Option<String>,
}

/// Native module location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativePayload {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub altitude: Option<f64>,
    /// Provider-side tag. Informational only; the coordinator stamps its own.
    pub source: Option<String>,
    pub timestamp: Option<f64>,
}

impl RawLocationEvent {
    /// Coordinates, if both are present (not range-checked).
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let (lat, lon) = match self {
            Self::Position(p) => (p.coords.latitude, p.coords.longitude),
            Self::Background(b) => (b.latitude, b.longitude),
            Self::Native(n) => (n.latitude, n.longitude),
        };
        lat.zip(lon)
    }

    /// Provider timestamp in epoch milliseconds, if reported.
    pub fn timestamp_millis(&self) -> Option<f64> {
        match self {
            Self::Position(p) => p.timestamp,
            Self::Background(b) => Some(b.time),
            Self::Native(n) => n.timestamp,
        }
    }

    /// Short name of the payload shape, for logs.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Position(_) => "position",
            Self::Background(_) => "background",
            Self::Native(_) => "native",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_shape_detected() {
        let json = r#"{
            "coords": {"latitude": 12.97, "longitude": 77.59, "accuracy": 5.0,
                       "altitude": 920.0, "altitudeAccuracy": 3.0, "heading": -1, "speed": 0.4},
            "timestamp": 1704067200000,
            "mocked": false
        }"#;

        let event: RawLocationEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.shape(), "position");
        assert_eq!(event.coordinates(), Some((12.97, 77.59)));
        assert_eq!(event.timestamp_millis(), Some(1704067200000.0));

        let RawLocationEvent::Position(p) = event else {
            panic!("expected position payload");
        };
        assert_eq!(p.coords.altitude_accuracy, Some(3.0));
    }

    #[test]
    fn test_background_shape_detected() {
        let json = r#"{"provider": "fused", "time": 1704067200000, "latitude": 1.5,
                       "longitude": 2.5, "bearing": 45.0, "speed": 3.0, "locationProvider": 1}"#;

        let event: RawLocationEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.shape(), "background");
        assert_eq!(event.coordinates(), Some((1.5, 2.5)));
    }

    #[test]
    fn test_native_shape_is_fallback() {
        let json = r#"{"latitude": 1.0, "longitude": 2.0, "source": "gps", "timestamp": 5}"#;
        let event: RawLocationEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.shape(), "native");

        // Missing longitude still deserializes, normalization rejects it later
        let event: RawLocationEvent = serde_json::from_str(r#"{"latitude": 1.0}"#).unwrap();
        assert_eq!(event.shape(), "native");
        assert_eq!(event.coordinates(), None);
    }
}
