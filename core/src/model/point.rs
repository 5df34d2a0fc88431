use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::math::{great_circle_distance, target_position, GeoPosition};
use crate::model::detector::{DetectorPose, SphericalMeasurement};
use crate::processing::fov::FovResult;

/// Signed seconds from `from` to `to`.
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Velocity in the local East/North/Up frame, m/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub vertical: f64,
    pub east: f64,
    pub north: f64,
}

/// Results written onto a point by the tests, relative to one reference set.
///
/// A fresh copy of the point is annotated for every computation so that no
/// annotation outlives the reference set it was computed against.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fov: Option<FovResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corroborated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_difference_s: Option<f64>,
}

/// One timestamped observation from a detector or a truth source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<Velocity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement: Option<SphericalMeasurement>,
    /// Horizontal distance from the detector, meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
}

impl Point {
    pub fn new(
        source: impl Into<String>,
        timestamp: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
        altitude: f64,
    ) -> Self {
        Self {
            source: source.into(),
            timestamp,
            latitude: Some(latitude),
            longitude: Some(longitude),
            altitude: Some(altitude),
            confidence: None,
            velocity: None,
            measurement: None,
            distance: None,
            track_id: None,
            annotations: Annotations::default(),
        }
    }

    /// A point whose position the source could not provide.
    pub fn unlocated(source: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude: None,
            longitude: None,
            altitude: None,
            ..Self::new(source, timestamp, 0.0, 0.0, 0.0)
        }
    }

    /// Geodetic position and detector distance derived from a raw measurement.
    pub fn from_measurement(
        source: impl Into<String>,
        timestamp: DateTime<Utc>,
        measurement: SphericalMeasurement,
        pose: &DetectorPose,
    ) -> Self {
        let receiver = pose.position();
        let target = target_position(
            measurement.range_m,
            measurement.azimuth_deg,
            measurement.elevation_deg,
            receiver,
            pose.heading,
        );
        let distance = great_circle_distance(
            target.latitude,
            target.longitude,
            receiver.latitude,
            receiver.longitude,
        );
        Self {
            measurement: Some(measurement),
            distance: Some(distance),
            ..Self::new(
                source,
                timestamp,
                target.latitude,
                target.longitude,
                target.altitude,
            )
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_velocity(mut self, velocity: Velocity) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn with_track_id(mut self, track_id: impl Into<String>) -> Self {
        self.track_id = Some(track_id.into());
        self
    }

    /// Full geodetic position, if every coordinate is present and finite.
    pub fn position(&self) -> Option<GeoPosition> {
        match (self.latitude, self.longitude, self.altitude) {
            (Some(lat), Some(lon), Some(alt))
                if lat.is_finite() && lon.is_finite() && alt.is_finite() =>
            {
                Some(GeoPosition::new(lat, lon, alt))
            }
            _ => None,
        }
    }

    /// Absolute time separation from `other`, seconds.
    pub fn seconds_from(&self, other: &Point) -> f64 {
        seconds_between(other.timestamp, self.timestamp).abs()
    }

    /// Copy of this point with annotations cleared.
    pub fn unannotated(&self) -> Self {
        Self {
            annotations: Annotations::default(),
            ..self.clone()
        }
    }
}
