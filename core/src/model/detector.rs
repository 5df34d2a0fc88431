use serde::{Deserialize, Serialize};

use crate::math::GeoPosition;
use crate::prelude::{ValidationError, ValidationResult};

/// Raw detector-relative measurement.
///
/// `azimuth_deg` uses the detector's own convention; see
/// [`crate::math::target_bearing`] for how it maps onto a compass bearing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphericalMeasurement {
    pub range_m: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

/// Where the detector sits and how it is pointed.
///
/// Orientation is applied as heading about Up (clockwise from North), then
/// pitch about the detector's right axis (nose up positive), then roll about
/// the boresight (right side down positive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorPose {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub heading: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub roll: f64,
}

impl DetectorPose {
    pub fn new(latitude: f64, longitude: f64, altitude: f64, heading: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            heading,
            pitch: 0.0,
            roll: 0.0,
        }
    }

    pub fn with_attitude(mut self, pitch: f64, roll: f64) -> Self {
        self.pitch = pitch;
        self.roll = roll;
        self
    }

    pub fn position(&self) -> GeoPosition {
        GeoPosition::new(self.latitude, self.longitude, self.altitude)
    }
}

/// Angular and radial coverage, relative to the boresight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldOfView {
    pub range_max: f64,
    pub azimuth_min: f64,
    pub azimuth_max: f64,
    pub elevation_min: f64,
    pub elevation_max: f64,
}

impl FieldOfView {
    pub fn new(
        range_max: f64,
        azimuth_min: f64,
        azimuth_max: f64,
        elevation_min: f64,
        elevation_max: f64,
    ) -> ValidationResult<Self> {
        let fov = Self {
            range_max,
            azimuth_min,
            azimuth_max,
            elevation_min,
            elevation_max,
        };
        fov.validate()?;
        Ok(fov)
    }

    /// Rejects non-finite bounds, a non-positive range and empty windows.
    pub fn validate(&self) -> ValidationResult<()> {
        let values = [
            self.range_max,
            self.azimuth_min,
            self.azimuth_max,
            self.elevation_min,
            self.elevation_max,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ValidationError::InvalidFieldOfView(
                "bounds must be finite".into(),
            ));
        }
        if self.range_max <= 0.0 {
            return Err(ValidationError::InvalidFieldOfView(format!(
                "range_max must be positive (got {})",
                self.range_max
            )));
        }
        if self.azimuth_max <= self.azimuth_min {
            return Err(ValidationError::InvalidFieldOfView(format!(
                "azimuth window [{}, {}] is empty",
                self.azimuth_min, self.azimuth_max
            )));
        }
        if self.elevation_max <= self.elevation_min {
            return Err(ValidationError::InvalidFieldOfView(format!(
                "elevation window [{}, {}] is empty",
                self.elevation_min, self.elevation_max
            )));
        }
        Ok(())
    }

    pub fn azimuth_center(&self) -> f64 {
        (self.azimuth_min + self.azimuth_max) / 2.0
    }

    pub fn elevation_center(&self) -> f64 {
        (self.elevation_min + self.elevation_max) / 2.0
    }

    pub fn contains_azimuth(&self, deviation_deg: f64) -> bool {
        self.azimuth_min <= deviation_deg && deviation_deg <= self.azimuth_max
    }

    pub fn contains_elevation(&self, deviation_deg: f64) -> bool {
        self.elevation_min <= deviation_deg && deviation_deg <= self.elevation_max
    }
}
