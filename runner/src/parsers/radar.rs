use anyhow::{bail, Context};
use fovcore::model::SphericalMeasurement;
use fovcore::{DetectorPose, Point};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{parse_timestamp, read_records, source_name, ParseOutcome};

#[derive(Debug, Deserialize)]
struct Quantity {
    value: f64,
    unit: String,
}

impl Quantity {
    fn in_unit(&self, unit: &str, field: &str) -> anyhow::Result<f64> {
        if self.unit != unit {
            bail!("receiver {} is in {:?}, expected {:?}", field, self.unit, unit);
        }
        Ok(self.value)
    }
}

#[derive(Debug, Deserialize)]
struct Receiver {
    latitude: Quantity,
    longitude: Quantity,
    elevation: Quantity,
    orientation: Quantity,
}

#[derive(Debug, Deserialize)]
struct RadarConfigFile {
    #[serde(default)]
    name: Option<String>,
    receiver: Receiver,
}

#[derive(Debug, Deserialize)]
struct RadarRecord {
    #[serde(rename = "timeStamp")]
    time_stamp: String,
    #[serde(rename = "confidenceLevel", default)]
    confidence_level: Option<f64>,
    /// Range estimate, meters.
    rest: f64,
    /// Azimuth estimate, degrees.
    azest: f64,
    /// Elevation estimate, degrees.
    elest: f64,
}

/// Detector setup read from the `_config.log` next to a radar log.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarConfig {
    pub name: Option<String>,
    pub pose: DetectorPose,
}

/// A parsed radar log together with the pose its points were derived from.
#[derive(Debug, Clone)]
pub struct RadarLog {
    pub source: String,
    pub pose: DetectorPose,
    pub outcome: ParseOutcome,
}

/// `foo_radar.log` -> `foo_radar_config.log`.
pub fn config_path(log_path: &Path) -> PathBuf {
    let name = log_path.to_string_lossy();
    match name.strip_suffix(".log") {
        Some(stem) => PathBuf::from(format!("{}_config.log", stem)),
        None => PathBuf::from(format!("{}_config.log", name)),
    }
}

pub fn parse_radar_config(path: &Path) -> anyhow::Result<RadarConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading radar config {}", path.display()))?;
    let config: RadarConfigFile = serde_json::from_str(&contents)
        .with_context(|| format!("parsing radar config {}", path.display()))?;
    let receiver = &config.receiver;
    let pose = DetectorPose::new(
        receiver.latitude.in_unit("°", "latitude")?,
        receiver.longitude.in_unit("°", "longitude")?,
        receiver.elevation.in_unit("m", "elevation")?,
        receiver.orientation.in_unit("°", "orientation")?,
    );
    Ok(RadarConfig {
        name: config.name,
        pose,
    })
}

/// Reads a radar log and its config, converting every range/azimuth/
/// elevation estimate into a geodetic point. `pitch`/`roll` complete the
/// pose, since the config only carries the heading.
pub fn parse_radar_log(log_path: &Path, pitch: f64, roll: f64) -> anyhow::Result<RadarLog> {
    let config_file = config_path(log_path);
    let config = parse_radar_config(&config_file)
        .with_context(|| format!("radar log {} has no usable config", log_path.display()))?;
    let pose = config.pose.with_attitude(pitch, roll);
    let source = config.name.unwrap_or_else(|| source_name(log_path));

    let mut outcome = ParseOutcome::default();
    for (index, record) in read_records::<RadarRecord>(log_path)?.into_iter().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                outcome.skip(index, format!("malformed record: {}", err));
                continue;
            }
        };
        let timestamp = match parse_timestamp(&record.time_stamp) {
            Ok(timestamp) => timestamp,
            Err(err) => {
                outcome.skip(index, format!("{:#}", err));
                continue;
            }
        };
        let measurement = SphericalMeasurement {
            range_m: record.rest,
            azimuth_deg: record.azest,
            elevation_deg: record.elest,
        };
        let mut point = Point::from_measurement(source.as_str(), timestamp, measurement, &pose);
        if let Some(confidence) = record.confidence_level {
            point = point.with_confidence(confidence);
        }
        outcome.points.push(point);
    }

    Ok(RadarLog {
        source,
        pose,
        outcome,
    })
}
