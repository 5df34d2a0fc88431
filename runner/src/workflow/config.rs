use anyhow::Context;
use fovcore::processing::FovOptions;
use fovcore::{FieldOfView, ValidationConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Detector coverage and the attitude the radar config files do not carry.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DetectorSection {
    pub fov: FieldOfView,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub roll: f64,
    #[serde(default)]
    pub fov_options: FovOptions,
}

impl Default for DetectorSection {
    fn default() -> Self {
        Self {
            fov: FieldOfView {
                range_max: 3000.0,
                azimuth_min: -60.0,
                azimuth_max: 60.0,
                elevation_min: -20.0,
                elevation_max: 40.0,
            },
            pitch: 0.0,
            roll: 0.0,
            fov_options: FovOptions::default(),
        }
    }
}

/// Log files to read, grouped by format.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct InputSection {
    pub radar: Vec<PathBuf>,
    pub adsb: Vec<PathBuf>,
    pub mavlink: Vec<PathBuf>,
    pub gpx: Vec<PathBuf>,
    pub nmea: Vec<PathBuf>,
}

impl InputSection {
    pub fn is_empty(&self) -> bool {
        self.radar.is_empty()
            && self.adsb.is_empty()
            && self.mavlink.is_empty()
            && self.gpx.is_empty()
            && self.nmea.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct WorkflowConfig {
    pub detector: DetectorSection,
    pub inputs: InputSection,
    pub validation: ValidationConfig,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .check()
            .with_context(|| format!("validating workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(window_s: f64, gap_threshold_s: f64, max_time_deviation_s: f64) -> Self {
        let mut config = Self::default();
        config.validation.window_s = window_s;
        config.validation.gap_threshold_s = gap_threshold_s;
        config.validation.tolerances.max_time_deviation_s = max_time_deviation_s;
        config
    }

    pub fn check(&self) -> anyhow::Result<()> {
        self.detector.fov.validate()?;
        self.validation.validate()?;
        Ok(())
    }
}
