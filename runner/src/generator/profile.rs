use crate::workflow::runner::{DetectorInput, WorkflowInputs};
use anyhow::Context;
use chrono::{DateTime, Duration, TimeZone, Utc};
use fovcore::math::{geodetic_to_local_enu, local_enu_to_geodetic, LocalEnu};
use fovcore::model::{SphericalMeasurement, Velocity};
use fovcore::processing::FovTest;
use fovcore::{DetectorPose, FieldOfView, Point};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for a synthetic flyby: one straight, level truth track in
/// the detector's local frame and the noisy reports the detector makes of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub seed: u64,
    pub start: DateTime<Utc>,
    pub pose: DetectorPose,
    /// Track start relative to the detector, meters.
    pub start_east: f64,
    pub start_north: f64,
    pub altitude_above_detector: f64,
    /// Ground velocity, m/s.
    pub velocity_east: f64,
    pub velocity_north: f64,
    pub duration_s: f64,
    pub sample_period_s: f64,
    /// Time after each FoV entry before the detector starts reporting.
    pub detection_delay_s: f64,
    pub range_noise_m: f64,
    pub angle_noise_deg: f64,
    pub truth_source: String,
    pub detector_source: String,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            start: Utc
                .with_ymd_and_hms(2021, 1, 27, 20, 30, 0)
                .single()
                .unwrap_or_default(),
            pose: DetectorPose::new(65.12624067, -147.47648183, 211.8, 0.0),
            start_east: -2000.0,
            start_north: 1000.0,
            altitude_above_detector: 120.0,
            velocity_east: 30.0,
            velocity_north: 0.0,
            duration_s: 140.0,
            sample_period_s: 1.0,
            detection_delay_s: 3.0,
            range_noise_m: 2.0,
            angle_noise_deg: 0.1,
            truth_source: "synthetic-adsb".into(),
            detector_source: "synthetic-radar".into(),
        }
    }
}

impl ScenarioConfig {
    fn sample_count(&self) -> anyhow::Result<usize> {
        if !(self.sample_period_s.is_finite() && self.sample_period_s > 0.0) {
            anyhow::bail!("sample_period_s must be positive (got {})", self.sample_period_s);
        }
        if !(self.duration_s.is_finite() && self.duration_s >= 0.0) {
            anyhow::bail!("duration_s must be non-negative (got {})", self.duration_s);
        }
        Ok((self.duration_s / self.sample_period_s).floor() as usize + 1)
    }
}

fn jitter(rng: &mut StdRng, amplitude: f64) -> f64 {
    if amplitude > 0.0 {
        rng.gen_range(-amplitude..amplitude)
    } else {
        0.0
    }
}

/// Wraps an angle into `(-180, 180]`.
fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Range/azimuth/elevation of `target` as the detector would report it.
///
/// Azimuth is counter-clockwise positive from the heading, matching how
/// [`Point::from_measurement`] places a report.
pub fn measure(target: &Point, pose: &DetectorPose) -> Option<SphericalMeasurement> {
    let enu = geodetic_to_local_enu(target.position()?, pose.position());
    let range_m = (enu.east * enu.east + enu.north * enu.north + enu.up * enu.up).sqrt();
    if range_m <= f64::EPSILON {
        return Some(SphericalMeasurement {
            range_m: 0.0,
            azimuth_deg: 0.0,
            elevation_deg: 0.0,
        });
    }
    let bearing = enu.east.atan2(enu.north).to_degrees();
    Some(SphericalMeasurement {
        range_m,
        azimuth_deg: -wrap_degrees(bearing - pose.heading),
        elevation_deg: (enu.up / range_m).asin().to_degrees(),
    })
}

pub fn build_scenario(config: &ScenarioConfig, fov: FieldOfView) -> anyhow::Result<WorkflowInputs> {
    let samples = config.sample_count()?;
    let fov_test = FovTest::new(fov, config.pose).context("building scenario detector")?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let velocity = Velocity {
        vertical: 0.0,
        east: config.velocity_east,
        north: config.velocity_north,
    };

    let mut truth = Vec::with_capacity(samples);
    let mut reports = Vec::new();
    let mut entered_at: Option<f64> = None;

    for index in 0..samples {
        let elapsed = index as f64 * config.sample_period_s;
        let timestamp = config.start + Duration::microseconds((elapsed * 1e6).round() as i64);
        let position = local_enu_to_geodetic(
            LocalEnu {
                east: config.start_east + config.velocity_east * elapsed,
                north: config.start_north + config.velocity_north * elapsed,
                up: config.altitude_above_detector,
            },
            config.pose.position(),
        );
        let point = Point::new(
            config.truth_source.as_str(),
            timestamp,
            position.latitude,
            position.longitude,
            position.altitude,
        )
        .with_velocity(velocity)
        .with_track_id("synthetic-1");

        if fov_test.evaluate_position(position).is_in_fov {
            let entry = *entered_at.get_or_insert(elapsed);
            if elapsed - entry >= config.detection_delay_s {
                if let Some(exact) = measure(&point, &config.pose) {
                    let noisy = SphericalMeasurement {
                        range_m: (exact.range_m + jitter(&mut rng, config.range_noise_m)).max(0.0),
                        azimuth_deg: exact.azimuth_deg + jitter(&mut rng, config.angle_noise_deg),
                        elevation_deg: exact.elevation_deg
                            + jitter(&mut rng, config.angle_noise_deg),
                    };
                    reports.push(
                        Point::from_measurement(
                            config.detector_source.as_str(),
                            timestamp,
                            noisy,
                            &config.pose,
                        )
                        .with_confidence(rng.gen_range(20.0..40.0)),
                    );
                }
            }
        } else {
            entered_at = None;
        }
        truth.push(point);
    }

    log::info!(
        "synthetic scenario: {} truth samples, {} detector reports",
        truth.len(),
        reports.len()
    );

    Ok(WorkflowInputs {
        detectors: vec![DetectorInput {
            source: config.detector_source.clone(),
            pose: config.pose,
            points: reports,
        }],
        truth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fovcore::ValidationConfig;
    use fovcore::TimeToDetect;

    fn fov() -> FieldOfView {
        FieldOfView::new(3000.0, -60.0, 60.0, -20.0, 40.0).unwrap()
    }

    #[test]
    fn measurement_places_point_back_on_target() {
        let pose = DetectorPose::new(65.12624067, -147.47648183, 211.8, 45.0);
        for (east, north) in [(300.0, 800.0), (-600.0, 400.0), (-200.0, -900.0)] {
            let position = local_enu_to_geodetic(
                LocalEnu {
                    east,
                    north,
                    up: 80.0,
                },
                pose.position(),
            );
            let target = Point::new(
                "truth",
                Utc::now(),
                position.latitude,
                position.longitude,
                position.altitude,
            );
            let measurement = measure(&target, &pose).unwrap();
            let placed = Point::from_measurement("radar", target.timestamp, measurement, &pose);
            let enu = geodetic_to_local_enu(placed.position().unwrap(), pose.position());
            assert!((enu.east - east).abs() < 1.0, "east {} vs {}", enu.east, east);
            assert!((enu.north - north).abs() < 1.0, "north {} vs {}", enu.north, north);
        }
    }

    #[test]
    fn scenario_is_reproducible_for_a_seed() {
        let config = ScenarioConfig {
            seed: 7,
            ..Default::default()
        };
        let first = build_scenario(&config, fov()).unwrap();
        let second = build_scenario(&config, fov()).unwrap();
        assert_eq!(first.truth.len(), 141);
        assert_eq!(first.detectors[0].points, second.detectors[0].points);
        assert!(!first.detectors[0].points.is_empty());
    }

    #[test]
    fn reports_start_after_detection_delay() {
        let config = ScenarioConfig {
            range_noise_m: 0.0,
            angle_noise_deg: 0.0,
            ..Default::default()
        };
        let inputs = build_scenario(&config, fov()).unwrap();
        let engine = TimeToDetect::new(fov(), config.pose, &ValidationConfig::default()).unwrap();
        let report = engine
            .compute(&inputs.detectors[0].points, &inputs.truth)
            .unwrap();
        assert_eq!(report.encounters.len(), 1);
        let latency = report.encounters[0].first_corroboration_latency_s.unwrap();
        assert!((latency - config.detection_delay_s).abs() < 1e-6);
    }

    #[test]
    fn rejects_non_positive_sample_period() {
        let config = ScenarioConfig {
            sample_period_s: 0.0,
            ..Default::default()
        };
        assert!(build_scenario(&config, fov()).is_err());
    }
}
