//! Field-of-view membership test.
//!
//! Both positions are projected into one ENU frame, the boresight is built by
//! rotating `(0, range_max, 0)` through the detector pose, and the target's
//! line of sight is compared against it in azimuth and elevation.
//!
//! Azimuth deviation is signed, positive clockwise of the boresight when
//! seen from above. Its magnitude is `atan2(|v1 x v2|, v1 . v2)` over the
//! horizontal components. Elevation deviation is the difference between the
//! line-of-sight and boresight elevation angles.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::math::{geodetic_to_local_enu, GeoPosition, MatrixHelper};
use crate::model::{DetectorPose, FieldOfView, Point};
use crate::prelude::ValidationResult;
use crate::telemetry::{LogManager, MetricsRecorder};

/// Outcome of one FoV evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FovResult {
    pub range: f64,
    pub is_in_range: bool,
    pub azimuth_deviation: Option<f64>,
    pub elevation_deviation: Option<f64>,
    pub is_in_heading: bool,
    pub is_in_elevation: bool,
    pub is_in_fov: bool,
}

impl FovResult {
    fn degenerate(range: f64) -> Self {
        Self {
            range,
            is_in_range: false,
            azimuth_deviation: None,
            elevation_deviation: None,
            is_in_heading: false,
            is_in_elevation: false,
            is_in_fov: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FovOptions {
    /// ENU origin; the detector position when unset.
    pub origin: Option<GeoPosition>,
    /// Undo detector roll about the boresight before comparing angles.
    pub correct_roll: bool,
    /// Still report angular deviations for targets beyond `range_max`.
    pub angles_when_out_of_range: bool,
}

impl Default for FovOptions {
    fn default() -> Self {
        Self {
            origin: None,
            correct_roll: true,
            angles_when_out_of_range: false,
        }
    }
}

/// A detector's coverage, ready to classify positions.
pub struct FovTest {
    fov: FieldOfView,
    pose: DetectorPose,
    options: FovOptions,
    boresight: Array1<f64>,
    logger: LogManager,
}

impl FovTest {
    pub fn new(fov: FieldOfView, pose: DetectorPose) -> ValidationResult<Self> {
        Self::with_options(fov, pose, FovOptions::default())
    }

    pub fn with_options(
        fov: FieldOfView,
        pose: DetectorPose,
        options: FovOptions,
    ) -> ValidationResult<Self> {
        fov.validate()?;
        let forward = MatrixHelper::from_array([0.0, fov.range_max, 0.0]);
        let boresight = MatrixHelper::apply(orientation(&pose).view(), forward.view());
        Ok(Self {
            fov,
            pose,
            options,
            boresight,
            logger: LogManager::new("fov"),
        })
    }

    /// Boresight vector in the ENU frame, `range_max` long.
    pub fn boresight(&self) -> ArrayView1<'_, f64> {
        self.boresight.view()
    }

    /// Classifies `point`, or returns `None` when it has no usable position.
    pub fn evaluate(&self, point: &Point) -> Option<FovResult> {
        match point.position() {
            Some(position) => Some(self.evaluate_position(position)),
            None => {
                self.logger.degraded(&format!(
                    "{} point at {} has no position; FoV undecided",
                    point.source, point.timestamp
                ));
                None
            }
        }
    }

    /// Same as [`FovTest::evaluate`], counting outcomes into `metrics`.
    pub fn evaluate_recorded(&self, point: &Point, metrics: &MetricsRecorder) -> Option<FovResult> {
        let result = self.evaluate(point);
        match result {
            Some(_) => metrics.record_fov_evaluated(),
            None => metrics.record_missing_fields(),
        }
        result
    }

    pub fn evaluate_position(&self, position: GeoPosition) -> FovResult {
        let detector = self.pose.position();
        let origin = self.options.origin.unwrap_or(detector);
        let detector_enu = geodetic_to_local_enu(detector, origin).to_array();
        let target_enu = geodetic_to_local_enu(position, origin).to_array();

        let line_of_sight = MatrixHelper::from_array(target_enu) - MatrixHelper::from_array(detector_enu);
        let range = MatrixHelper::norm(line_of_sight.view());
        if !range.is_finite() || range <= f64::EPSILON {
            return FovResult::degenerate(if range.is_finite() { range } else { f64::INFINITY });
        }

        let is_in_range = range < self.fov.range_max;
        if !is_in_range && !self.options.angles_when_out_of_range {
            return FovResult::degenerate(range);
        }

        let line_of_sight = if self.options.correct_roll && self.pose.roll != 0.0 {
            let counter = MatrixHelper::rotation_about(self.boresight.view(), -self.pose.roll);
            MatrixHelper::apply(counter.view(), line_of_sight.view())
        } else {
            line_of_sight
        };

        let azimuth_deviation = azimuth_deviation(line_of_sight.view(), self.boresight.view());
        let elevation_deviation = elevation_deviation(line_of_sight.view(), self.boresight.view());

        let (Some(azimuth), Some(elevation)) = (azimuth_deviation, elevation_deviation) else {
            return FovResult::degenerate(range);
        };

        let is_in_heading = self.fov.contains_azimuth(azimuth);
        let is_in_elevation = self.fov.contains_elevation(elevation);

        FovResult {
            range,
            is_in_range,
            azimuth_deviation: Some(azimuth),
            elevation_deviation: Some(elevation),
            is_in_heading,
            is_in_elevation,
            is_in_fov: is_in_range && is_in_heading && is_in_elevation,
        }
    }

    /// Annotated copies of `points`.
    pub fn label(&self, points: &[Point], metrics: &MetricsRecorder) -> Vec<Point> {
        points
            .iter()
            .map(|point| {
                let mut labelled = point.unannotated();
                labelled.annotations.fov = self.evaluate_recorded(point, metrics);
                labelled
            })
            .collect()
    }
}

/// One-shot FoV evaluation; validates `fov` first.
pub fn compute_fov_test(
    fov: &FieldOfView,
    pose: &DetectorPose,
    point: &Point,
) -> ValidationResult<Option<FovResult>> {
    let test = FovTest::new(*fov, *pose)?;
    Ok(test.evaluate(point))
}

/// Heading about Up (clockwise), then pitch, then roll about the boresight.
fn orientation(pose: &DetectorPose) -> Array2<f64> {
    let yaw_pitch = MatrixHelper::multiply(
        MatrixHelper::rotation_z(-pose.heading).view(),
        MatrixHelper::rotation_x(pose.pitch).view(),
    );
    MatrixHelper::multiply(yaw_pitch.view(), MatrixHelper::rotation_y(pose.roll).view())
}

fn azimuth_deviation(line_of_sight: ArrayView1<f64>, boresight: ArrayView1<f64>) -> Option<f64> {
    let (x1, y1) = (line_of_sight[0], line_of_sight[1]);
    let (x2, y2) = (boresight[0], boresight[1]);
    let cross = x1 * y2 - y1 * x2;
    let dot = x1 * x2 + y1 * y2;
    let angle = cross.atan2(dot).to_degrees();
    angle.is_finite().then_some(angle)
}

fn elevation_deviation(line_of_sight: ArrayView1<f64>, boresight: ArrayView1<f64>) -> Option<f64> {
    let target = MatrixHelper::unit(line_of_sight)?;
    let reference = MatrixHelper::unit(boresight)?;
    let target_elevation = target[2].clamp(-1.0, 1.0).asin();
    let reference_elevation = reference[2].clamp(-1.0, 1.0).asin();
    Some((target_elevation - reference_elevation).to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{local_enu_to_geodetic, LocalEnu};
    use chrono::{TimeZone, Utc};

    fn pose() -> DetectorPose {
        DetectorPose::new(65.12624067, -147.47648183, 211.8, 0.0)
    }

    fn fov() -> FieldOfView {
        FieldOfView::new(2000.0, -60.0, 60.0, -10.0, 30.0).unwrap()
    }

    /// Position at `range` meters along compass `bearing` and `elevation`.
    fn at(pose: &DetectorPose, range: f64, bearing: f64, elevation: f64) -> GeoPosition {
        let (sin_b, cos_b) = bearing.to_radians().sin_cos();
        let (sin_e, cos_e) = elevation.to_radians().sin_cos();
        let enu = LocalEnu {
            east: range * cos_e * sin_b,
            north: range * cos_e * cos_b,
            up: range * sin_e,
        };
        local_enu_to_geodetic(enu, pose.position())
    }

    #[test]
    fn boresight_follows_heading_and_pitch() {
        let test = FovTest::new(fov(), pose().with_attitude(0.0, 25.0)).unwrap();
        let b = test.boresight();
        assert!(b[0].abs() < 1e-9 && (b[1] - 2000.0).abs() < 1e-9 && b[2].abs() < 1e-9);

        let east = FovTest::new(fov(), DetectorPose::new(0.0, 0.0, 0.0, 90.0)).unwrap();
        assert!((east.boresight()[0] - 2000.0).abs() < 1e-9);

        let raised = FovTest::new(fov(), pose().with_attitude(30.0, 0.0)).unwrap();
        assert!((raised.boresight()[2] - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn range_edge_decides_membership_at_window_center() {
        let pose = pose();
        let test = FovTest::new(fov(), pose).unwrap();
        let center = fov().elevation_center();

        let inside = test.evaluate_position(at(&pose, 2000.0 - 1e-3, 0.0, center));
        assert!(inside.is_in_range);
        assert!(inside.is_in_fov);
        assert!(inside.azimuth_deviation.unwrap().abs() < 1e-6);
        assert!((inside.elevation_deviation.unwrap() - center).abs() < 1e-6);

        let outside = test.evaluate_position(at(&pose, 2000.0 + 1e-3, 0.0, center));
        assert!(!outside.is_in_range);
        assert!(!outside.is_in_fov);
        assert!(outside.azimuth_deviation.is_none());
    }

    #[test]
    fn out_of_range_stays_out_even_with_angles() {
        let pose = pose();
        let options = FovOptions {
            angles_when_out_of_range: true,
            ..Default::default()
        };
        let test = FovTest::with_options(fov(), pose, options).unwrap();
        let result = test.evaluate_position(at(&pose, 2500.0, 0.0, 10.0));
        assert!(result.is_in_heading);
        assert!(result.is_in_elevation);
        assert!(!result.is_in_fov);
    }

    #[test]
    fn azimuth_outside_window_fails_despite_centered_elevation() {
        let pose = pose();
        let test = FovTest::new(fov(), pose).unwrap();
        let result = test.evaluate_position(at(&pose, 1000.0, 75.0, 10.0));
        assert!(result.is_in_range);
        assert!(result.is_in_elevation);
        assert!(!result.is_in_heading);
        assert!(!result.is_in_fov);
        assert!((result.azimuth_deviation.unwrap() - 75.0).abs() < 1e-6);
    }

    #[test]
    fn azimuth_deviation_is_signed_clockwise() {
        let pose = DetectorPose::new(10.0, 20.0, 0.0, 90.0);
        let test = FovTest::new(fov(), pose).unwrap();
        let right = test.evaluate_position(at(&pose, 500.0, 120.0, 0.0));
        let left = test.evaluate_position(at(&pose, 500.0, 60.0, 0.0));
        assert!((right.azimuth_deviation.unwrap() - 30.0).abs() < 1e-6);
        assert!((left.azimuth_deviation.unwrap() + 30.0).abs() < 1e-6);
    }

    #[test]
    fn elevation_outside_window_fails() {
        let pose = pose();
        let test = FovTest::new(fov(), pose).unwrap();
        let result = test.evaluate_position(at(&pose, 1000.0, 0.0, 45.0));
        assert!(result.is_in_heading);
        assert!(!result.is_in_elevation);
        assert!(!result.is_in_fov);
    }

    #[test]
    fn pitched_detector_shifts_elevation_window() {
        let pose = pose().with_attitude(40.0, 0.0);
        let test = FovTest::new(fov(), pose).unwrap();
        let result = test.evaluate_position(at(&pose, 1000.0, 0.0, 45.0));
        assert!((result.elevation_deviation.unwrap() - 5.0).abs() < 1e-6);
        assert!(result.is_in_fov);
    }

    #[test]
    fn roll_correction_leaves_boresight_targets_alone() {
        let pose = pose().with_attitude(0.0, 35.0);
        let test = FovTest::new(fov(), pose).unwrap();
        let result = test.evaluate_position(at(&pose, 1000.0, 0.0, 0.0));
        assert!(result.azimuth_deviation.unwrap().abs() < 1e-6);
        assert!(result.elevation_deviation.unwrap().abs() < 1e-6);
    }

    #[test]
    fn roll_correction_changes_off_axis_deviations() {
        let rolled = pose().with_attitude(0.0, 30.0);
        let target = at(&rolled, 1000.0, 20.0, 10.0);

        let corrected = FovTest::new(fov(), rolled).unwrap().evaluate_position(target);
        let raw = FovTest::with_options(
            fov(),
            rolled,
            FovOptions {
                correct_roll: false,
                ..Default::default()
            },
        )
        .unwrap()
        .evaluate_position(target);

        let corrected_az = corrected.azimuth_deviation.unwrap();
        let corrected_el = corrected.elevation_deviation.unwrap();
        let raw_az = raw.azimuth_deviation.unwrap();
        let raw_el = raw.elevation_deviation.unwrap();
        assert!((corrected_az - raw_az).abs() > 1.0, "{} vs {}", corrected_az, raw_az);
        assert!((corrected_el - raw_el).abs() > 1.0, "{} vs {}", corrected_el, raw_el);
        assert_eq!(corrected.range, raw.range);
    }

    #[test]
    fn uncorrected_roll_matches_level_detector() {
        let level = pose();
        let target = at(&level, 1000.0, 20.0, 10.0);
        let options = FovOptions {
            correct_roll: false,
            ..Default::default()
        };
        let raw = FovTest::with_options(fov(), level.with_attitude(0.0, 30.0), options)
            .unwrap()
            .evaluate_position(target);
        let flat = FovTest::new(fov(), level).unwrap().evaluate_position(target);
        assert!((raw.azimuth_deviation.unwrap() - 20.0).abs() < 1e-6);
        assert!((raw.elevation_deviation.unwrap() - 10.0).abs() < 1e-6);
        assert!((raw.azimuth_deviation.unwrap() - flat.azimuth_deviation.unwrap()).abs() < 1e-9);
    }

    #[test]
    fn shifted_origin_keeps_range_and_tilts_angles_slightly() {
        let pose = pose();
        let target = at(&pose, 1000.0, 0.0, 10.0);
        let origin = local_enu_to_geodetic(
            LocalEnu {
                east: 0.0,
                north: 5000.0,
                up: 0.0,
            },
            pose.position(),
        );
        let local = FovTest::new(fov(), pose).unwrap().evaluate_position(target);
        let shifted = FovTest::with_options(
            fov(),
            pose,
            FovOptions {
                origin: Some(origin),
                ..Default::default()
            },
        )
        .unwrap()
        .evaluate_position(target);

        assert!((local.range - shifted.range).abs() < 1e-6);
        assert!(shifted.is_in_fov);
        let tilt = (local.elevation_deviation.unwrap() - shifted.elevation_deviation.unwrap()).abs();
        assert!(tilt > 0.01 && tilt < 0.1, "tilt {}", tilt);
    }

    #[test]
    fn coincident_target_is_out_of_range_not_nan() {
        let pose = pose();
        let test = FovTest::new(fov(), pose).unwrap();
        let result = test.evaluate_position(pose.position());
        assert_eq!(result.range, 0.0);
        assert!(!result.is_in_range);
        assert!(!result.is_in_fov);
        assert!(result.azimuth_deviation.is_none());
    }

    #[test]
    fn missing_position_is_undecided_and_counted() {
        let test = FovTest::new(fov(), pose()).unwrap();
        let metrics = MetricsRecorder::new();
        let t = Utc.with_ymd_and_hms(2021, 1, 27, 20, 43, 1).unwrap();
        assert!(test
            .evaluate_recorded(&Point::unlocated("adsb", t), &metrics)
            .is_none());
        assert_eq!(metrics.snapshot().missing_fields, 1);
    }

    #[test]
    fn degenerate_fov_is_rejected() {
        let bad = FieldOfView {
            range_max: 1000.0,
            azimuth_min: 10.0,
            azimuth_max: -10.0,
            elevation_min: 0.0,
            elevation_max: 10.0,
        };
        let t = Utc.with_ymd_and_hms(2021, 1, 27, 20, 43, 1).unwrap();
        let point = Point::new("adsb", t, 65.0, -147.0, 300.0);
        assert!(compute_fov_test(&bad, &pose(), &point).is_err());
    }
}
