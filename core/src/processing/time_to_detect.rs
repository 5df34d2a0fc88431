//! Encounter segmentation and time-to-detect.
//!
//! A truth track is walked in time order through a two-state machine. Every
//! OUTSIDE -> INSIDE transition opens an [`Encounter`] holding the truth and
//! detector samples within `window_s` of the entry instant. Each detector
//! sample in the window is then checked against the truth window, and the
//! smallest `|t_detector - t_entry|` among corroborated samples is the
//! encounter's latency.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::math::StatsHelper;
use crate::model::{DetectorPose, Encounter, FieldOfView, Point};
use crate::prelude::{SourceRole, ValidationConfig, ValidationResult};
use crate::processing::blocking::{distinct_sources, ensure_single_source};
use crate::processing::corroboration::CorroborationTest;
use crate::processing::fov::{FovOptions, FovTest};
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FovState {
    OutsideFov,
    InsideFov,
}

/// Latency statistics over the detected encounters of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencySummary {
    pub encounters: usize,
    pub detected: usize,
    pub min_s: Option<f64>,
    pub max_s: Option<f64>,
    pub mean_s: Option<f64>,
    pub median_s: Option<f64>,
}

/// Everything one detector/truth pairing produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeToDetectReport {
    pub detector_source: Option<String>,
    pub truth_source: Option<String>,
    pub encounters: Vec<Encounter>,
    pub metrics: MetricsSnapshot,
}

impl TimeToDetectReport {
    /// One sample per detected encounter, in encounter order.
    pub fn latencies(&self) -> Vec<f64> {
        self.encounters
            .iter()
            .filter_map(|e| e.first_corroboration_latency_s)
            .collect()
    }

    pub fn undetected(&self) -> impl Iterator<Item = &Encounter> {
        self.encounters.iter().filter(|e| !e.is_detected())
    }

    pub fn summary(&self) -> LatencySummary {
        let latencies = self.latencies();
        LatencySummary {
            encounters: self.encounters.len(),
            detected: latencies.len(),
            min_s: StatsHelper::min(&latencies),
            max_s: StatsHelper::max(&latencies),
            mean_s: StatsHelper::mean(&latencies),
            median_s: StatsHelper::median(&latencies),
        }
    }
}

/// Time-to-detect engine for one detector configuration.
pub struct TimeToDetect {
    fov_test: FovTest,
    corroboration: CorroborationTest,
    window_s: f64,
    logger: LogManager,
}

impl TimeToDetect {
    pub fn new(
        fov: FieldOfView,
        pose: DetectorPose,
        config: &ValidationConfig,
    ) -> ValidationResult<Self> {
        Self::with_fov_options(fov, pose, FovOptions::default(), config)
    }

    pub fn with_fov_options(
        fov: FieldOfView,
        pose: DetectorPose,
        options: FovOptions,
        config: &ValidationConfig,
    ) -> ValidationResult<Self> {
        config.validate()?;
        Ok(Self {
            fov_test: FovTest::with_options(fov, pose, options)?,
            corroboration: CorroborationTest::new(config.tolerances),
            window_s: config.window_s,
            logger: LogManager::new("time-to-detect"),
        })
    }

    /// Runs the encounter state machine over one detector source and one
    /// truth source. Inputs need not be sorted.
    pub fn compute(
        &self,
        detector_points: &[Point],
        truth_points: &[Point],
    ) -> ValidationResult<TimeToDetectReport> {
        self.run(detector_points, truth_points, None)
    }

    /// Same as [`TimeToDetect::compute`], keeping only encounters that enter
    /// the FoV within `[from, to]`. The whole truth track still drives the
    /// FoV state, so a track already in view at `from` opens no encounter.
    pub fn compute_in_span(
        &self,
        detector_points: &[Point],
        truth_points: &[Point],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ValidationResult<TimeToDetectReport> {
        self.run(detector_points, truth_points, Some((from, to)))
    }

    fn run(
        &self,
        detector_points: &[Point],
        truth_points: &[Point],
        span: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> ValidationResult<TimeToDetectReport> {
        ensure_single_source(detector_points, SourceRole::Detector)?;
        ensure_single_source(truth_points, SourceRole::Truth)?;

        let metrics = MetricsRecorder::new();
        let truth = self.fov_test.label(&chronological(truth_points), &metrics);
        let detector = chronological(detector_points);

        let mut encounters = self.segment(&truth, &detector);
        if let Some((from, to)) = span {
            encounters.retain(|e| e.entry_time() >= from && e.entry_time() <= to);
        }
        for encounter in encounters.iter_mut() {
            self.process(encounter, &metrics);
        }

        self.logger.record(&format!(
            "{} encounters, {} detected",
            encounters.len(),
            encounters.iter().filter(|e| e.is_detected()).count()
        ));

        Ok(TimeToDetectReport {
            detector_source: distinct_sources(detector_points).into_iter().next(),
            truth_source: distinct_sources(truth_points).into_iter().next(),
            encounters,
            metrics: metrics.snapshot(),
        })
    }

    fn segment(&self, truth: &[Point], detector: &[Point]) -> Vec<Encounter> {
        let mut state = FovState::OutsideFov;
        let mut encounters = Vec::new();

        for point in truth {
            let Some(fov) = point.annotations.fov else {
                continue;
            };
            match (state, fov.is_in_fov) {
                (FovState::OutsideFov, true) => {
                    state = FovState::InsideFov;
                    encounters.push(Encounter::new(
                        point.clone(),
                        self.window(truth, point),
                        self.window(detector, point),
                    ));
                }
                (FovState::InsideFov, false) => state = FovState::OutsideFov,
                _ => {}
            }
        }
        encounters
    }

    fn window(&self, points: &[Point], entry: &Point) -> Vec<Point> {
        points
            .iter()
            .filter(|p| p.seconds_from(entry) < self.window_s)
            .cloned()
            .collect()
    }

    fn process(&self, encounter: &mut Encounter, metrics: &MetricsRecorder) {
        let mut best: Option<(usize, f64)> = None;

        for index in 0..encounter.detector_window.len() {
            let passed = self.corroboration.is_corroborated(
                &encounter.detector_window[index],
                &encounter.truth_window,
                metrics,
            );
            let report = &mut encounter.detector_window[index];
            report.annotations.corroborated = Some(passed);
            if !passed {
                continue;
            }
            let latency = report.seconds_from(&encounter.entry_point);
            report.annotations.time_difference_s = Some(latency);
            encounter.corroborated.push(index);
            if best.map_or(true, |(_, current)| latency < current) {
                best = Some((index, latency));
            }
        }

        encounter.first_corroboration_index = best.map(|(index, _)| index);
        encounter.first_corroboration_latency_s = best.map(|(_, latency)| latency);
        metrics.record_encounter(best.is_some());

        if best.is_none() {
            self.logger.record(&format!(
                "encounter entering at {}: no corroborated detector report among {} samples",
                encounter.entry_time(),
                encounter.detector_window.len()
            ));
        }
    }
}

/// Unannotated copies of `points` in time order.
fn chronological(points: &[Point]) -> Vec<Point> {
    let mut sorted: Vec<Point> = points.iter().map(Point::unannotated).collect();
    sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    sorted
}

/// Encounters and their latencies under default corroboration tolerances.
pub fn compute_time_to_detect(
    detector_points: &[Point],
    truth_points: &[Point],
    fov: &FieldOfView,
    pose: &DetectorPose,
    window_s: f64,
) -> ValidationResult<Vec<Encounter>> {
    let config = ValidationConfig {
        window_s,
        ..Default::default()
    };
    let engine = TimeToDetect::new(*fov, *pose, &config)?;
    Ok(engine.compute(detector_points, truth_points)?.encounters)
}
