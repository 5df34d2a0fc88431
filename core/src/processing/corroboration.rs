//! Point association check: is a detector report backed by any truth sample?
//!
//! This is an existence test, not nearest-neighbour matching. The first
//! candidate inside the space/time bubble settles it.

use crate::math::great_circle_distance;
use crate::model::Point;
use crate::prelude::CorroborationTolerances;
use crate::telemetry::{LogManager, MetricsRecorder};

/// Detector/truth association under fixed tolerances.
pub struct CorroborationTest {
    tolerances: CorroborationTolerances,
    logger: LogManager,
}

impl CorroborationTest {
    pub fn new(tolerances: CorroborationTolerances) -> Self {
        Self {
            tolerances,
            logger: LogManager::new("corroboration"),
        }
    }

    /// `true` when some candidate lies within every tolerance of `point`.
    ///
    /// A detector point without a position is never corroborated. Candidates
    /// missing a coordinate are skipped, logged and counted.
    pub fn is_corroborated(
        &self,
        point: &Point,
        candidates: &[Point],
        metrics: &MetricsRecorder,
    ) -> bool {
        let Some(position) = point.position() else {
            self.logger.degraded(&format!(
                "{} report at {} has no position; not corroborated",
                point.source, point.timestamp
            ));
            metrics.record_missing_fields();
            return false;
        };

        let rule = self.tolerances.boundary;
        for candidate in candidates {
            let Some(truth) = candidate.position() else {
                log::debug!(
                    "skipping {} candidate at {}: incomplete position",
                    candidate.source,
                    candidate.timestamp
                );
                metrics.record_missing_fields();
                continue;
            };

            let time_delta = point.seconds_from(candidate);
            if !rule.within(time_delta, self.tolerances.max_time_deviation_s) {
                continue;
            }
            let horizontal_delta = great_circle_distance(
                position.latitude,
                position.longitude,
                truth.latitude,
                truth.longitude,
            );
            if !rule.within(horizontal_delta, self.tolerances.max_horizontal_deviation_m) {
                continue;
            }
            let vertical_delta = (position.altitude - truth.altitude).abs();
            if !rule.within(vertical_delta, self.tolerances.max_vertical_deviation_m) {
                continue;
            }
            metrics.record_corroborated();
            return true;
        }
        false
    }

    /// Fraction of `points` corroborated by `candidates`; `None` when empty.
    pub fn rate(&self, points: &[Point], candidates: &[Point], metrics: &MetricsRecorder) -> Option<f64> {
        if points.is_empty() {
            return None;
        }
        let passed = points
            .iter()
            .filter(|point| self.is_corroborated(point, candidates, metrics))
            .count();
        Some(passed as f64 / points.len() as f64)
    }
}

/// One-shot corroboration check.
pub fn compute_corroboration(
    point: &Point,
    candidates: &[Point],
    tolerances: &CorroborationTolerances,
) -> bool {
    CorroborationTest::new(*tolerances).is_corroborated(point, candidates, &MetricsRecorder::new())
}

/// Fraction of detector `points` corroborated by `candidates`.
pub fn corroboration_rate(
    points: &[Point],
    candidates: &[Point],
    tolerances: &CorroborationTolerances,
) -> Option<f64> {
    CorroborationTest::new(*tolerances).rate(points, candidates, &MetricsRecorder::new())
}
