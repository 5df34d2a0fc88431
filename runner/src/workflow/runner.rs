use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use fovcore::processing::{block_by_time, corroboration_rate, LatencySummary};
use fovcore::{DetectorPose, Point, TimeToDetect, TimeToDetectReport};
use serde::Serialize;
use std::collections::BTreeMap;

/// Reports from one detector, with the pose they were recorded at.
#[derive(Debug, Clone)]
pub struct DetectorInput {
    pub source: String,
    pub pose: DetectorPose,
    pub points: Vec<Point>,
}

/// Everything a run evaluates: any number of detectors and truth sources.
#[derive(Debug, Clone, Default)]
pub struct WorkflowInputs {
    pub detectors: Vec<DetectorInput>,
    pub truth: Vec<Point>,
}

impl WorkflowInputs {
    /// Truth points grouped by source name.
    pub fn truth_by_source(&self) -> BTreeMap<&str, Vec<Point>> {
        let mut grouped: BTreeMap<&str, Vec<Point>> = BTreeMap::new();
        for point in &self.truth {
            grouped
                .entry(point.source.as_str())
                .or_default()
                .push(point.clone());
        }
        grouped
    }
}

/// One detector block evaluated against one truth source.
#[derive(Debug, Clone, Serialize)]
pub struct PairingResult {
    pub detector_source: String,
    pub truth_source: String,
    pub block_index: usize,
    pub block_start: DateTime<Utc>,
    pub block_end: DateTime<Utc>,
    pub detector_points: usize,
    pub truth_points: usize,
    /// Share of the block's reports that have a truth sample nearby.
    pub corroboration_rate: Option<f64>,
    pub summary: LatencySummary,
    pub report: TimeToDetectReport,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowResult {
    pub pairings: Vec<PairingResult>,
}

impl WorkflowResult {
    pub fn encounter_count(&self) -> usize {
        self.pairings.iter().map(|p| p.summary.encounters).sum()
    }

    pub fn detected_count(&self) -> usize {
        self.pairings.iter().map(|p| p.summary.detected).sum()
    }

    /// Every latency sample across all pairings.
    pub fn latencies(&self) -> Vec<f64> {
        self.pairings
            .iter()
            .flat_map(|p| p.report.latencies())
            .collect()
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn execute(&self, inputs: &WorkflowInputs) -> anyhow::Result<WorkflowResult> {
        let validation = &self.config.validation;
        let window = Duration::microseconds((validation.window_s * 1e6).round() as i64);
        let truth_sources = inputs.truth_by_source();
        let mut result = WorkflowResult::default();

        for detector in &inputs.detectors {
            let engine = TimeToDetect::with_fov_options(
                self.config.detector.fov,
                detector.pose,
                self.config.detector.fov_options,
                validation,
            )
            .with_context(|| format!("configuring detector {}", detector.source))?;

            let blocks = block_by_time(&detector.points, validation.gap_threshold_s)
                .with_context(|| format!("blocking detector {}", detector.source))?;
            log::info!("{}: {} blocks", detector.source, blocks.len());

            for (block_index, block) in blocks.iter().enumerate() {
                let from = block.start() - window;
                let to = block.end() + window;
                let block_points = block.to_points();

                for (truth_source, truth_points) in &truth_sources {
                    let truth: Vec<Point> = truth_points
                        .iter()
                        .filter(|p| p.timestamp >= from && p.timestamp <= to)
                        .cloned()
                        .collect();
                    if truth.is_empty() {
                        log::debug!(
                            "{} block {} has no {} truth in span",
                            detector.source,
                            block_index,
                            truth_source
                        );
                        continue;
                    }

                    // The full track decides FoV state; the span only selects entries.
                    let report = engine
                        .compute_in_span(&block_points, truth_points, from, to)
                        .with_context(|| {
                            format!(
                                "time-to-detect for {} block {} against {}",
                                detector.source, block_index, truth_source
                            )
                        })?;
                    let rate = corroboration_rate(&block_points, &truth, &validation.tolerances);

                    result.pairings.push(PairingResult {
                        detector_source: detector.source.clone(),
                        truth_source: truth_source.to_string(),
                        block_index,
                        block_start: block.start(),
                        block_end: block.end(),
                        detector_points: block.len(),
                        truth_points: truth.len(),
                        corroboration_rate: rate,
                        summary: report.summary(),
                        report,
                    });
                }
            }
        }

        Ok(result)
    }
}
