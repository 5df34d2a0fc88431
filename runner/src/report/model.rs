use crate::workflow::config::WorkflowConfig;
use crate::workflow::runner::{PairingResult, WorkflowResult};
use chrono::{DateTime, Utc};
use fovcore::math::StatsHelper;
use fovcore::processing::LatencySummary;
use fovcore::{FieldOfView, ValidationConfig};
use serde::Serialize;
use std::path::PathBuf;

/// What one input file contributed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InputTally {
    pub path: PathBuf,
    pub source: String,
    pub points: usize,
    pub skipped: usize,
    /// Why the whole file was left out, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Serialized output of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub field_of_view: FieldOfView,
    pub validation: ValidationConfig,
    pub inputs: Vec<InputTally>,
    pub overall: LatencySummary,
    pub pairings: Vec<PairingResult>,
}

impl RunReport {
    pub fn new(config: &WorkflowConfig, inputs: Vec<InputTally>, result: WorkflowResult) -> Self {
        let latencies = result.latencies();
        let overall = LatencySummary {
            encounters: result.encounter_count(),
            detected: result.detected_count(),
            min_s: StatsHelper::min(&latencies),
            max_s: StatsHelper::max(&latencies),
            mean_s: StatsHelper::mean(&latencies),
            median_s: StatsHelper::median(&latencies),
        };
        Self {
            generated_at: Utc::now(),
            field_of_view: config.detector.fov,
            validation: config.validation.clone(),
            inputs,
            overall,
            pairings: result.pairings,
        }
    }

    pub fn skipped_records(&self) -> usize {
        self.inputs.iter().map(|i| i.skipped).sum()
    }

    pub fn failed_inputs(&self) -> impl Iterator<Item = &InputTally> {
        self.inputs.iter().filter(|i| i.error.is_some())
    }
}
