//! Geometry and association core for validating detector reports against
//! independent ground-truth tracks.
//!
//! Detector measurements are turned into geodetic positions, truth samples
//! are classified against the detector's field of view, detector reports are
//! checked for a nearby truth sample, and FoV entries are paired with the
//! first corroborated report to measure time-to-detect. Everything here is
//! pure, in-memory and deterministic.

pub mod math;
pub mod model;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use model::{Block, DetectorPose, Encounter, FieldOfView, Point};
pub use prelude::{CorroborationTolerances, ValidationConfig, ValidationError, ValidationResult};
pub use processing::{
    block_by_time, compute_corroboration, compute_fov_test, compute_time_to_detect, FovResult,
    TimeToDetect, TimeToDetectReport,
};
