use serde::{Deserialize, Serialize};

/// Default gap that splits a detector stream into separate blocks.
pub const DEFAULT_GAP_THRESHOLD_S: f64 = 600.0;

/// Default half-width of the encounter window around a FoV entry.
pub const DEFAULT_WINDOW_S: f64 = 60.0;

/// How a deviation that lands exactly on its tolerance is judged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryRule {
    /// `deviation <= tolerance` passes.
    #[default]
    Inclusive,
    /// `deviation < tolerance` passes.
    Exclusive,
}

impl BoundaryRule {
    pub fn within(self, deviation: f64, tolerance: f64) -> bool {
        match self {
            BoundaryRule::Inclusive => deviation <= tolerance,
            BoundaryRule::Exclusive => deviation < tolerance,
        }
    }
}

/// Space/time bubble a truth point must fall into to corroborate a report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorroborationTolerances {
    pub max_time_deviation_s: f64,
    pub max_horizontal_deviation_m: f64,
    pub max_vertical_deviation_m: f64,
    pub boundary: BoundaryRule,
}

impl Default for CorroborationTolerances {
    fn default() -> Self {
        Self {
            max_time_deviation_s: 15.0,
            max_horizontal_deviation_m: 10.0,
            max_vertical_deviation_m: 10.0,
            boundary: BoundaryRule::Inclusive,
        }
    }
}

impl CorroborationTolerances {
    pub fn validate(&self) -> ValidationResult<()> {
        let fields = [
            ("max_time_deviation_s", self.max_time_deviation_s),
            ("max_horizontal_deviation_m", self.max_horizontal_deviation_m),
            ("max_vertical_deviation_m", self.max_vertical_deviation_m),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidConfig(format!(
                    "{} must be a finite, non-negative number (got {})",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Shared configuration for a validation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationConfig {
    pub gap_threshold_s: f64,
    pub window_s: f64,
    pub tolerances: CorroborationTolerances,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            gap_threshold_s: DEFAULT_GAP_THRESHOLD_S,
            window_s: DEFAULT_WINDOW_S,
            tolerances: CorroborationTolerances::default(),
        }
    }
}

impl ValidationConfig {
    pub fn validate(&self) -> ValidationResult<()> {
        if !self.gap_threshold_s.is_finite() || self.gap_threshold_s < 0.0 {
            return Err(ValidationError::InvalidConfig(format!(
                "gap_threshold_s must be non-negative (got {})",
                self.gap_threshold_s
            )));
        }
        if !self.window_s.is_finite() || self.window_s <= 0.0 {
            return Err(ValidationError::InvalidConfig(format!(
                "window_s must be positive (got {})",
                self.window_s
            )));
        }
        self.tolerances.validate()
    }
}

/// Which side of a detector/truth pairing an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    Detector,
    Truth,
}

impl std::fmt::Display for SourceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceRole::Detector => write!(f, "detector"),
            SourceRole::Truth => write!(f, "truth"),
        }
    }
}

/// Structural misuse of the engine. Ordinary bad data never ends up here.
#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("{role} input mixes {} sources ({}); split per source first", .sources.len(), .sources.join(", "))]
    MixedSources {
        role: SourceRole,
        sources: Vec<String>,
    },
    #[error("invalid field of view: {0}")]
    InvalidFieldOfView(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;
