use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Data-quality counters for a single computation.
///
/// One recorder belongs to one run; nothing here is process-wide.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    fov_evaluated: AtomicUsize,
    missing_fields: AtomicUsize,
    corroborated: AtomicUsize,
    encounters: AtomicUsize,
    undetected_encounters: AtomicUsize,
}

/// Point-in-time copy of a [`MetricsRecorder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub fov_evaluated: usize,
    pub missing_fields: usize,
    pub corroborated: usize,
    pub encounters: usize,
    pub undetected_encounters: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fov_evaluated(&self) {
        self.fov_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_missing_fields(&self) {
        self.missing_fields.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_corroborated(&self) {
        self.corroborated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_encounter(&self, detected: bool) {
        self.encounters.fetch_add(1, Ordering::Relaxed);
        if !detected {
            self.undetected_encounters.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fov_evaluated: self.fov_evaluated.load(Ordering::Relaxed),
            missing_fields: self.missing_fields.load(Ordering::Relaxed),
            corroborated: self.corroborated.load(Ordering::Relaxed),
            encounters: self.encounters.load(Ordering::Relaxed),
            undetected_encounters: self.undetected_encounters.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_events() {
        let metrics = MetricsRecorder::new();
        metrics.record_fov_evaluated();
        metrics.record_missing_fields();
        metrics.record_encounter(true);
        metrics.record_encounter(false);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.fov_evaluated, 1);
        assert_eq!(snapshot.missing_fields, 1);
        assert_eq!(snapshot.encounters, 2);
        assert_eq!(snapshot.undetected_encounters, 1);
        assert_eq!(snapshot.corroborated, 0);
    }
}
