use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::point::{seconds_between, Point};

/// Time-contiguous run of points from one source.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<'a> {
    points: Vec<&'a Point>,
}

impl<'a> Block<'a> {
    /// Callers guarantee `points` is non-empty and sorted by timestamp.
    pub(crate) fn from_sorted(points: Vec<&'a Point>) -> Self {
        debug_assert!(!points.is_empty());
        Self { points }
    }

    pub fn points(&self) -> &[&'a Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn source(&self) -> &'a str {
        self.points[0].source.as_str()
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.points[0].timestamp
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.points[self.points.len() - 1].timestamp
    }

    pub fn duration_s(&self) -> f64 {
        seconds_between(self.start(), self.end())
    }

    /// Owned copies of the block's points, ready for annotation.
    pub fn to_points(&self) -> Vec<Point> {
        self.points.iter().map(|p| p.unannotated()).collect()
    }
}

/// The window of data around a truth track's entry into the field of view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encounter {
    pub entry_point: Point,
    pub truth_window: Vec<Point>,
    pub detector_window: Vec<Point>,
    /// Indices into `detector_window` of reports that passed corroboration.
    pub corroborated: Vec<usize>,
    pub first_corroboration_latency_s: Option<f64>,
    /// Index into `detector_window` of the report that set the latency.
    pub first_corroboration_index: Option<usize>,
}

impl Encounter {
    pub fn new(entry_point: Point, truth_window: Vec<Point>, detector_window: Vec<Point>) -> Self {
        Self {
            entry_point,
            truth_window,
            detector_window,
            corroborated: Vec::new(),
            first_corroboration_latency_s: None,
            first_corroboration_index: None,
        }
    }

    pub fn entry_time(&self) -> DateTime<Utc> {
        self.entry_point.timestamp
    }

    pub fn is_detected(&self) -> bool {
        self.first_corroboration_latency_s.is_some()
    }

    pub fn corroborated_detector_points(&self) -> impl Iterator<Item = &Point> {
        self.corroborated
            .iter()
            .filter_map(|&index| self.detector_window.get(index))
    }

    pub fn first_corroborated_point(&self) -> Option<&Point> {
        self.first_corroboration_index
            .and_then(|index| self.detector_window.get(index))
    }
}
