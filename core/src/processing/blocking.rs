use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::model::{seconds_between, Block, Point};
use crate::prelude::{SourceRole, ValidationError, ValidationResult};

/// Distinct sources in `points`, sorted.
pub fn distinct_sources(points: &[Point]) -> Vec<String> {
    let mut sources: Vec<String> = points.iter().map(|p| p.source.clone()).collect();
    sources.sort();
    sources.dedup();
    sources
}

/// Fails with [`ValidationError::MixedSources`] if `points` spans several sources.
pub fn ensure_single_source(points: &[Point], role: SourceRole) -> ValidationResult<()> {
    let sources = distinct_sources(points);
    if sources.len() > 1 {
        return Err(ValidationError::MixedSources { role, sources });
    }
    Ok(())
}

/// Timestamp first; remaining fields only break ties so that the result does
/// not depend on input order.
fn chronological(a: &&Point, b: &&Point) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.track_id.cmp(&b.track_id))
        .then_with(|| cmp_coordinate(a.latitude, b.latitude))
        .then_with(|| cmp_coordinate(a.longitude, b.longitude))
        .then_with(|| cmp_coordinate(a.altitude, b.altitude))
}

fn cmp_coordinate(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

fn split(mut sorted: Vec<&Point>, gap_threshold_s: f64) -> Vec<Block<'_>> {
    sorted.sort_by(chronological);
    let mut blocks = Vec::new();
    let mut current: Vec<&Point> = Vec::new();
    for point in sorted {
        if let Some(previous) = current.last() {
            if seconds_between(previous.timestamp, point.timestamp) > gap_threshold_s {
                blocks.push(Block::from_sorted(std::mem::take(&mut current)));
            }
        }
        current.push(point);
    }
    if !current.is_empty() {
        blocks.push(Block::from_sorted(current));
    }
    blocks
}

/// Splits one source's points wherever consecutive timestamps are more than
/// `gap_threshold_s` apart.
pub fn block_by_time(points: &[Point], gap_threshold_s: f64) -> ValidationResult<Vec<Block<'_>>> {
    if !gap_threshold_s.is_finite() || gap_threshold_s < 0.0 {
        return Err(ValidationError::InvalidConfig(format!(
            "gap threshold must be non-negative (got {})",
            gap_threshold_s
        )));
    }
    ensure_single_source(points, SourceRole::Detector)?;
    Ok(split(points.iter().collect(), gap_threshold_s))
}

/// Groups `points` by source and blocks each group independently.
pub fn block_by_source(
    points: &[Point],
    gap_threshold_s: f64,
) -> ValidationResult<BTreeMap<String, Vec<Block<'_>>>> {
    if !gap_threshold_s.is_finite() || gap_threshold_s < 0.0 {
        return Err(ValidationError::InvalidConfig(format!(
            "gap threshold must be non-negative (got {})",
            gap_threshold_s
        )));
    }
    let mut by_source: BTreeMap<String, Vec<&Point>> = BTreeMap::new();
    for point in points {
        by_source.entry(point.source.clone()).or_default().push(point);
    }
    Ok(by_source
        .into_iter()
        .map(|(source, group)| (source, split(group, gap_threshold_s)))
        .collect())
}
