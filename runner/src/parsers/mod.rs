//! Source-specific log readers. Each one turns a file into [`Point`]s and
//! keeps a tally of the records it had to skip.

use anyhow::Context;
use chrono::{DateTime, Utc};
use fovcore::Point;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub mod adsb;
pub mod gpx;
pub mod mavlink;
pub mod nmea;
pub mod radar;

/// Points read from one file plus the records that were dropped.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub points: Vec<Point>,
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

impl ParseOutcome {
    pub fn skip(&mut self, index: usize, reason: impl Into<String>) {
        let reason = reason.into();
        log::debug!("skipping record {}: {}", index, reason);
        self.skipped.push(SkippedRecord { index, reason });
    }
}

/// RFC 3339 instant, with or without fractional seconds.
pub fn parse_timestamp(value: &str) -> anyhow::Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value.trim())
        .with_context(|| format!("parsing timestamp {:?}", value))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Reads `path` as a JSON array and decodes every element on its own, so
/// one malformed record does not sink the file.
pub(crate) fn read_records<T: DeserializeOwned>(
    path: &Path,
) -> anyhow::Result<Vec<Result<T, serde_json::Error>>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading log {}", path.display()))?;
    let records: Vec<serde_json::Value> = serde_json::from_str(&contents)
        .with_context(|| format!("parsing log {}", path.display()))?;
    Ok(records.into_iter().map(serde_json::from_value).collect())
}

/// File stem used as a source name when nothing better is known.
pub fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
