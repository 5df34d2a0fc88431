use anyhow::Context;
use fovcore::Point;
use serde::Deserialize;
use std::path::Path;

use super::{parse_timestamp, read_records, source_name, ParseOutcome};

/// Autopilots log coordinates as integers, sometimes rendered in scientific
/// notation by the logger.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    fn value(&self) -> anyhow::Result<f64> {
        match self {
            RawNumber::Number(value) => Ok(*value),
            RawNumber::Text(text) => text
                .trim()
                .parse::<f64>()
                .with_context(|| format!("parsing number {:?}", text)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MavlinkRecord {
    #[serde(rename = "timeStamp")]
    time_stamp: String,
    /// Degrees x 1e7.
    latitude: RawNumber,
    /// Degrees x 1e7.
    longitude: RawNumber,
    /// Centimetres.
    altitude: RawNumber,
}

/// Degrees from the autopilot's degE7 integer encoding.
pub fn mavlink_coordinate(raw: f64) -> f64 {
    raw / 1e7
}

fn decode(record: &MavlinkRecord) -> anyhow::Result<(f64, f64, f64)> {
    Ok((
        mavlink_coordinate(record.latitude.value()?),
        mavlink_coordinate(record.longitude.value()?),
        record.altitude.value()? / 100.0,
    ))
}

/// Reads an autopilot telemetry log.
pub fn parse_mavlink_log(path: &Path, source: Option<&str>) -> anyhow::Result<ParseOutcome> {
    let source = source.map(str::to_owned).unwrap_or_else(|| source_name(path));
    let mut outcome = ParseOutcome::default();

    for (index, record) in read_records::<MavlinkRecord>(path)?.into_iter().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                outcome.skip(index, format!("malformed record: {}", err));
                continue;
            }
        };
        let (lat, lon, alt) = match decode(&record) {
            Ok(values) => values,
            Err(err) => {
                outcome.skip(index, format!("{:#}", err));
                continue;
            }
        };
        if lat == 0.0 && lon == 0.0 && alt == 0.0 {
            outcome.skip(index, "autopilot had no position");
            continue;
        }
        match parse_timestamp(&record.time_stamp) {
            Ok(timestamp) => outcome
                .points
                .push(Point::new(source.as_str(), timestamp, lat, lon, alt)),
            Err(err) => outcome.skip(index, format!("{:#}", err)),
        }
    }

    Ok(outcome)
}
