use fovcore::Point;
use serde::Deserialize;
use std::path::Path;

use super::{parse_timestamp, read_records, source_name, ParseOutcome};

/// One transponder broadcast as logged by the ground receiver.
#[derive(Debug, Deserialize)]
struct AdsbRecord {
    #[serde(rename = "timeStamp")]
    time_stamp: String,
    #[serde(rename = "latDD")]
    lat_dd: f64,
    #[serde(rename = "lonDD")]
    lon_dd: f64,
    /// Millimetres.
    #[serde(rename = "altitudeMM")]
    altitude_mm: f64,
}

/// Reads an ADS-B log; every point is tagged with `source` or the file stem.
pub fn parse_adsb_log(path: &Path, source: Option<&str>) -> anyhow::Result<ParseOutcome> {
    let source = source.map(str::to_owned).unwrap_or_else(|| source_name(path));
    let mut outcome = ParseOutcome::default();

    for (index, record) in read_records::<AdsbRecord>(path)?.into_iter().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                outcome.skip(index, format!("malformed record: {}", err));
                continue;
            }
        };
        if record.lat_dd == 0.0 && record.lon_dd == 0.0 {
            outcome.skip(index, "no position fix");
            continue;
        }
        let timestamp = match parse_timestamp(&record.time_stamp) {
            Ok(timestamp) => timestamp,
            Err(err) => {
                outcome.skip(index, format!("{:#}", err));
                continue;
            }
        };
        outcome.points.push(Point::new(
            source.as_str(),
            timestamp,
            record.lat_dd,
            record.lon_dd,
            record.altitude_mm / 1000.0,
        ));
    }

    Ok(outcome)
}
