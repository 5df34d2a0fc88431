use crate::parsers::adsb::parse_adsb_log;
use crate::parsers::gpx::parse_gpx_log;
use crate::parsers::mavlink::parse_mavlink_log;
use crate::parsers::nmea::parse_nmea_log;
use crate::parsers::radar::parse_radar_log;
use crate::parsers::{source_name, ParseOutcome};
use crate::report::model::InputTally;
use crate::workflow::config::WorkflowConfig;
use crate::workflow::runner::{DetectorInput, WorkflowInputs};
use std::path::{Path, PathBuf};

type TruthReader = fn(&Path, Option<&str>) -> anyhow::Result<ParseOutcome>;

fn tally(path: &Path, source: &str, outcome: &ParseOutcome) -> InputTally {
    if !outcome.skipped.is_empty() {
        log::warn!(
            "{}: skipped {} of {} records",
            path.display(),
            outcome.skipped.len(),
            outcome.skipped.len() + outcome.points.len()
        );
    }
    InputTally {
        path: path.to_path_buf(),
        source: source.to_string(),
        points: outcome.points.len(),
        skipped: outcome.skipped.len(),
        error: None,
    }
}

fn failed(path: &Path, err: &anyhow::Error) -> InputTally {
    log::warn!("leaving out {}: {:#}", path.display(), err);
    InputTally {
        path: path.to_path_buf(),
        source: source_name(path),
        points: 0,
        skipped: 0,
        error: Some(format!("{:#}", err)),
    }
}

/// Reads every configured log. Each truth file is its own source, named
/// after its file stem, so separate tracks never merge.
pub fn load_inputs(config: &WorkflowConfig) -> anyhow::Result<(WorkflowInputs, Vec<InputTally>)> {
    let mut inputs = WorkflowInputs::default();
    let mut tallies = Vec::new();

    for path in &config.inputs.radar {
        match parse_radar_log(path, config.detector.pitch, config.detector.roll) {
            Ok(radar) => {
                tallies.push(tally(path, &radar.source, &radar.outcome));
                inputs.detectors.push(DetectorInput {
                    source: radar.source,
                    pose: radar.pose,
                    points: radar.outcome.points,
                });
            }
            Err(err) => tallies.push(failed(path, &err)),
        }
    }

    let readers: [(&Vec<PathBuf>, TruthReader); 4] = [
        (&config.inputs.adsb, parse_adsb_log),
        (&config.inputs.mavlink, parse_mavlink_log),
        (&config.inputs.gpx, parse_gpx_log),
        (&config.inputs.nmea, parse_nmea_log),
    ];
    for (paths, read) in readers {
        for path in paths {
            let outcome = read(path, None)?;
            tallies.push(tally(path, &source_name(path), &outcome));
            inputs.truth.extend(outcome.points);
        }
    }

    Ok((inputs, tallies))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::runner::Runner;
    use chrono::{Duration, TimeZone, Utc};
    use fovcore::math::{local_enu_to_geodetic, LocalEnu};
    use fovcore::{DetectorPose, FieldOfView};
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    const RADAR_CONFIG: &str = r#"{
        "name": "north",
        "receiver": {
            "latitude": {"value": 65.12624067, "unit": "°"},
            "longitude": {"value": -147.47648183, "unit": "°"},
            "elevation": {"value": 211.8, "unit": "m"},
            "orientation": {"value": 0.0, "unit": "°"}
        }
    }"#;

    fn pose() -> DetectorPose {
        DetectorPose::new(65.12624067, -147.47648183, 211.8, 0.0)
    }

    fn stamp(seconds: i64) -> String {
        (Utc.with_ymd_and_hms(2021, 1, 27, 20, 0, 0).unwrap() + Duration::seconds(seconds))
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }

    fn adsb_record(seconds: i64, east: f64, north: f64) -> serde_json::Value {
        let p = local_enu_to_geodetic(
            LocalEnu {
                east,
                north,
                up: 100.0,
            },
            pose().position(),
        );
        json!({
            "timeStamp": stamp(seconds),
            "latDD": p.latitude,
            "lonDD": p.longitude,
            "altitudeMM": p.altitude * 1000.0,
        })
    }

    /// One aircraft flies into view at t=3; the other stays behind the
    /// detector the whole time. Both are logged at 1 Hz.
    #[test]
    fn simultaneous_truth_files_stay_separate_sources() {
        let dir = tempdir().unwrap();
        let entering: Vec<_> = (0..20)
            .map(|s| {
                if s < 3 {
                    adsb_record(s, -1500.0, 500.0)
                } else {
                    adsb_record(s, 0.0, 1000.0)
                }
            })
            .collect();
        let behind: Vec<_> = (0..20).map(|s| adsb_record(s, 0.0, -1000.0)).collect();
        let entering_path = dir.path().join("n123_adsb.log");
        let behind_path = dir.path().join("n456_adsb.log");
        fs::write(&entering_path, serde_json::to_string(&entering).unwrap()).unwrap();
        fs::write(&behind_path, serde_json::to_string(&behind).unwrap()).unwrap();

        let radar_path = dir.path().join("north_radar.log");
        fs::write(dir.path().join("north_radar_config.log"), RADAR_CONFIG).unwrap();
        fs::write(
            &radar_path,
            json!([{"timeStamp": stamp(4), "rest": 1004.98, "azest": 0.0, "elest": 5.71}])
                .to_string(),
        )
        .unwrap();

        let mut config = WorkflowConfig::default();
        config.detector.fov = FieldOfView::new(2000.0, -60.0, 60.0, -10.0, 30.0).unwrap();
        config.inputs.radar = vec![radar_path];
        config.inputs.adsb = vec![entering_path, behind_path];

        let (inputs, tallies) = load_inputs(&config).unwrap();
        let sources: Vec<&str> = inputs.truth_by_source().keys().copied().collect();
        assert_eq!(sources, vec!["n123_adsb", "n456_adsb"]);
        assert_eq!(tallies.len(), 3);

        let result = Runner::new(config).execute(&inputs).unwrap();
        assert_eq!(result.pairings.len(), 2);
        assert_eq!(result.encounter_count(), 1);
        let entering = result
            .pairings
            .iter()
            .find(|p| p.truth_source == "n123_adsb")
            .unwrap();
        assert_eq!(entering.summary.encounters, 1);
        assert_eq!(entering.summary.detected, 1);
    }

    #[test]
    fn radar_log_without_config_is_reported() {
        let dir = tempdir().unwrap();
        let orphan = dir.path().join("orphan_radar.log");
        fs::write(&orphan, "[]").unwrap();

        let mut config = WorkflowConfig::default();
        config.inputs.radar = vec![orphan.clone()];

        let (inputs, tallies) = load_inputs(&config).unwrap();
        assert!(inputs.detectors.is_empty());
        assert_eq!(tallies.len(), 1);
        assert_eq!(tallies[0].path, orphan);
        assert_eq!(tallies[0].points, 0);
        assert!(tallies[0].error.as_deref().unwrap().contains("no usable config"));
    }
}
