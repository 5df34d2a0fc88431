use fovcore::Point;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::{parse_timestamp, source_name, ParseOutcome};

/// Reads every `<trkpt>` of a GPX file. Track points need both `<ele>` and
/// `<time>` to become truth points.
pub fn parse_gpx_log(path: &Path, source: Option<&str>) -> anyhow::Result<ParseOutcome> {
    let source = source.map(str::to_owned).unwrap_or_else(|| source_name(path));
    let file = File::open(path)
        .map_err(|err| anyhow::anyhow!("opening GPX {}: {}", path.display(), err))?;
    let document = ::gpx::read(BufReader::new(file))
        .map_err(|err| anyhow::anyhow!("parsing GPX {}: {}", path.display(), err))?;

    let mut outcome = ParseOutcome::default();
    let waypoints = document
        .tracks
        .iter()
        .flat_map(|track| track.segments.iter())
        .flat_map(|segment| segment.points.iter());

    for (index, waypoint) in waypoints.enumerate() {
        let Some(elevation) = waypoint.elevation else {
            outcome.skip(index, "track point without elevation");
            continue;
        };
        let Some(time) = waypoint.time else {
            outcome.skip(index, "track point without time");
            continue;
        };
        let timestamp = match time
            .format()
            .map_err(|err| anyhow::anyhow!("formatting GPX time: {}", err))
            .and_then(|text| parse_timestamp(&text))
        {
            Ok(timestamp) => timestamp,
            Err(err) => {
                outcome.skip(index, format!("{:#}", err));
                continue;
            }
        };
        let position = waypoint.point();
        outcome.points.push(Point::new(
            source.as_str(),
            timestamp,
            position.y(),
            position.x(),
            elevation,
        ));
    }

    Ok(outcome)
}
