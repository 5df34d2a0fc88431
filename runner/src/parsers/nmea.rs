use anyhow::{bail, Context};
use chrono::{NaiveDate, TimeZone, Utc};
use fovcore::Point;
use nmea_parser::{NmeaParser, ParsedMessage};
use std::fs;
use std::path::Path;

use super::{source_name, ParseOutcome};

/// NMEA fixes carry a time of day only; the date comes from a
/// `YYYY_MM_DD_` file name prefix.
pub fn nmea_date(path: &Path) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;
    let mut parts = name.splitn(4, '_');
    let year = parts.next()?.parse().ok()?;
    let month = parts.next()?.parse().ok()?;
    let day = parts.next()?.parse().ok()?;
    parts.next()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Reads GGA fixes from an NMEA 0183 log. Other sentences carry no
/// altitude and are skipped.
pub fn parse_nmea_log(path: &Path, source: Option<&str>) -> anyhow::Result<ParseOutcome> {
    let Some(date) = nmea_date(path) else {
        bail!(
            "{} does not start with a YYYY_MM_DD_ date; NMEA times cannot be placed",
            path.display()
        );
    };
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading NMEA {}", path.display()))?;
    let source = source.map(str::to_owned).unwrap_or_else(|| source_name(path));
    let mut parser = NmeaParser::new();
    let mut outcome = ParseOutcome::default();

    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let gga = match parser.parse_sentence(line) {
            Ok(ParsedMessage::Gga(gga)) => gga,
            Ok(_) => {
                outcome.skip(index, "sentence without altitude");
                continue;
            }
            Err(err) => {
                outcome.skip(index, format!("malformed sentence: {}", err));
                continue;
            }
        };
        let (Some(lat), Some(lon), Some(alt), Some(fix)) =
            (gga.latitude, gga.longitude, gga.altitude, gga.timestamp)
        else {
            outcome.skip(index, "GGA without a position fix");
            continue;
        };
        let timestamp = Utc.from_utc_datetime(&date.and_time(fix.time()));
        outcome
            .points
            .push(Point::new(source.as_str(), timestamp, lat, lon, alt));
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn date_comes_from_file_name() {
        assert_eq!(
            nmea_date(&PathBuf::from("logs/2021_01_29_walkaround.nmea")),
            NaiveDate::from_ymd_opt(2021, 1, 29)
        );
        assert_eq!(nmea_date(&PathBuf::from("walkaround.nmea")), None);
        assert_eq!(nmea_date(&PathBuf::from("2021_13_29_bad.nmea")), None);
    }

    #[test]
    fn gga_fixes_become_points() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("2021_01_29_walkaround.nmea");
        fs::write(
            &path,
            "$GPGGA,010656.00,6448.22452,N,14752.87782,W,1,08,0.9,147.7,M,10.2,M,,*77\n\
             $GPRMC,010656.00,A,6448.22452,N,14752.87782,W,0.0,0.0,290121,,,A*4B\n\
             \n\
             $GPGGA,010657.00,6448.23000,N,14752.88000,W,1,08,0.9,148.2,M,10.2,M,,*7C\n\
             $GPGGA,garbage*00\n",
        )
        .unwrap();

        let outcome = parse_nmea_log(&path, None).unwrap();
        assert_eq!(outcome.points.len(), 2);
        assert_eq!(outcome.skipped.len(), 2);

        let first = &outcome.points[0];
        assert_eq!(first.source, "2021_01_29_walkaround");
        assert!((first.latitude.unwrap() - (64.0 + 48.22452 / 60.0)).abs() < 1e-9);
        assert!((first.longitude.unwrap() + (147.0 + 52.87782 / 60.0)).abs() < 1e-9);
        assert!((first.altitude.unwrap() - 147.7).abs() < 1e-6);
        assert_eq!(
            first.timestamp,
            Utc.with_ymd_and_hms(2021, 1, 29, 1, 6, 56).unwrap()
        );
    }

    #[test]
    fn undated_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("walkaround.nmea");
        fs::write(&path, "").unwrap();
        assert!(parse_nmea_log(&path, None).is_err());
    }
}
