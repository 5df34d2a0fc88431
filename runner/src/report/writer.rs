use crate::report::model::RunReport;
use anyhow::Context;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub fn write_report(path: &Path, report: &RunReport) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(report).context("serializing run report")?;
    fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
    log::info!("report written to {}", path.display());
    Ok(())
}

fn seconds(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}s", v))
        .unwrap_or_else(|| "-".to_string())
}

/// Human-readable digest printed at the end of a run.
pub fn render_summary(report: &RunReport) -> String {
    let mut out = String::new();
    let overall = &report.overall;
    let _ = writeln!(
        out,
        "Time-to-detect -> encounters {}, detected {}, min {}, median {}, mean {}, max {}",
        overall.encounters,
        overall.detected,
        seconds(overall.min_s),
        seconds(overall.median_s),
        seconds(overall.mean_s),
        seconds(overall.max_s),
    );
    for pairing in &report.pairings {
        let rate = pairing
            .corroboration_rate
            .map(|r| format!("{:.1}%", r * 100.0))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "  {} block {} vs {}: {} reports, {} truth, corroborated {}, detected {}/{}",
            pairing.detector_source,
            pairing.block_index,
            pairing.truth_source,
            pairing.detector_points,
            pairing.truth_points,
            rate,
            pairing.summary.detected,
            pairing.summary.encounters,
        );
    }
    for failed in report.failed_inputs() {
        let _ = writeln!(
            out,
            "  left out {}: {}",
            failed.path.display(),
            failed.error.as_deref().unwrap_or_default()
        );
    }
    if report.skipped_records() > 0 {
        let _ = writeln!(out, "  skipped {} malformed records", report.skipped_records());
    }
    out
}
