//! Monitor report output.
//!
//! Both series are written as one JSON document plus a tab-separated file
//! per series that plotting tools can read directly.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use serde::Serialize;

use super::drops::DropSample;
use super::queue::QueueSample;

pub const QUEUE_TSV: &str = "queue_length.tsv";
pub const DROP_TSV: &str = "drop_ratio.tsv";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonitorReport {
    pub queue_samples: Vec<QueueSample>,
    pub drop_samples: Vec<DropSample>,
}

impl MonitorReport {
    pub fn peak_queue_length(&self) -> u32 {
        self.queue_samples
            .iter()
            .map(|s| s.max_queue_length)
            .max()
            .unwrap_or(0)
    }

    pub fn queue_tsv(&self) -> String {
        let mut out = String::new();
        for sample in &self.queue_samples {
            let _ = writeln!(out, "{}\t{}", sample.time.as_secs_f64(), sample.max_queue_length);
        }
        out
    }

    pub fn drop_tsv(&self) -> String {
        let mut out = String::new();
        for sample in &self.drop_samples {
            let _ = writeln!(out, "{}\t{}", sample.time.as_secs_f64(), sample.ratio);
        }
        out
    }
}

/// Generate JSON report
pub fn write_json_report(report: &MonitorReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialize monitor report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write monitor report to {}", output_path.display()))?;

    log::info!("Monitor report written to {}", output_path.display());
    Ok(())
}

/// Write one TSV per series into `dir`
pub fn write_tsv_reports(report: &MonitorReport, dir: &Path) -> Result<()> {
    for (name, contents) in [(QUEUE_TSV, report.queue_tsv()), (DROP_TSV, report.drop_tsv())] {
        let path = dir.join(name);
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}
