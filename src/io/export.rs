//! Export a scan report to JSON.
//!
//! The file carries the full report (counts, skipped dates with reasons, every
//! flagged issue) plus the worst-offender ranking, so downstream scripts do not
//! need to re-rank.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::domain::DiffIssue;
use crate::error::AppError;
use crate::report::{ScanReport, WORST_OFFENDERS};

#[derive(Debug, Serialize)]
struct ReportFile<'a> {
    tool: &'static str,
    version: &'static str,
    #[serde(flatten)]
    report: &'a ScanReport,
    dates_skipped: usize,
    worst_offenders: Vec<&'a DiffIssue>,
}

/// Write `report` as pretty-printed JSON.
pub fn write_report_json(path: &Path, report: &ScanReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create report JSON '{}': {e}", path.display())))?;

    let export = ReportFile {
        tool: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        report,
        dates_skipped: report.dates_skipped(),
        worst_offenders: report.worst_offenders(WORST_OFFENDERS),
    };

    serde_json::to_writer_pretty(BufWriter::new(file), &export)
        .map_err(|e| AppError::new(4, format!("Failed to write report JSON: {e}")))?;

    Ok(())
}
