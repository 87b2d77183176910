//! Formatted terminal output for scan reports.
//!
//! Formatting stays in one place so scanner code never prints, and so output
//! changes are localized.

use crate::domain::{DiffIssue, ReportDetail};
use crate::report::{ScanReport, WORST_OFFENDERS};

const WIDTH: usize = 100;

/// Format the full operator report.
///
/// The header with tested/skipped counts is always printed, even when every
/// date failed, so partial coverage is visible.
pub fn format_scan_report(report: &ScanReport, detail: ReportDetail) -> String {
    let heavy = "=".repeat(WIDTH);
    let light = "-".repeat(WIDTH);
    let mut out = String::new();

    out.push_str(&format!("{heavy}\n"));
    out.push_str(&format!("SUMMARY: {}\n", report.label));
    out.push_str(&format!("  Total dates found: {}\n", report.total_dates));
    out.push_str(&format!("  Dates tested: {}\n", report.dates_tested));
    out.push_str(&format!("  Dates skipped: {}\n", report.dates_skipped()));
    out.push_str(&format!(
        "  Cases with |diff| > {} bp: {}\n",
        report.threshold,
        report.issues.len()
    ));
    out.push_str(&format!("{heavy}\n"));

    if !report.skipped.is_empty() {
        out.push_str("\nSkipped dates:\n");
        for skipped in &report.skipped {
            out.push_str(&format!("  {}  {}\n", skipped.date, skipped.reason));
        }
    }

    if report.issues.is_empty() {
        out.push_str(&format!(
            "\nAll tested dates have differences <= {} bp.\n",
            report.threshold
        ));
        return out;
    }

    let groups = report.date_groups();
    out.push_str(&format!("\nDates with issues: {}\n", groups.len()));

    for (date, issues) in &groups {
        out.push_str(&format!("\n{heavy}\n"));
        out.push_str(&format!("Date: {date} ({})\n", date.format("%Y%m%d")));
        out.push_str(&format!("{light}\n"));
        for issue in issues {
            out.push_str(&format_issue_row(issue, detail));
        }
    }

    out.push_str(&format!("\n{heavy}\n"));
    out.push_str(&format!(
        "WORST OFFENDERS (top {WORST_OFFENDERS} by absolute difference):\n"
    ));
    out.push_str(&format!("{heavy}\n"));
    for (rank, issue) in report.worst_offenders(WORST_OFFENDERS).iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {} - {} {} {}\n",
            rank + 1,
            issue.date,
            issue.source,
            issue.index_pair,
            issue.tenor
        ));
        match detail {
            ReportDetail::Brief => {
                out.push_str(&format!("   Diff: {:>8.4} bp\n", issue.diff));
                out.push_str(&format!("   {}\n", issue.raw_line));
            }
            ReportDetail::Extended => {
                out.push_str(&format!(
                    "   Computed: {} bp | Database: {} bp\n",
                    fmt_opt(issue.computed),
                    fmt_opt(issue.reference)
                ));
                out.push_str(&format!("   Diff: {:>8.3} bp\n", issue.diff));
            }
        }
    }

    out
}

fn format_issue_row(issue: &DiffIssue, detail: ReportDetail) -> String {
    match detail {
        ReportDetail::Brief => format!(
            "{:<6} {:<25} {:<8} diff={:>8.4} bp\n  {}\n",
            issue.source, issue.index_pair, issue.tenor, issue.diff, issue.raw_line
        ),
        ReportDetail::Extended => format!(
            "{:<6} {:<25} {:<8}\n  Computed: {} bp | Database: {} bp | Diff: {:>8.3} bp\n",
            issue.source,
            issue.index_pair,
            issue.tenor,
            fmt_opt(issue.computed),
            fmt_opt(issue.reference),
            issue.diff
        ),
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:>8.3}"),
        None => format!("{:>8}", "n/a"),
    }
}
