//! Scan aggregation and operator-facing output.
//!
//! A `ScanReport` is built once per run by the scanner, then only read:
//! grouped by date for the detailed listing, and ranked by absolute diff for
//! the worst-offender list.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{DateOrder, DiffIssue};
use crate::engine::EngineFailure;

pub mod format;

pub use format::*;

/// Length of the worst-offender list.
pub const WORST_OFFENDERS: usize = 10;

/// Why a date contributed no results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", content = "failure", rename_all = "snake_case")]
pub enum SkipReason {
    Engine(EngineFailure),
    Regeneration(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Engine(failure) => write!(f, "engine {failure}"),
            SkipReason::Regeneration(reason) => write!(f, "fixture regeneration failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDate {
    pub date: NaiveDate,
    pub reason: SkipReason,
}

/// Everything one scan produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub label: String,
    pub threshold: f64,
    pub order: DateOrder,
    pub total_dates: usize,
    pub dates_tested: usize,
    pub skipped: Vec<SkippedDate>,
    pub issues: Vec<DiffIssue>,
}

impl ScanReport {
    pub fn new(label: impl Into<String>, threshold: f64, order: DateOrder, total_dates: usize) -> Self {
        Self {
            label: label.into(),
            threshold,
            order,
            total_dates,
            dates_tested: 0,
            skipped: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn dates_skipped(&self) -> usize {
        self.skipped.len()
    }

    /// Issues grouped by date; each group keeps encounter order.
    pub fn by_date(&self) -> BTreeMap<NaiveDate, Vec<&DiffIssue>> {
        let mut groups: BTreeMap<NaiveDate, Vec<&DiffIssue>> = BTreeMap::new();
        for issue in &self.issues {
            groups.entry(issue.date).or_default().push(issue);
        }
        groups
    }

    /// Date groups in the order the scan walked them.
    pub fn date_groups(&self) -> Vec<(NaiveDate, Vec<&DiffIssue>)> {
        let groups = self.by_date().into_iter();
        match self.order {
            DateOrder::Asc => groups.collect(),
            DateOrder::Desc => groups.rev().collect(),
        }
    }

    /// Largest `|diff|` first, at most `n`. Equal magnitudes keep encounter order.
    pub fn worst_offenders(&self, n: usize) -> Vec<&DiffIssue> {
        rank_by_magnitude(&self.issues, n)
    }
}

/// Stable ranking by descending absolute diff, truncated to `top_n`.
pub fn rank_by_magnitude(issues: &[DiffIssue], top_n: usize) -> Vec<&DiffIssue> {
    let mut sorted: Vec<&DiffIssue> = issues.iter().collect();
    sorted.sort_by(|a, b| b.diff.abs().total_cmp(&a.diff.abs()));
    sorted.truncate(top_n);
    sorted
}
