//! Regression scanner: drive the pricing engine across dates and collect
//! deviations above a threshold.
//!
//! Processing is strictly sequential. A failing date (timeout, non-zero exit,
//! launch error) is recorded as skipped and the scan moves on; nothing a
//! single date does can abort the run.

use chrono::NaiveDate;

use crate::domain::{DateOrder, ScanConfig};
use crate::engine::PricingEngineClient;
use crate::report::{ScanReport, SkipReason, SkippedDate};
use crate::scan::parse::classify_output;

/// Log a progress line every this many dates.
const PROGRESS_EVERY: usize = 50;

/// Result of processing one date.
#[derive(Debug, Clone, PartialEq)]
pub enum DateOutcome {
    /// The engine ran; this many issues were flagged.
    Tested { flagged: usize },
    Skipped(SkipReason),
}

pub struct RegressionScanner<'a> {
    engine: &'a mut dyn PricingEngineClient,
    threshold: f64,
    label: String,
    order: DateOrder,
}

impl<'a> RegressionScanner<'a> {
    /// Threshold, report label and date order all come from `config`.
    pub fn new(engine: &'a mut dyn PricingEngineClient, config: &ScanConfig) -> Self {
        Self {
            engine,
            threshold: config.threshold,
            label: config.label.clone(),
            order: config.order,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Empty report for a run over `total_dates` dates.
    pub fn empty_report(&self, total_dates: usize) -> ScanReport {
        ScanReport::new(&self.label, self.threshold, self.order, total_dates)
    }

    /// Invoke the engine for `date` and fold its output into `report`.
    pub fn scan_date(&mut self, date: NaiveDate, report: &mut ScanReport) -> DateOutcome {
        match self.engine.invoke(date) {
            Ok(output) => {
                let issues = classify_output(date, &output.stdout, self.threshold);
                let flagged = issues.len();
                report.dates_tested += 1;
                report.issues.extend(issues);
                DateOutcome::Tested { flagged }
            }
            Err(failure) => {
                tracing::warn!(%date, "engine run failed: {failure}");
                let reason = SkipReason::Engine(failure);
                report.skipped.push(SkippedDate {
                    date,
                    reason: reason.clone(),
                });
                DateOutcome::Skipped(reason)
            }
        }
    }

    /// Scan every date in order, never stopping early.
    pub fn run(&mut self, dates: &[NaiveDate]) -> ScanReport {
        let mut report = self.empty_report(dates.len());
        tracing::info!(
            dates = dates.len(),
            threshold = self.threshold,
            "scanning for differences above threshold"
        );
        for (i, date) in dates.iter().enumerate() {
            let n = i + 1;
            if n % PROGRESS_EVERY == 0 {
                tracing::info!("[{n}/{}] processed {date}", dates.len());
            }
            self.scan_date(*date, &mut report);
        }
        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;
    use crate::domain::{DateRange, ReportDetail};
    use crate::engine::{EngineFailure, EngineOutput};

    pub(crate) fn config(threshold: f64, order: DateOrder) -> ScanConfig {
        ScanConfig {
            label: "test scan".to_string(),
            range: DateRange::default(),
            order,
            threshold,
            detail: ReportDetail::Brief,
            export_json: None,
        }
    }

    /// Engine returning canned output per date; unknown dates time out.
    #[derive(Default)]
    pub(crate) struct CannedEngine {
        pub(crate) outputs: HashMap<NaiveDate, Result<String, EngineFailure>>,
        pub(crate) calls: Vec<NaiveDate>,
    }

    impl CannedEngine {
        pub(crate) fn with(mut self, date: NaiveDate, stdout: &str) -> Self {
            self.outputs.insert(date, Ok(stdout.to_string()));
            self
        }

        pub(crate) fn failing(mut self, date: NaiveDate, failure: EngineFailure) -> Self {
            self.outputs.insert(date, Err(failure));
            self
        }
    }

    impl PricingEngineClient for CannedEngine {
        fn invoke(&mut self, date: NaiveDate) -> Result<EngineOutput, EngineFailure> {
            self.calls.push(date);
            match self.outputs.get(&date) {
                Some(Ok(stdout)) => Ok(EngineOutput {
                    stdout: stdout.clone(),
                    stderr: String::new(),
                    exit_code: 0,
                }),
                Some(Err(failure)) => Err(failure.clone()),
                None => Err(EngineFailure::Timeout(Duration::from_secs(30))),
            }
        }
    }

    pub(crate) fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, day).unwrap()
    }

    pub(crate) const ENGINE_OUTPUT: &str = "\
BGN EURIBOR3M/EURIBOR6M 10x10 computed=5.230000 bp | database=5.100000 bp | diff=0.130000 bp
BGN EURIBOR3M/EURIBOR6M 10x20 computed=4.000000 bp | database=4.000000 bp | diff=0.000000 bp
BGNS TIBOR3M/TIBOR6M 1x4 computed=3.000000 bp | database=1.500000 bp | diff=1.500000 bp
LCH EURIBOR3M/EURIBOR6M 10x10 computed=5.000000 bp | database=5.100000 bp | diff=-0.100000 bp
";

    #[test]
    fn timeout_on_one_date_does_not_stop_the_scan() {
        let mut engine = CannedEngine::default()
            .with(d(3), ENGINE_OUTPUT)
            .with(d(5), ENGINE_OUTPUT)
            .failing(
                d(6),
                EngineFailure::NonZeroExit {
                    code: Some(1),
                    stderr: "panic".into(),
                },
            );
        let dates = [d(3), d(4), d(5), d(6)];

        let report = RegressionScanner::new(&mut engine, &config(0.1, DateOrder::Asc)).run(&dates);

        assert_eq!(engine.calls, dates);
        assert_eq!(report.total_dates, 4);
        assert_eq!(report.dates_tested, 2);
        assert_eq!(report.dates_skipped(), 2);
        assert_eq!(report.dates_tested + report.dates_skipped(), dates.len());
        assert_eq!(report.skipped[0].date, d(4));
        assert!(matches!(report.skipped[0].reason, SkipReason::Engine(EngineFailure::Timeout(_))));

        // 0.13 and 1.5 are flagged per tested date; -0.1 sits on the boundary.
        assert_eq!(report.issues.len(), 4);
        let dates_seen: Vec<NaiveDate> = report.issues.iter().map(|i| i.date).collect();
        assert_eq!(dates_seen, vec![d(3), d(3), d(5), d(5)]);
    }

    #[test]
    fn scan_date_reports_outcome() {
        let mut engine = CannedEngine::default().with(d(3), ENGINE_OUTPUT);
        let mut scanner = RegressionScanner::new(&mut engine, &config(1.0, DateOrder::Asc));
        let mut report = scanner.empty_report(2);

        assert_eq!(scanner.scan_date(d(3), &mut report), DateOutcome::Tested { flagged: 1 });
        assert!(matches!(scanner.scan_date(d(4), &mut report), DateOutcome::Skipped(_)));
        assert_eq!(report.issues[0].source, "BGNS");
        assert_eq!(report.issues[0].computed, Some(3.0));
        assert_eq!(report.issues[0].reference, Some(1.5));
    }

    #[test]
    fn report_takes_threshold_label_and_order_from_config() {
        let mut engine = CannedEngine::default().with(d(3), ENGINE_OUTPUT);
        let report = RegressionScanner::new(&mut engine, &config(1.0, DateOrder::Desc)).run(&[d(3)]);
        assert_eq!(report.threshold, 1.0);
        assert_eq!(report.label, "test scan");
        assert_eq!(report.order, DateOrder::Desc);
        // Only the 1.5 bp line clears a 1.0 bp threshold.
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn every_date_failing_still_produces_a_report() {
        let mut engine = CannedEngine::default();
        let dates = [d(1), d(2), d(3)];
        let report = RegressionScanner::new(&mut engine, &config(0.1, DateOrder::Desc)).run(&dates);
        assert_eq!(report.dates_tested, 0);
        assert_eq!(report.dates_skipped(), 3);
        assert!(report.issues.is_empty());
    }
}
