//! Historical backtest: regenerate fixtures for each date, then price it.
//!
//! Older valuation dates need their fixture files rebuilt before the engine
//! can run. A date whose regeneration fails is skipped without invoking the
//! engine; store connectivity failures abort the whole run.

use std::path::PathBuf;
use std::process::Command;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::app::pipeline::{emit_fixture, load_role_curves};
use crate::data::MarketStore;
use crate::domain::{FixtureJob, RegenCommandConfig};
use crate::engine::{compact_date, excerpt, run_with_timeout};
use crate::error::AppError;
use crate::report::{ScanReport, SkipReason, SkippedDate};
use crate::scan::scanner::{DateOutcome, RegressionScanner};

#[derive(Debug, Clone, Error)]
pub enum RegenError {
    /// This date cannot be priced; move on to the next one.
    #[error("{0}")]
    Failed(String),
    #[error(transparent)]
    Fatal(#[from] AppError),
}

/// Rebuilds the fixture files the engine reads for one valuation date.
pub trait FixtureRegenerator {
    fn regenerate(&mut self, date: NaiveDate) -> Result<(), RegenError>;
}

/// Runs `<program> <args...> YYYYMMDD` (e.g. `bash ./scripts/basis_swap.sh`).
#[derive(Debug, Clone)]
pub struct CommandRegenerator {
    config: RegenCommandConfig,
}

impl CommandRegenerator {
    pub fn new(config: RegenCommandConfig) -> Self {
        Self { config }
    }
}

impl FixtureRegenerator for CommandRegenerator {
    fn regenerate(&mut self, date: NaiveDate) -> Result<(), RegenError> {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args).arg(compact_date(date));
        if let Some(dir) = &self.config.workdir {
            cmd.current_dir(dir);
        }

        let output = run_with_timeout(&mut cmd, self.config.timeout)
            .map_err(|err| RegenError::Failed(err.to_string()))?;
        if output.success() {
            return Ok(());
        }
        let code = output
            .exit_code
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        Err(RegenError::Failed(format!(
            "{} exited with status {code}: {}",
            self.config.program,
            excerpt(&output.stderr)
        )))
    }
}

/// Regenerates fixtures in-process from the market-data store.
pub struct StoreRegenerator<'a> {
    store: &'a dyn MarketStore,
    jobs: Vec<FixtureJob>,
    output_dir: PathBuf,
    generated_at: Option<NaiveDateTime>,
}

impl<'a> StoreRegenerator<'a> {
    pub fn new(
        store: &'a dyn MarketStore,
        jobs: Vec<FixtureJob>,
        output_dir: impl Into<PathBuf>,
        generated_at: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            store,
            jobs,
            output_dir: output_dir.into(),
            generated_at,
        }
    }
}

impl FixtureRegenerator for StoreRegenerator<'_> {
    fn regenerate(&mut self, date: NaiveDate) -> Result<(), RegenError> {
        let mut missing = Vec::new();
        for job in &self.jobs {
            // Store errors are fatal; a failed write only costs this date.
            let curves = load_role_curves(self.store, date, job)?;
            let written = emit_fixture(job, date, &curves, &self.output_dir, self.generated_at)
                .map_err(|err| RegenError::Failed(err.message().to_string()))?;
            if written.is_none() {
                missing.push(format!("{} {}", job.source, job.currency));
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RegenError::Failed(format!("no curves for {}", missing.join(", "))))
        }
    }
}

/// Drives regeneration and the regression scanner date by date.
pub struct BacktestOrchestrator<'a> {
    regenerator: &'a mut dyn FixtureRegenerator,
    scanner: RegressionScanner<'a>,
}

impl<'a> BacktestOrchestrator<'a> {
    pub fn new(regenerator: &'a mut dyn FixtureRegenerator, scanner: RegressionScanner<'a>) -> Self {
        Self { regenerator, scanner }
    }

    pub fn run(&mut self, dates: &[NaiveDate]) -> Result<ScanReport, AppError> {
        let mut report = self.scanner.empty_report(dates.len());
        let total = dates.len();
        tracing::info!(dates = total, threshold = self.scanner.threshold(), "starting backtest");

        for (i, &date) in dates.iter().enumerate() {
            let n = i + 1;
            match self.regenerator.regenerate(date) {
                Ok(()) => {}
                Err(RegenError::Fatal(err)) => return Err(err),
                Err(RegenError::Failed(reason)) => {
                    tracing::warn!(%date, "[{n}/{total}] fixture regeneration failed: {reason}");
                    report.skipped.push(SkippedDate {
                        date,
                        reason: SkipReason::Regeneration(reason),
                    });
                    continue;
                }
            }

            match self.scanner.scan_date(date, &mut report) {
                DateOutcome::Tested { flagged: 0 } => {
                    tracing::info!("[{n}/{total}] {date}: ok");
                }
                DateOutcome::Tested { flagged } => {
                    tracing::info!("[{n}/{total}] {date}: {flagged} issue(s) above threshold");
                }
                DateOutcome::Skipped(_) => {}
            }
        }

        tracing::info!(
            tested = report.dates_tested,
            skipped = report.dates_skipped(),
            flagged = report.issues.len(),
            "backtest finished"
        );
        Ok(report)
    }
}
