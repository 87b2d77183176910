//! Pricing engine boundary.
//!
//! The basis-swap calculator is an external program: it takes a valuation date,
//! prices its configured swaps from the generated fixtures, and prints one line
//! per `(source, index pair, tenor)`. This module only launches it and captures
//! what it printed; parsing lives in `scan::parse`.

use std::process::Command;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::domain::EngineConfig;

pub mod process;

pub use process::{ProcessError, ProcessOutput, run_with_timeout};

/// Longest stderr excerpt kept on a failed invocation.
const STDERR_EXCERPT: usize = 200;

/// Captured output of a successful engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Why one date's engine run produced no usable output.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum EngineFailure {
    #[error("timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
    #[error("exited with status {}: {stderr}", fmt_code(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },
    #[error("could not run engine: {0}")]
    Launch(String),
}

/// Something that can price a valuation date and report its spreads as text.
pub trait PricingEngineClient {
    fn invoke(&mut self, date: NaiveDate) -> Result<EngineOutput, EngineFailure>;
}

/// Compact `YYYYMMDD` form the engine and the regeneration scripts expect.
pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Runs the real engine as a child process with a wall-clock timeout.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    config: EngineConfig,
}

impl ProcessEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn command(&self, date: NaiveDate) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args);
        if let Some(flag) = &self.config.date_flag {
            cmd.arg(flag);
        }
        cmd.arg(compact_date(date));
        if let Some(dir) = &self.config.workdir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl PricingEngineClient for ProcessEngine {
    fn invoke(&mut self, date: NaiveDate) -> Result<EngineOutput, EngineFailure> {
        let output = run_with_timeout(&mut self.command(date), self.config.timeout).map_err(EngineFailure::from)?;
        match output.exit_code {
            Some(0) => Ok(EngineOutput {
                stdout: output.stdout,
                stderr: output.stderr,
                exit_code: 0,
            }),
            code => Err(EngineFailure::NonZeroExit {
                code,
                stderr: excerpt(&output.stderr),
            }),
        }
    }
}

impl From<ProcessError> for EngineFailure {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Timeout { timeout, .. } => EngineFailure::Timeout(timeout),
            other => EngineFailure::Launch(other.to_string()),
        }
    }
}

fn fmt_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

/// First line-ish chunk of stderr, for log lines and the skipped-date list.
pub fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(STDERR_EXCERPT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
    }

    #[test]
    fn compact_date_is_yyyymmdd() {
        assert_eq!(compact_date(date()), "20250307");
    }

    #[test]
    fn excerpt_truncates_long_stderr() {
        let long = "x".repeat(500);
        let short = excerpt(&long);
        assert_eq!(short.len(), STDERR_EXCERPT + 3);
        assert_eq!(excerpt("  oops\n"), "oops");
    }

    #[test]
    fn timeout_maps_to_classified_failure() {
        let err = ProcessError::Timeout {
            program: "go".into(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(EngineFailure::from(err), EngineFailure::Timeout(Duration::from_secs(30)));
    }

    #[cfg(unix)]
    #[test]
    fn process_engine_passes_date_flag() {
        let mut engine = ProcessEngine::new(EngineConfig {
            program: "sh".into(),
            args: vec!["-c".into(), "printf '%s %s\\n' \"$0\" \"$1\"".into()],
            date_flag: Some("-date".into()),
            workdir: None,
            timeout: Duration::from_secs(10),
        });
        let out = engine.invoke(date()).unwrap();
        assert_eq!(out.stdout.trim(), "-date 20250307");
    }

    #[cfg(unix)]
    #[test]
    fn process_engine_classifies_failures() {
        let mut failing = ProcessEngine::new(EngineConfig {
            program: "sh".into(),
            args: vec!["-c".into(), "echo 'no fixtures' >&2; exit 2".into()],
            date_flag: None,
            workdir: None,
            timeout: Duration::from_secs(10),
        });
        assert_eq!(
            failing.invoke(date()).unwrap_err(),
            EngineFailure::NonZeroExit {
                code: Some(2),
                stderr: "no fixtures".into()
            }
        );

        let mut slow = ProcessEngine::new(EngineConfig {
            program: "sh".into(),
            args: vec!["-c".into(), "exec sleep 30".into()],
            date_flag: None,
            workdir: None,
            timeout: Duration::from_millis(200),
        });
        assert!(matches!(slow.invoke(date()).unwrap_err(), EngineFailure::Timeout(_)));
    }
}
