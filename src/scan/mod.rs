//! Regression scanning against the external pricing engine.
//!
//! - report-line parsing and threshold classification (`parse`)
//! - date-by-date engine driver (`scanner`)
//! - fixture regeneration before each historical date (`backtest`)

pub mod backtest;
pub mod parse;
pub mod scanner;

pub use backtest::{BacktestOrchestrator, CommandRegenerator, FixtureRegenerator, RegenError, StoreRegenerator};
pub use parse::{ReportLine, classify_line, classify_output, parse_report_line};
pub use scanner::{DateOutcome, RegressionScanner};
