//! Command-line parsing for the basis-swap fixture and regression tool.
//!
//! Parsing stays here; turning arguments into run configuration happens in
//! `app`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{CurrencyFamily, DateOrder, ReportDetail};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "basis-audit",
    version,
    about = "Basis-swap curve fixtures and pricing regression scans"
)]
pub struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write Go fixture files from stored curves for one curve date.
    Fixtures(FixturesArgs),
    /// Run the pricing engine over stored valuation dates and report large differences.
    Scan(ScanArgs),
    /// Regenerate fixtures for each historical date, then scan it.
    Backtest(BacktestArgs),
}

#[derive(Debug, Args, Clone)]
pub struct FixturesArgs {
    /// Curve date (YYYYMMDD or YYYY-MM-DD).
    #[arg(short, long, value_parser = parse_date)]
    pub date: NaiveDate,

    /// Store source (BGN, LCH, BGNS, ...).
    #[arg(short, long, required_unless_present = "all", conflicts_with = "all")]
    pub source: Option<String>,

    /// Currency family of the fixture.
    #[arg(short, long, value_enum, default_value_t = CurrencyFamily::Eur)]
    pub currency: CurrencyFamily,

    /// Generate one fixture per source and currency family stored for the date.
    #[arg(long)]
    pub all: bool,

    /// Read the OIS curve from this source instead of `--source`.
    #[arg(long, conflicts_with = "all")]
    pub ois_source: Option<String>,

    /// Read the term curves from this source instead of `--source`.
    #[arg(long, conflicts_with = "all")]
    pub ibor_source: Option<String>,

    /// Directory the fixture files are written to.
    #[arg(short, long, default_value = "swap/basis/data")]
    pub output_dir: PathBuf,

    /// Add a generation timestamp comment (output is no longer reproducible).
    #[arg(long)]
    pub stamp: bool,
}

/// How to launch the pricing engine.
#[derive(Debug, Args, Clone)]
pub struct EngineArgs {
    /// Engine command line; the date flag and YYYYMMDD date are appended.
    #[arg(long, default_value = "go run ./cmd/basiscalc")]
    pub engine_cmd: String,

    /// Flag placed before the date argument; empty for a positional date.
    #[arg(long, default_value = "-date", allow_hyphen_values = true)]
    pub date_flag: String,

    /// Working directory for the engine.
    #[arg(long)]
    pub engine_dir: Option<PathBuf>,

    /// Per-date engine timeout.
    #[arg(long, default_value_t = 30)]
    pub engine_timeout_secs: u64,
}

#[derive(Debug, Args, Clone)]
pub struct ScanArgs {
    /// First valuation date, inclusive.
    #[arg(long, value_parser = parse_date, default_value = "2025-01-01")]
    pub from: NaiveDate,

    /// End of the valuation-date range, exclusive.
    #[arg(long, value_parser = parse_date, default_value = "2026-01-01")]
    pub to: NaiveDate,

    /// Flag lines where |diff| exceeds this many basis points.
    #[arg(short, long, default_value_t = 0.1)]
    pub threshold: f64,

    #[arg(long, value_enum, default_value_t = DateOrder::Asc)]
    pub order: DateOrder,

    #[arg(long, value_enum, default_value_t = ReportDetail::Brief)]
    pub detail: ReportDetail,

    /// Report title.
    #[arg(long)]
    pub label: Option<String>,

    /// Also write the report as JSON.
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Debug, Args, Clone)]
pub struct BacktestArgs {
    /// Scan valuation dates strictly before this date.
    #[arg(long, value_parser = parse_date, default_value = "2025-01-01")]
    pub before: NaiveDate,

    /// Oldest valuation date to include.
    #[arg(long, value_parser = parse_date)]
    pub since: Option<NaiveDate>,

    #[arg(short, long, default_value_t = 1.0)]
    pub threshold: f64,

    #[arg(long, value_enum, default_value_t = DateOrder::Desc)]
    pub order: DateOrder,

    #[arg(long, value_enum, default_value_t = ReportDetail::Extended)]
    pub detail: ReportDetail,

    #[arg(long)]
    pub label: Option<String>,

    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// External regeneration command (e.g. "bash ./scripts/basis_swap.sh");
    /// the YYYYMMDD date is appended. Without it fixtures are regenerated from
    /// the store directly.
    #[arg(long)]
    pub regen_cmd: Option<String>,

    #[arg(long, default_value_t = 120)]
    pub regen_timeout_secs: u64,

    /// Fixture directory for in-process regeneration.
    #[arg(short, long, default_value = "swap/basis/data")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Accept `YYYYMMDD` or `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .map_err(|_| format!("invalid date '{raw}' (expected YYYYMMDD or YYYY-MM-DD)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_accept_both_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 11, 25).unwrap();
        assert_eq!(parse_date("20251125").unwrap(), expected);
        assert_eq!(parse_date("2025-11-25").unwrap(), expected);
        assert!(parse_date("25/11/2025").is_err());
        assert!(parse_date("20251325").is_err());
    }

    #[test]
    fn fixtures_requires_source_or_all() {
        assert!(Cli::try_parse_from(["basis-audit", "fixtures", "-d", "20251125"]).is_err());
        assert!(Cli::try_parse_from(["basis-audit", "fixtures", "-d", "20251125", "--all", "-s", "BGN"]).is_err());

        let cli = Cli::try_parse_from(["basis-audit", "fixtures", "-d", "20251125", "-s", "BGN", "-c", "JPY"]).unwrap();
        let Command::Fixtures(args) = cli.command else {
            panic!("expected fixtures");
        };
        assert_eq!(args.source.as_deref(), Some("BGN"));
        assert_eq!(args.currency, CurrencyFamily::Jpy);
        assert_eq!(args.output_dir, PathBuf::from("swap/basis/data"));
        assert!(!args.stamp);
    }

    #[test]
    fn scan_and_backtest_defaults() {
        let cli = Cli::try_parse_from(["basis-audit", "scan"]).unwrap();
        let Command::Scan(scan) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(scan.threshold, 0.1);
        assert_eq!(scan.order, DateOrder::Asc);
        assert_eq!(scan.engine.date_flag, "-date");
        assert_eq!(scan.engine.engine_timeout_secs, 30);

        let cli = Cli::try_parse_from(["basis-audit", "-v", "backtest", "--before", "20240101"]).unwrap();
        assert!(cli.verbose);
        let Command::Backtest(bt) = cli.command else {
            panic!("expected backtest");
        };
        assert_eq!(bt.before, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(bt.threshold, 1.0);
        assert_eq!(bt.order, DateOrder::Desc);
        assert_eq!(bt.detail, ReportDetail::Extended);
        assert_eq!(bt.regen_timeout_secs, 120);
        assert!(bt.regen_cmd.is_none());
    }
}
