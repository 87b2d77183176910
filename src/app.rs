//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - connects to the market-data store
//! - generates fixtures, or runs a scan / backtest over valuation dates
//! - prints the report and writes optional exports

use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{BacktestArgs, Command, EngineArgs, FixturesArgs, ScanArgs};
use crate::data::{MarketStore, PgMarketStore, StoreConfig};
use crate::domain::{DateRange, EngineConfig, FixtureJob, RegenCommandConfig, ScanConfig};
use crate::engine::ProcessEngine;
use crate::error::AppError;
use crate::report::ScanReport;
use crate::scan::{BacktestOrchestrator, CommandRegenerator, FixtureRegenerator, RegressionScanner, StoreRegenerator};

pub mod pipeline;

/// Entry point for the `basis-audit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Fixtures(args) => handle_fixtures(args),
        Command::Scan(args) => handle_scan(args),
        Command::Backtest(args) => handle_backtest(args),
    }
}

/// Logs go to stderr so stdout carries only the report.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn connect_store() -> Result<PgMarketStore, AppError> {
    PgMarketStore::connect(StoreConfig::from_env()?)
}

fn handle_fixtures(args: FixturesArgs) -> Result<(), AppError> {
    let store = connect_store()?;
    let jobs = if args.all {
        pipeline::discover_jobs(&store, args.date)?
    } else {
        vec![fixture_job_from_args(&args)?]
    };
    if jobs.is_empty() {
        return Err(AppError::new(3, format!("No curves stored for {}.", args.date)));
    }

    let generated_at = args.stamp.then(|| Local::now().naive_local());
    let mut written = 0usize;
    for job in &jobs {
        if let Some(path) = pipeline::generate_fixtures(&store, args.date, job, &args.output_dir, generated_at)? {
            println!("Generated {}", path.display());
            written += 1;
        }
    }

    if written == 0 {
        return Err(AppError::new(3, format!("No curve data found for {}.", args.date)));
    }
    Ok(())
}

fn handle_scan(args: ScanArgs) -> Result<(), AppError> {
    let config = scan_config_from_args(&args);
    let mut engine = ProcessEngine::new(engine_config_from_args(&args.engine)?);

    let store = connect_store()?;
    let dates = load_dates(&store, &config)?;

    let report = RegressionScanner::new(&mut engine, &config).run(&dates);
    finish(&report, &config)
}

fn handle_backtest(args: BacktestArgs) -> Result<(), AppError> {
    let config = backtest_config_from_args(&args);
    let mut engine = ProcessEngine::new(engine_config_from_args(&args.engine)?);

    let store = connect_store()?;
    let dates = load_dates(&store, &config)?;

    let mut command_regen;
    let mut store_regen;
    let regenerator: &mut dyn FixtureRegenerator = match &args.regen_cmd {
        Some(raw) => {
            command_regen = CommandRegenerator::new(regen_config_from_args(raw, &args)?);
            &mut command_regen
        }
        None => {
            store_regen = StoreRegenerator::new(&store, pipeline::default_backtest_jobs(), &args.output_dir, None);
            &mut store_regen
        }
    };

    let scanner = RegressionScanner::new(&mut engine, &config);
    let report = BacktestOrchestrator::new(regenerator, scanner).run(&dates)?;
    finish(&report, &config)
}

fn load_dates(store: &dyn MarketStore, config: &ScanConfig) -> Result<Vec<NaiveDate>, AppError> {
    let dates = store.valuation_dates(&config.range, config.order)?;
    if dates.is_empty() {
        return Err(AppError::new(
            3,
            format!("No valuation dates found for {}.", describe_range(&config.range)),
        ));
    }
    tracing::info!(count = dates.len(), "loaded valuation dates");
    Ok(dates)
}

fn finish(report: &ScanReport, config: &ScanConfig) -> Result<(), AppError> {
    println!("{}", crate::report::format_scan_report(report, config.detail));
    if let Some(path) = &config.export_json {
        crate::io::export::write_report_json(path, report)?;
        tracing::info!(path = %path.display(), "wrote JSON report");
    }
    Ok(())
}

pub fn fixture_job_from_args(args: &FixturesArgs) -> Result<FixtureJob, AppError> {
    let source = args
        .source
        .clone()
        .ok_or_else(|| AppError::new(2, "--source is required unless --all is given."))?;
    let mut job = FixtureJob::new(source, args.currency);
    job.ois_source = args.ois_source.clone();
    job.ibor_source = args.ibor_source.clone();
    Ok(job)
}

pub fn scan_config_from_args(args: &ScanArgs) -> ScanConfig {
    let range = DateRange {
        from: Some(args.from),
        to: Some(args.to),
    };
    ScanConfig {
        label: args
            .label
            .clone()
            .unwrap_or_else(|| format!("valuation dates {}", describe_range(&range))),
        range,
        order: args.order,
        threshold: args.threshold,
        detail: args.detail,
        export_json: args.export_json.clone(),
    }
}

pub fn backtest_config_from_args(args: &BacktestArgs) -> ScanConfig {
    let range = DateRange {
        from: args.since,
        to: Some(args.before),
    };
    ScanConfig {
        label: args
            .label
            .clone()
            .unwrap_or_else(|| format!("backtest of valuation dates {}", describe_range(&range))),
        range,
        order: args.order,
        threshold: args.threshold,
        detail: args.detail,
        export_json: args.export_json.clone(),
    }
}

pub fn engine_config_from_args(args: &EngineArgs) -> Result<EngineConfig, AppError> {
    let (program, rest) = split_command(&args.engine_cmd, "--engine-cmd")?;
    let date_flag = Some(args.date_flag.trim())
        .filter(|flag| !flag.is_empty())
        .map(str::to_string);
    Ok(EngineConfig {
        program,
        args: rest,
        date_flag,
        workdir: args.engine_dir.clone(),
        timeout: Duration::from_secs(args.engine_timeout_secs),
    })
}

fn regen_config_from_args(raw: &str, args: &BacktestArgs) -> Result<RegenCommandConfig, AppError> {
    let (program, rest) = split_command(raw, "--regen-cmd")?;
    Ok(RegenCommandConfig {
        program,
        args: rest,
        workdir: args.engine.engine_dir.clone(),
        timeout: Duration::from_secs(args.regen_timeout_secs),
    })
}

/// Split a command line on whitespace into program and arguments.
fn split_command(raw: &str, flag: &str) -> Result<(String, Vec<String>), AppError> {
    let mut parts = raw.split_whitespace().map(str::to_string);
    let program = parts
        .next()
        .ok_or_else(|| AppError::new(2, format!("{flag} must not be empty.")))?;
    Ok((program, parts.collect()))
}

fn describe_range(range: &DateRange) -> String {
    match (range.from, range.to) {
        (Some(from), Some(to)) => format!("[{from}, {to})"),
        (Some(from), None) => format!("from {from}"),
        (None, Some(to)) => format!("before {to}"),
        (None, None) => "(all dates)".to_string(),
    }
}
