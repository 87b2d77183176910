//! Fixture generation pipeline shared by the `fixtures` command and the
//! in-process backtest regenerator.
//!
//! store lookup -> payload normalization -> tenor whitelist + calendar sort -> Go fixture file

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

use crate::data::MarketStore;
use crate::domain::{CurrencyFamily, CurveQuoteSet, CurveRole, FixtureJob};
use crate::error::AppError;
use crate::io::{RoleCurves, build_artifact, filter_and_sort, write_artifact};

/// Generate the fixture file for one job and curve date.
///
/// Returns the written path, or `None` when the store has no usable curve for
/// any of the job's three roles (nothing is written in that case).
pub fn generate_fixtures(
    store: &dyn MarketStore,
    date: NaiveDate,
    job: &FixtureJob,
    output_dir: &Path,
    generated_at: Option<NaiveDateTime>,
) -> Result<Option<PathBuf>, AppError> {
    let curves = load_role_curves(store, date, job)?;
    emit_fixture(job, date, &curves, output_dir, generated_at)
}

/// Fetch, normalize and filter/sort the job's three curves.
///
/// Errors here are store failures only; missing curves are logged and left empty.
pub fn load_role_curves(store: &dyn MarketStore, date: NaiveDate, job: &FixtureJob) -> Result<RoleCurves, AppError> {
    let mut curves = RoleCurves::default();

    for role in CurveRole::ALL {
        let index = job.currency.index(role).db_name;
        let source = job.source_for(role);
        let payload = store.curve_payload(date, source, index)?;
        let set = CurveQuoteSet::from_payload(date, source, index, payload.as_ref());
        if set.quotes.is_empty() {
            tracing::warn!(%date, source, index, "no quotes found");
            continue;
        }

        let points = filter_and_sort(&set.quotes, index);
        tracing::debug!(
            source,
            index,
            stored = set.quotes.len(),
            kept = points.len(),
            "normalized curve"
        );
        curves.set(role, points);
    }

    Ok(curves)
}

/// Write the fixture for already-loaded curves. `None` when every curve is empty.
///
/// Errors here are filesystem failures only.
pub fn emit_fixture(
    job: &FixtureJob,
    date: NaiveDate,
    curves: &RoleCurves,
    output_dir: &Path,
    generated_at: Option<NaiveDateTime>,
) -> Result<Option<PathBuf>, AppError> {
    if curves.is_empty() {
        tracing::warn!(%date, source = %job.source, currency = %job.currency, "no data found, skipping fixture");
        return Ok(None);
    }

    let artifact = build_artifact(job, date, curves);
    let path = write_artifact(output_dir, &artifact, generated_at)?;
    tracing::info!(path = %path.display(), blocks = artifact.blocks.len(), "wrote fixture");
    Ok(Some(path))
}

/// Jobs for every `(source, currency family)` with at least one recognized
/// curve stored on `date`, in store order.
pub fn discover_jobs(store: &dyn MarketStore, date: NaiveDate) -> Result<Vec<FixtureJob>, AppError> {
    let mut jobs: Vec<FixtureJob> = Vec::new();
    for (source, index) in store.available_curves(date)? {
        let Some((currency, _)) = CurrencyFamily::for_index(&index) else {
            tracing::debug!(%source, %index, "index not used by any fixture");
            continue;
        };
        if !jobs.iter().any(|j| j.source == source && j.currency == currency) {
            jobs.push(FixtureJob::new(source, currency));
        }
    }
    Ok(jobs)
}

/// Fixture set read by the basis calculator: BGN and LCH EUR curves, plus JPY
/// with TONAR from BGN and TIBOR from BGNS.
pub fn default_backtest_jobs() -> Vec<FixtureJob> {
    vec![
        FixtureJob::new("BGN", CurrencyFamily::Eur),
        FixtureJob::new("LCH", CurrencyFamily::Eur),
        FixtureJob::new("BGN", CurrencyFamily::Jpy).with_sources("BGN", "BGNS"),
    ]
}
