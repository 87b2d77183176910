//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - passed between the fixture pipeline and the regression scanner
//! - exported to JSON alongside the operator report
//! - built by hand in tests without a store or an engine

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Canonical `tenor -> rate` mapping for one curve.
///
/// Tenors are unique. Insertion order is retained so that calendar sorting can
/// break ties by encounter order; equality ignores order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteMap {
    entries: Vec<(String, f64)>,
}

impl QuoteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a quote. A repeated tenor overwrites the earlier rate in place.
    pub fn insert(&mut self, tenor: impl Into<String>, rate: f64) {
        let tenor = tenor.into();
        match self.entries.iter_mut().find(|(t, _)| *t == tenor) {
            Some(slot) => slot.1 = rate,
            None => self.entries.push((tenor, rate)),
        }
    }

    pub fn remove(&mut self, tenor: &str) {
        self.entries.retain(|(t, _)| t != tenor);
    }

    pub fn get(&self, tenor: &str) -> Option<f64> {
        self.entries.iter().find(|(t, _)| t == tenor).map(|(_, r)| *r)
    }

    pub fn contains(&self, tenor: &str) -> bool {
        self.get(tenor).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Quotes in encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(t, r)| (t.as_str(), *r))
    }

    pub fn tenors(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, f64) -> bool) {
        self.entries.retain(|(t, r)| keep(t, *r));
    }
}

impl PartialEq for QuoteMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(tenor, rate)| other.get(tenor).is_some_and(|r| r.to_bits() == rate.to_bits()))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for QuoteMap {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut map = QuoteMap::new();
        for (tenor, rate) in iter {
            map.insert(tenor, rate);
        }
        map
    }
}

/// One point of a filtered, calendar-sorted curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub tenor: String,
    pub rate: f64,
}

/// Normalized quotes for one `(date, source, reference index)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveQuoteSet {
    pub source: String,
    pub reference_index: String,
    pub curve_date: NaiveDate,
    pub quotes: QuoteMap,
}

/// Role a curve plays in a basis-swap fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveRole {
    /// Overnight-index curve used for discounting.
    Ois,
    /// 3-month term index (EURIBOR3M, TIBOR3M, ...).
    Term3M,
    /// 6-month term index.
    Term6M,
}

impl CurveRole {
    pub const ALL: [CurveRole; 3] = [CurveRole::Ois, CurveRole::Term3M, CurveRole::Term6M];
}

/// Store and naming details for one curve role of a currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    /// Reference index name in the market-data store.
    pub db_name: &'static str,
    /// Stem appended to the source prefix to form a fixture variable name.
    pub var_stem: &'static str,
}

/// Currency families with a fixed fixture layout (one OIS + two term curves).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
#[value(rename_all = "UPPER")]
pub enum CurrencyFamily {
    Eur,
    Jpy,
    Usd,
    Gbp,
}

impl CurrencyFamily {
    pub const ALL: [CurrencyFamily; 4] = [
        CurrencyFamily::Eur,
        CurrencyFamily::Jpy,
        CurrencyFamily::Usd,
        CurrencyFamily::Gbp,
    ];

    pub fn code(self) -> &'static str {
        match self {
            CurrencyFamily::Eur => "EUR",
            CurrencyFamily::Jpy => "JPY",
            CurrencyFamily::Usd => "USD",
            CurrencyFamily::Gbp => "GBP",
        }
    }

    pub fn index(self, role: CurveRole) -> IndexSpec {
        let (db_name, var_stem) = match (self, role) {
            (CurrencyFamily::Eur, CurveRole::Ois) => ("ESTR", "Estr"),
            (CurrencyFamily::Eur, CurveRole::Term3M) => ("EURIBOR3M", "Euribor3M"),
            (CurrencyFamily::Eur, CurveRole::Term6M) => ("EURIBOR6M", "Euribor6M"),
            (CurrencyFamily::Jpy, CurveRole::Ois) => ("TONAR", "Tonar"),
            (CurrencyFamily::Jpy, CurveRole::Term3M) => ("TIBOR3M", "Tibor3M"),
            (CurrencyFamily::Jpy, CurveRole::Term6M) => ("TIBOR6M", "Tibor6M"),
            (CurrencyFamily::Usd, CurveRole::Ois) => ("SOFR", "Sofr"),
            (CurrencyFamily::Usd, CurveRole::Term3M) => ("USD_LIBOR_3M", "UsdLibor3M"),
            (CurrencyFamily::Usd, CurveRole::Term6M) => ("USD_LIBOR_6M", "UsdLibor6M"),
            (CurrencyFamily::Gbp, CurveRole::Ois) => ("SONIA", "Sonia"),
            (CurrencyFamily::Gbp, CurveRole::Term3M) => ("GBP_LIBOR_3M", "GbpLibor3M"),
            (CurrencyFamily::Gbp, CurveRole::Term6M) => ("GBP_LIBOR_6M", "GbpLibor6M"),
        };
        IndexSpec { db_name, var_stem }
    }

    /// Fixture file-name suffix shared by every source of this family.
    pub fn file_suffix(self) -> &'static str {
        match self {
            CurrencyFamily::Eur => "euribor",
            CurrencyFamily::Jpy => "tibor",
            CurrencyFamily::Usd => "usd_libor",
            CurrencyFamily::Gbp => "gbp_libor",
        }
    }

    /// Find the family (and role) a store index name belongs to.
    pub fn for_index(db_name: &str) -> Option<(CurrencyFamily, CurveRole)> {
        Self::ALL.into_iter().find_map(|family| {
            CurveRole::ALL
                .into_iter()
                .find(|role| family.index(*role).db_name == db_name)
                .map(|role| (family, role))
        })
    }
}

impl std::fmt::Display for CurrencyFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One fixture file to regenerate: a source/currency pair, optionally pulling the
/// OIS and term curves from different store sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureJob {
    pub source: String,
    pub currency: CurrencyFamily,
    pub ois_source: Option<String>,
    pub ibor_source: Option<String>,
}

impl FixtureJob {
    pub fn new(source: impl Into<String>, currency: CurrencyFamily) -> Self {
        Self {
            source: source.into(),
            currency,
            ois_source: None,
            ibor_source: None,
        }
    }

    pub fn with_sources(mut self, ois_source: impl Into<String>, ibor_source: impl Into<String>) -> Self {
        self.ois_source = Some(ois_source.into());
        self.ibor_source = Some(ibor_source.into());
        self
    }

    pub fn ois_source(&self) -> &str {
        self.ois_source.as_deref().unwrap_or(&self.source)
    }

    pub fn ibor_source(&self) -> &str {
        self.ibor_source.as_deref().unwrap_or(&self.source)
    }

    /// Store source for the curve in `role`.
    pub fn source_for(&self, role: CurveRole) -> &str {
        match role {
            CurveRole::Ois => self.ois_source(),
            CurveRole::Term3M | CurveRole::Term6M => self.ibor_source(),
        }
    }

    /// Prefix for variable names and the file name.
    ///
    /// Mixed-source jobs (e.g. TONAR from BGN, TIBOR from BGNS) are named after
    /// the OIS source, since discounting always follows it.
    pub fn var_prefix(&self) -> &str {
        if self.ois_source() != self.ibor_source() {
            self.ois_source()
        } else {
            &self.source
        }
    }
}

/// Half-open valuation-date range `[from, to)`; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date < to)
    }
}

/// Order in which valuation dates are scanned (and later grouped in the report).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DateOrder {
    #[default]
    Asc,
    Desc,
}

/// How much of each flagged line the operator report shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportDetail {
    /// One row per issue plus the raw engine line.
    #[default]
    Brief,
    /// Computed / database / diff columns.
    Extended,
}

/// A flagged deviation between the engine's computed spread and the stored one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffIssue {
    pub date: NaiveDate,
    pub source: String,
    pub index_pair: String,
    pub tenor: String,
    pub computed: Option<f64>,
    pub reference: Option<f64>,
    pub diff: f64,
    pub raw_line: String,
}

/// How to launch the external pricing engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Flag placed before the `YYYYMMDD` date argument (`-date` for the basis calculator).
    pub date_flag: Option<String>,
    pub workdir: Option<PathBuf>,
    pub timeout: Duration,
}

/// How to launch an external fixture regeneration command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegenCommandConfig {
    pub program: String,
    pub args: Vec<String>,
    pub workdir: Option<PathBuf>,
    pub timeout: Duration,
}

/// Settings for one scan or backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Short title printed in the report header.
    pub label: String,
    pub range: DateRange,
    pub order: DateOrder,
    /// Flag an issue when `|diff| > threshold` (bp).
    pub threshold: f64,
    pub detail: ReportDetail,
    pub export_json: Option<PathBuf>,
}
