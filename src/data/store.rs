//! Postgres market-data store.
//!
//! sqlx is async; the rest of the crate is not. `PgMarketStore` owns a
//! current-thread tokio runtime and a single-connection pool, and every public
//! method blocks on one query with a deadline.

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tokio::runtime::Runtime;

use crate::data::MarketStore;
use crate::domain::{DateOrder, DateRange};
use crate::error::AppError;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5432;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

const CURVE_SQL: &str =
    "SELECT quotes FROM marketdata.curves WHERE date = $1 AND source = $2 AND reference_index = $3";

const AVAILABLE_SQL: &str = "SELECT DISTINCT source, reference_index FROM marketdata.curves \
     WHERE date = $1 ORDER BY source, reference_index";

const DATES_ASC_SQL: &str = "SELECT DISTINCT valuation_date FROM pricing.basis_swap \
     WHERE ($1::date IS NULL OR valuation_date >= $1) AND ($2::date IS NULL OR valuation_date < $2) \
     ORDER BY valuation_date ASC";

const DATES_DESC_SQL: &str = "SELECT DISTINCT valuation_date FROM pricing.basis_swap \
     WHERE ($1::date IS NULL OR valuation_date >= $1) AND ($2::date IS NULL OR valuation_date < $2) \
     ORDER BY valuation_date DESC";

/// Connection settings, read from `MARKETDATA_*` environment variables.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub connect_timeout: Duration,
    pub query_timeout: Duration,
}

impl StoreConfig {
    /// Load from the process environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::new(2, format!("Missing {key} in environment (.env).")))
        };
        let parsed = |key: &str, default: u64| -> Result<u64, AppError> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| AppError::new(2, format!("Invalid {key}: '{raw}'."))),
                None => Ok(default),
            }
        };

        let port = parsed("MARKETDATA_PORT", u64::from(DEFAULT_PORT))?;
        let port = u16::try_from(port).map_err(|_| AppError::new(2, format!("Invalid MARKETDATA_PORT: {port}.")))?;

        Ok(Self {
            host: lookup("MARKETDATA_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            user: required("MARKETDATA_USER")?,
            password: lookup("MARKETDATA_PASSWORD"),
            database: required("MARKETDATA_DB")?,
            connect_timeout: Duration::from_secs(parsed(
                "MARKETDATA_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?),
            query_timeout: Duration::from_secs(parsed("MARKETDATA_QUERY_TIMEOUT_SECS", DEFAULT_QUERY_TIMEOUT_SECS)?),
        })
    }

    fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database);
        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("connect_timeout", &self.connect_timeout)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

pub struct PgMarketStore {
    runtime: Runtime,
    pool: PgPool,
    query_timeout: Duration,
}

impl PgMarketStore {
    pub fn connect(config: StoreConfig) -> Result<Self, AppError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to start store runtime: {e}")))?;

        tracing::debug!(host = %config.host, port = config.port, database = %config.database, "connecting to market-data store");
        let pool = runtime
            .block_on(
                PgPoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(config.connect_timeout)
                    .connect_with(config.connect_options()),
            )
            .map_err(|e| {
                AppError::new(
                    4,
                    format!(
                        "Failed to connect to market-data store at {}:{}/{}: {e}",
                        config.host, config.port, config.database
                    ),
                )
            })?;

        Ok(Self {
            runtime,
            pool,
            query_timeout: config.query_timeout,
        })
    }

    fn block_on<T>(&self, what: &str, fut: impl Future<Output = Result<T, sqlx::Error>>) -> Result<T, AppError> {
        match self.runtime.block_on(tokio::time::timeout(self.query_timeout, fut)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AppError::new(4, format!("Store query failed ({what}): {e}"))),
            Err(_) => Err(AppError::new(
                4,
                format!("Store query timed out after {}s ({what})", self.query_timeout.as_secs()),
            )),
        }
    }
}

impl MarketStore for PgMarketStore {
    fn curve_payload(
        &self,
        date: NaiveDate,
        source: &str,
        reference_index: &str,
    ) -> Result<Option<Value>, AppError> {
        let row = self.block_on(
            "curve",
            sqlx::query_scalar::<_, Option<Value>>(CURVE_SQL)
                .bind(date)
                .bind(source)
                .bind(reference_index)
                .fetch_optional(&self.pool),
        )?;
        Ok(row.flatten())
    }

    fn available_curves(&self, date: NaiveDate) -> Result<Vec<(String, String)>, AppError> {
        self.block_on(
            "available curves",
            sqlx::query_as::<_, (String, String)>(AVAILABLE_SQL)
                .bind(date)
                .fetch_all(&self.pool),
        )
    }

    fn valuation_dates(&self, range: &DateRange, order: DateOrder) -> Result<Vec<NaiveDate>, AppError> {
        let sql = match order {
            DateOrder::Asc => DATES_ASC_SQL,
            DateOrder::Desc => DATES_DESC_SQL,
        };
        self.block_on(
            "valuation dates",
            sqlx::query_scalar::<_, NaiveDate>(sql)
                .bind(range.from)
                .bind(range.to)
                .fetch_all(&self.pool),
        )
    }
}
