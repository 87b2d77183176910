//! Market-data store access.
//!
//! - `MarketStore`: the read-only queries the pipeline and the scanners need
//! - `PgMarketStore`: Postgres implementation (`store`)
//! - `MemoryStore`: in-memory implementation used by the tests (`memory`)

use chrono::NaiveDate;
use serde_json::Value;

use crate::domain::{DateOrder, DateRange};
use crate::error::AppError;

#[cfg(test)]
pub mod memory;
pub mod store;

#[cfg(test)]
pub use memory::MemoryStore;
pub use store::{PgMarketStore, StoreConfig};

/// Read access to stored curves and priced valuation dates.
///
/// Every error is a store failure (connectivity, query, timeout). Absent data
/// is `Ok(None)` or an empty list, never an error.
pub trait MarketStore {
    /// Raw `quotes` payload for one curve.
    fn curve_payload(&self, date: NaiveDate, source: &str, reference_index: &str)
    -> Result<Option<Value>, AppError>;

    /// Every `(source, reference_index)` stored for `date`, sorted.
    fn available_curves(&self, date: NaiveDate) -> Result<Vec<(String, String)>, AppError>;

    /// Distinct valuation dates with stored basis-swap prices inside `range`.
    fn valuation_dates(&self, range: &DateRange, order: DateOrder) -> Result<Vec<NaiveDate>, AppError>;
}
