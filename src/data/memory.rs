//! In-memory market store for tests.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde_json::Value;

use crate::data::MarketStore;
use crate::domain::{DateOrder, DateRange};
use crate::error::AppError;

type CurveKey = (NaiveDate, String, String);

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    curves: BTreeMap<CurveKey, Value>,
    valuation_dates: BTreeSet<NaiveDate>,
}

impl MemoryStore {
    pub fn insert_curve(&mut self, date: NaiveDate, source: &str, reference_index: &str, quotes: Value) {
        self.curves
            .insert((date, source.to_string(), reference_index.to_string()), quotes);
    }

    pub fn insert_valuation_date(&mut self, date: NaiveDate) {
        self.valuation_dates.insert(date);
    }
}

impl MarketStore for MemoryStore {
    fn curve_payload(
        &self,
        date: NaiveDate,
        source: &str,
        reference_index: &str,
    ) -> Result<Option<Value>, AppError> {
        Ok(self
            .curves
            .get(&(date, source.to_string(), reference_index.to_string()))
            .cloned())
    }

    fn available_curves(&self, date: NaiveDate) -> Result<Vec<(String, String)>, AppError> {
        Ok(self
            .curves
            .keys()
            .filter(|(d, _, _)| *d == date)
            .map(|(_, source, index)| (source.clone(), index.clone()))
            .collect())
    }

    fn valuation_dates(&self, range: &DateRange, order: DateOrder) -> Result<Vec<NaiveDate>, AppError> {
        let dates = self.valuation_dates.iter().copied().filter(|d| range.contains(*d));
        Ok(match order {
            DateOrder::Asc => dates.collect(),
            DateOrder::Desc => dates.rev().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn valuation_dates_respect_range_and_order() {
        let mut store = MemoryStore::default();
        for date in [d(2024, 12, 30), d(2024, 12, 31), d(2025, 1, 2), d(2025, 1, 3)] {
            store.insert_valuation_date(date);
        }

        let before_2025 = DateRange {
            from: None,
            to: Some(d(2025, 1, 1)),
        };
        assert_eq!(
            store.valuation_dates(&before_2025, DateOrder::Desc).unwrap(),
            vec![d(2024, 12, 31), d(2024, 12, 30)]
        );

        let year_2025 = DateRange {
            from: Some(d(2025, 1, 1)),
            to: Some(d(2026, 1, 1)),
        };
        assert_eq!(
            store.valuation_dates(&year_2025, DateOrder::Asc).unwrap(),
            vec![d(2025, 1, 2), d(2025, 1, 3)]
        );
    }

    #[test]
    fn available_curves_are_sorted_per_date() {
        let mut store = MemoryStore::default();
        store.insert_curve(d(2025, 1, 2), "LCH", "ESTR", json!([]));
        store.insert_curve(d(2025, 1, 2), "BGN", "EURIBOR3M", json!([]));
        store.insert_curve(d(2025, 1, 2), "BGN", "ESTR", json!([]));
        store.insert_curve(d(2025, 1, 3), "BGN", "TONAR", json!([]));

        let curves = store.available_curves(d(2025, 1, 2)).unwrap();
        assert_eq!(
            curves,
            vec![
                ("BGN".to_string(), "ESTR".to_string()),
                ("BGN".to_string(), "EURIBOR3M".to_string()),
                ("LCH".to_string(), "ESTR".to_string()),
            ]
        );
        assert!(store.curve_payload(d(2025, 1, 3), "BGN", "ESTR").unwrap().is_none());
    }
}
