//! Stored curve payload normalization.
//!
//! The `marketdata.curves.quotes` column has been written by several loaders
//! over the years, so one curve can arrive in any of three layouts:
//!
//! 1. a list of records: `[{"tenor": "1Y", "rate": 1.8916, "ticker": "..."}, ...]`
//! 2. an object wrapping that list: `{"quotes": [...], "source": "BGN", ...}`
//! 3. a flat object of tenor -> rate: `{"1Y": 1.8916, "2Y": 2.5, "source": "BGN"}`
//!
//! This module classifies a payload into exactly one `PayloadShape` and
//! extracts a canonical `QuoteMap`. Nothing here fails: malformed records are
//! skipped and unrecognized payloads yield an empty map.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::domain::{CurveQuoteSet, QuoteMap};

/// Keys of a flat payload that carry curve metadata rather than quotes.
pub const METADATA_KEYS: [&str; 4] = ["source", "curve_date", "curve_type", "reference_index"];

/// Field of a wrapped payload holding the record list.
const NESTED_FIELD: &str = "quotes";

/// Layout of a stored payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayloadShape<'a> {
    /// A bare list of `{tenor, rate}` records.
    Sequence(&'a [Value]),
    /// An object whose `quotes` field is a list of records.
    Nested(&'a [Value]),
    /// An object of tenor -> numeric rate, plus optional metadata keys.
    Direct(&'a Map<String, Value>),
    Unrecognized,
}

impl<'a> PayloadShape<'a> {
    /// Classify a payload. Checks run in order: sequence, nested, direct.
    pub fn classify(payload: &'a Value) -> Self {
        match payload {
            Value::Array(records) => PayloadShape::Sequence(records),
            Value::Object(fields) => {
                if let Some(Value::Array(records)) = fields.get(NESTED_FIELD) {
                    return PayloadShape::Nested(records);
                }
                let all_numeric = fields
                    .iter()
                    .filter(|(key, _)| !is_metadata_key(key))
                    .all(|(_, value)| value.is_number());
                if all_numeric {
                    PayloadShape::Direct(fields)
                } else {
                    PayloadShape::Unrecognized
                }
            }
            _ => PayloadShape::Unrecognized,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PayloadShape::Sequence(_) => "sequence",
            PayloadShape::Nested(_) => "nested",
            PayloadShape::Direct(_) => "direct",
            PayloadShape::Unrecognized => "unrecognized",
        }
    }

    /// Extract the canonical mapping for this shape.
    pub fn quotes(&self) -> QuoteMap {
        match self {
            PayloadShape::Sequence(records) | PayloadShape::Nested(records) => quotes_from_records(records),
            PayloadShape::Direct(fields) => fields
                .iter()
                .filter(|(key, _)| !is_metadata_key(key))
                .filter_map(|(tenor, value)| value.as_f64().map(|rate| (tenor.as_str(), rate)))
                .collect(),
            PayloadShape::Unrecognized => QuoteMap::new(),
        }
    }
}

/// Normalize an optional stored payload into a canonical mapping.
///
/// An absent payload and an unrecognized one both produce an empty map.
pub fn normalize_payload(payload: Option<&Value>) -> QuoteMap {
    let Some(payload) = payload else {
        return QuoteMap::new();
    };
    let shape = PayloadShape::classify(payload);
    if shape == PayloadShape::Unrecognized {
        tracing::debug!("unrecognized curve payload; treating as empty");
    }
    shape.quotes()
}

impl CurveQuoteSet {
    /// Build a quote set from a raw store payload for `(curve_date, source, reference_index)`.
    pub fn from_payload(
        curve_date: NaiveDate,
        source: impl Into<String>,
        reference_index: impl Into<String>,
        payload: Option<&Value>,
    ) -> Self {
        Self {
            source: source.into(),
            reference_index: reference_index.into(),
            curve_date,
            quotes: normalize_payload(payload),
        }
    }
}

fn is_metadata_key(key: &str) -> bool {
    METADATA_KEYS.contains(&key)
}

fn quotes_from_records(records: &[Value]) -> QuoteMap {
    let mut quotes = QuoteMap::new();
    for record in records {
        match parse_record(record) {
            Some((tenor, Some(rate))) => quotes.insert(tenor, rate),
            // A later null rate replaces the earlier one, which drops the tenor.
            Some((tenor, None)) => quotes.remove(tenor),
            None => {}
        }
    }
    quotes
}

/// Parse one `{tenor, rate}` record.
///
/// Returns `None` for malformed records and `Some((tenor, None))` when the rate
/// is present but null, so callers can tell "skip" from "absent rate".
fn parse_record(record: &Value) -> Option<(&str, Option<f64>)> {
    let fields = record.as_object()?;
    let tenor = fields.get("tenor")?.as_str()?;
    let rate = match fields.get("rate")? {
        Value::Null => None,
        value => Some(value.as_f64()?),
    };
    Some((tenor, rate))
}
