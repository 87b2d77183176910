//! Tenor whitelists and calendar ordering.
//!
//! Vendors publish more points than the pricing engine bootstraps from, so each
//! reference index has a fixed whitelist. Indices without an entry pass through
//! untouched.

use crate::domain::{CurvePoint, QuoteMap};

const ESTR: &[&str] = &[
    "1W", "2W", "1M", "2M", "3M", "4M", "5M", "6M", "7M", "8M", "9M", "10M", "11M", "1Y", "18M", "2Y", "3Y",
    "4Y", "5Y", "6Y", "7Y", "8Y", "9Y", "10Y", "11Y", "12Y", "15Y", "20Y", "25Y", "30Y", "40Y", "50Y",
];

const EURIBOR3M: &[&str] = &[
    "3M", "1Y", "2Y", "3Y", "4Y", "5Y", "6Y", "7Y", "8Y", "9Y", "10Y", "11Y", "12Y", "15Y", "20Y", "25Y", "30Y",
    "40Y", "50Y",
];

const EURIBOR6M: &[&str] = &[
    "6M", "1Y", "18M", "2Y", "3Y", "4Y", "5Y", "6Y", "7Y", "8Y", "9Y", "10Y", "11Y", "12Y", "15Y", "20Y", "25Y",
    "30Y", "40Y", "50Y",
];

const TONAR: &[&str] = &[
    "1W", "2W", "1M", "2M", "3M", "4M", "5M", "6M", "7M", "8M", "9M", "10M", "11M", "1Y", "15M", "18M", "21M",
    "2Y", "3Y", "4Y", "5Y", "6Y", "7Y", "8Y", "9Y", "10Y", "11Y", "12Y", "15Y", "20Y", "25Y", "30Y", "35Y", "40Y",
];

const TIBOR3M: &[&str] = &[
    "3M", "1Y", "18M", "2Y", "3Y", "4Y", "5Y", "6Y", "7Y", "8Y", "9Y", "10Y", "12Y", "15Y", "20Y", "25Y", "30Y",
    "40Y",
];

const TIBOR6M: &[&str] = &[
    "6M", "1Y", "18M", "2Y", "3Y", "4Y", "5Y", "6Y", "7Y", "8Y", "9Y", "10Y", "12Y", "15Y", "20Y", "25Y", "30Y",
    "35Y", "40Y",
];

/// Whitelisted tenors for a reference index, or `None` if the index is unrestricted.
pub fn allowed_tenors(reference_index: &str) -> Option<&'static [&'static str]> {
    match reference_index {
        "ESTR" => Some(ESTR),
        "EURIBOR3M" => Some(EURIBOR3M),
        "EURIBOR6M" => Some(EURIBOR6M),
        "TONAR" => Some(TONAR),
        "TIBOR3M" => Some(TIBOR3M),
        "TIBOR6M" => Some(TIBOR6M),
        _ => None,
    }
}

/// Drop quotes whose tenor is not whitelisted for `reference_index`.
pub fn filter_allowed(quotes: &QuoteMap, reference_index: &str) -> QuoteMap {
    let mut out = quotes.clone();
    if let Some(allowed) = allowed_tenors(reference_index) {
        out.retain(|tenor, _| allowed.contains(&tenor));
    }
    out
}

/// Approximate tenor length in months, or `None` if the label is not `<n>W|M|Y`.
///
/// Weeks convert as `n * 7 / 30`.
pub fn tenor_months(tenor: &str) -> Option<f64> {
    let tenor = tenor.trim().to_ascii_uppercase();
    let (count, scale) = if let Some(n) = tenor.strip_suffix('W') {
        (n, 7.0 / 30.0)
    } else if let Some(n) = tenor.strip_suffix('M') {
        (n, 1.0)
    } else if let Some(n) = tenor.strip_suffix('Y') {
        (n, 12.0)
    } else {
        return None;
    };
    let n = count.parse::<f64>().ok()?;
    n.is_finite().then_some(n * scale)
}

/// Calendar sort key. Unrecognized labels map to `0` and therefore sort first.
pub fn tenor_sort_key(tenor: &str) -> f64 {
    match tenor_months(tenor) {
        Some(months) => months,
        None => {
            tracing::debug!(tenor, "unrecognized tenor label; sorting first");
            0.0
        }
    }
}

/// Quotes as a calendar-ordered curve. Ties keep encounter order.
pub fn sort_by_calendar(quotes: &QuoteMap) -> Vec<CurvePoint> {
    let mut keyed: Vec<(f64, CurvePoint)> = quotes
        .iter()
        .map(|(tenor, rate)| {
            (
                tenor_sort_key(tenor),
                CurvePoint {
                    tenor: tenor.to_string(),
                    rate,
                },
            )
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, point)| point).collect()
}

/// Whitelist filter followed by calendar sort.
pub fn filter_and_sort(quotes: &QuoteMap, reference_index: &str) -> Vec<CurvePoint> {
    sort_by_calendar(&filter_allowed(quotes, reference_index))
}
