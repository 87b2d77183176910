//! Parsing of pricing-engine report lines.
//!
//! The basis calculator prints one line per priced swap, for example
//!
//! ```text
//! BGN EURIBOR3M/EURIBOR6M 10x10 computed=5.230000 bp | database=5.100000 bp | diff=0.130000 bp
//! ```
//!
//! Only lines carrying both `computed=` and `diff=` are candidates. The first
//! three whitespace tokens are the source, the index pair and the tenor; values
//! follow their `key=` prefix with an optional unit suffix (`5.23bp`) or a
//! separate unit token (`5.23 bp`).

use chrono::NaiveDate;

use crate::domain::DiffIssue;

const COMPUTED: &str = "computed=";
const DATABASE: &str = "database=";
const DIFF: &str = "diff=";

/// One parsed engine output line.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub source: String,
    pub index_pair: String,
    pub tenor: String,
    pub computed: Option<f64>,
    pub database: Option<f64>,
    pub diff: f64,
}

/// Parse a report line. Returns `None` for anything that is not a well-formed
/// candidate line.
pub fn parse_report_line(line: &str) -> Option<ReportLine> {
    if !(line.contains(COMPUTED) && line.contains(DIFF)) {
        return None;
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [source, index_pair, tenor, ..] = tokens.as_slice() else {
        return None;
    };
    let diff = labelled_value(&tokens, DIFF)?;

    Some(ReportLine {
        source: source.to_string(),
        index_pair: index_pair.to_string(),
        tenor: tenor.to_string(),
        computed: labelled_value(&tokens, COMPUTED),
        database: labelled_value(&tokens, DATABASE),
        diff,
    })
}

/// Turn a line into a `DiffIssue` if its `|diff|` strictly exceeds `threshold`.
pub fn classify_line(date: NaiveDate, line: &str, threshold: f64) -> Option<DiffIssue> {
    let parsed = parse_report_line(line)?;
    if parsed.diff.abs() <= threshold || parsed.diff.is_nan() {
        return None;
    }
    Some(DiffIssue {
        date,
        source: parsed.source,
        index_pair: parsed.index_pair,
        tenor: parsed.tenor,
        computed: parsed.computed,
        reference: parsed.database,
        diff: parsed.diff,
        raw_line: line.trim().to_string(),
    })
}

/// All issues in one engine stdout, in line order.
pub fn classify_output(date: NaiveDate, stdout: &str, threshold: f64) -> Vec<DiffIssue> {
    stdout
        .lines()
        .filter_map(|line| classify_line(date, line, threshold))
        .collect()
}

/// Numeric value of the first token starting with `label`.
fn labelled_value(tokens: &[&str], label: &str) -> Option<f64> {
    let raw = tokens.iter().find_map(|t| t.strip_prefix(label))?;
    strip_unit(raw).parse::<f64>().ok()
}

/// `0.13bp` -> `0.13`.
fn strip_unit(raw: &str) -> &str {
    raw.trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 29).unwrap()
    }

    #[test]
    fn flags_line_above_threshold() {
        let line = "BGN EURIBOR3M/EURIBOR6M 10x10 computed=5.23bp database=5.10bp diff=0.13bp";
        let issue = classify_line(date(), line, 0.1).unwrap();
        assert_eq!(issue.source, "BGN");
        assert_eq!(issue.index_pair, "EURIBOR3M/EURIBOR6M");
        assert_eq!(issue.tenor, "10x10");
        assert_eq!(issue.diff, 0.13);
        assert_eq!(issue.computed, Some(5.23));
        assert_eq!(issue.reference, Some(5.10));
        assert_eq!(issue.raw_line, line);
    }

    #[test]
    fn ignores_line_within_threshold() {
        let line = "LCH EURIBOR3M/EURIBOR6M 5x5 computed=1.00bp database=1.00bp diff=0.00bp";
        assert!(parse_report_line(line).is_some());
        assert!(classify_line(date(), line, 0.1).is_none());
    }

    #[test]
    fn boundary_is_excluded() {
        let at = "BGN EURIBOR3M/EURIBOR6M 10x20 computed=1.5bp database=1.0bp diff=0.5bp";
        let below = "BGN EURIBOR3M/EURIBOR6M 10x20 computed=1.5bp database=2.0bp diff=-0.5bp";
        let above = "BGN EURIBOR3M/EURIBOR6M 10x20 computed=1.5bp database=2.0bp diff=-0.50001bp";
        assert!(classify_line(date(), at, 0.5).is_none());
        assert!(classify_line(date(), below, 0.5).is_none());
        assert_eq!(classify_line(date(), above, 0.5).unwrap().diff, -0.50001);
    }

    #[test]
    fn parses_engine_output_with_separate_units() {
        let line = "BGNS TIBOR3M/TIBOR6M 1x4 computed=3.123456 bp | database=1.900000 bp | diff=1.223456 bp";
        let parsed = parse_report_line(line).unwrap();
        assert_eq!(parsed.source, "BGNS");
        assert_eq!(parsed.tenor, "1x4");
        assert_eq!(parsed.computed, Some(3.123456));
        assert_eq!(parsed.database, Some(1.9));
        assert_eq!(parsed.diff, 1.223456);
    }

    #[test]
    fn malformed_lines_are_ignored() {
        let lines = [
            "",
            "Warning: Could not connect to database",
            "BGN EURIBOR3M/EURIBOR6M 10x10 computed=5.23 bp",
            "computed=1 diff=2",
            "BGN EURIBOR3M/EURIBOR6M 10x10 computed=5.23bp diff=n/a",
            "BGN EURIBOR3M/EURIBOR6M 10x10 computed=5.23bp diff=",
        ];
        for line in lines {
            assert!(parse_report_line(line).is_none(), "{line}");
        }
    }

    #[test]
    fn missing_database_value_is_optional() {
        let line = "LCH EURIBOR3M/EURIBOR6M 10x20 computed=2.0bp diff=0.7bp";
        let issue = classify_line(date(), line, 0.1).unwrap();
        assert_eq!(issue.reference, None);
        assert_eq!(issue.computed, Some(2.0));
    }

    #[test]
    fn classify_output_keeps_line_order() {
        let stdout = "\
BGN EURIBOR3M/EURIBOR6M 10x10 computed=5.0 bp | database=4.0 bp | diff=1.0 bp
BGN EURIBOR3M/EURIBOR6M 10x20 computed=5.0 bp | database=5.0 bp | diff=0.0 bp
LCH EURIBOR3M/EURIBOR6M 10x10 computed=5.0 bp | database=7.0 bp | diff=-2.0 bp
";
        let issues = classify_output(date(), stdout, 0.1);
        let diffs: Vec<f64> = issues.iter().map(|i| i.diff).collect();
        assert_eq!(diffs, vec![1.0, -2.0]);
        assert!(issues.iter().all(|i| i.date == date()));
    }
}
