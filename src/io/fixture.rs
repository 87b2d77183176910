//! Go fixture emission.
//!
//! The pricing engine compiles its curve inputs from generated Go files of the form
//!
//! ```go
//! package data
//!
//! var (
//! 	BGNEstr = map[string]float64{
//! 		"1W": 1.93,
//! 	}
//! )
//! ```
//!
//! One file is written per `(source, currency family)`; it declares up to three
//! maps (OIS, 3M term, 6M term). Rendering is a pure function of its inputs: the
//! generation timestamp is only written when the caller passes one.

use std::fmt::Write as _;
use std::fs::{File, create_dir_all};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::{CurrencyFamily, CurvePoint, CurveRole, FixtureJob};
use crate::error::AppError;

/// Go package the fixture files belong to.
pub const FIXTURE_PACKAGE: &str = "data";

/// One `name = map[string]float64{...}` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableBlock {
    pub variable_name: String,
    pub index_name: String,
    pub role: CurveRole,
    pub entries: Vec<CurvePoint>,
}

/// A complete fixture file, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureArtifact {
    pub file_name: String,
    pub source: String,
    pub currency: CurrencyFamily,
    pub curve_date: NaiveDate,
    pub blocks: Vec<VariableBlock>,
}

/// Sorted curves for the three roles of one fixture file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleCurves {
    pub ois: Vec<CurvePoint>,
    pub term_3m: Vec<CurvePoint>,
    pub term_6m: Vec<CurvePoint>,
}

impl RoleCurves {
    pub fn get(&self, role: CurveRole) -> &[CurvePoint] {
        match role {
            CurveRole::Ois => &self.ois,
            CurveRole::Term3M => &self.term_3m,
            CurveRole::Term6M => &self.term_6m,
        }
    }

    pub fn set(&mut self, role: CurveRole, curve: Vec<CurvePoint>) {
        match role {
            CurveRole::Ois => self.ois = curve,
            CurveRole::Term3M => self.term_3m = curve,
            CurveRole::Term6M => self.term_6m = curve,
        }
    }

    pub fn is_empty(&self) -> bool {
        CurveRole::ALL.iter().all(|role| self.get(*role).is_empty())
    }
}

/// `fixtures_{source}_{suffix}.go`, e.g. `fixtures_bgn_euribor.go`.
pub fn fixture_file_name(source: &str, currency: CurrencyFamily) -> String {
    format!("fixtures_{}_{}.go", source.to_ascii_lowercase(), currency.file_suffix())
}

/// Variable name for a curve role, e.g. `BGNEuribor3M`.
pub fn variable_name(prefix: &str, currency: CurrencyFamily, role: CurveRole) -> String {
    format!("{prefix}{}", currency.index(role).var_stem)
}

/// Assemble the artifact for a job. Empty curves produce no block.
pub fn build_artifact(job: &FixtureJob, curve_date: NaiveDate, curves: &RoleCurves) -> FixtureArtifact {
    let prefix = job.var_prefix();
    let blocks = CurveRole::ALL
        .into_iter()
        .filter(|role| !curves.get(*role).is_empty())
        .map(|role| VariableBlock {
            variable_name: variable_name(prefix, job.currency, role),
            index_name: job.currency.index(role).db_name.to_string(),
            role,
            entries: curves.get(role).to_vec(),
        })
        .collect();

    FixtureArtifact {
        file_name: fixture_file_name(prefix, job.currency),
        source: prefix.to_string(),
        currency: job.currency,
        curve_date,
        blocks,
    }
}

/// Render the artifact as Go source.
pub fn render(artifact: &FixtureArtifact, generated_at: Option<NaiveDateTime>) -> String {
    let mut out = String::new();
    out.push_str(&format!("package {FIXTURE_PACKAGE}\n\n"));
    out.push_str(&format!(
        "// {} {} quotes for curve date {}.\n",
        artifact.source,
        artifact.currency,
        artifact.curve_date.format("%Y-%m-%d")
    ));
    if let Some(ts) = generated_at {
        out.push_str(&format!(
            "// Generated by {} on {}\n",
            env!("CARGO_PKG_NAME"),
            ts.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    out.push_str("var (\n");

    for (i, block) in artifact.blocks.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        render_block(&mut out, block);
    }

    out.push_str(")\n");
    out
}

fn render_block(out: &mut String, block: &VariableBlock) {
    let kind = match block.role {
        CurveRole::Ois => " OIS",
        CurveRole::Term3M | CurveRole::Term6M => "",
    };
    // Writing into a String cannot fail.
    let _ = writeln!(out, "\t// {}{kind} curve ({} tenors)", block.index_name, block.entries.len());
    let _ = writeln!(out, "\t{} = map[string]float64{{", block.variable_name);
    for point in &block.entries {
        let _ = writeln!(out, "\t\t\"{}\": {},", point.tenor, format_rate(point.rate));
    }
    out.push_str("\t}\n");
}

/// Shortest round-trip representation, always a valid Go float literal.
pub fn format_rate(rate: f64) -> String {
    format!("{rate:?}")
}

/// Write the rendered artifact under `dir`, creating the directory if needed.
pub fn write_artifact(
    dir: &Path,
    artifact: &FixtureArtifact,
    generated_at: Option<NaiveDateTime>,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir)
        .map_err(|e| AppError::new(4, format!("Failed to create fixture dir '{}': {e}", dir.display())))?;

    let path = dir.join(&artifact.file_name);
    let mut file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create fixture '{}': {e}", path.display())))?;
    file.write_all(render(artifact, generated_at).as_bytes())
        .map_err(|e| AppError::new(4, format!("Failed to write fixture '{}': {e}", path.display())))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(tenor: &str, rate: f64) -> CurvePoint {
        CurvePoint {
            tenor: tenor.to_string(),
            rate,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 25).unwrap()
    }

    fn eur_curves() -> RoleCurves {
        RoleCurves {
            ois: vec![point("1Y", 1.8916), point("2Y", 2.5)],
            term_3m: vec![point("3M", 2.0125)],
            term_6m: Vec::new(),
        }
    }

    #[test]
    fn renders_blocks_in_role_order() {
        let job = FixtureJob::new("BGN", CurrencyFamily::Eur);
        let artifact = build_artifact(&job, date(), &eur_curves());
        assert_eq!(artifact.file_name, "fixtures_bgn_euribor.go");
        assert_eq!(artifact.blocks.len(), 2);

        let expected = "package data\n\
            \n\
            // BGN EUR quotes for curve date 2025-11-25.\n\
            var (\n\
            \t// ESTR OIS curve (2 tenors)\n\
            \tBGNEstr = map[string]float64{\n\
            \t\t\"1Y\": 1.8916,\n\
            \t\t\"2Y\": 2.5,\n\
            \t}\n\
            \n\
            \t// EURIBOR3M curve (1 tenors)\n\
            \tBGNEuribor3M = map[string]float64{\n\
            \t\t\"3M\": 2.0125,\n\
            \t}\n\
            )\n";
        assert_eq!(render(&artifact, None), expected);
    }

    #[test]
    fn mixed_sources_are_named_after_the_ois_source() {
        let job = FixtureJob::new("BGNS", CurrencyFamily::Jpy).with_sources("BGN", "BGNS");
        let curves = RoleCurves {
            ois: vec![point("1W", 0.477)],
            term_3m: vec![point("3M", 0.75)],
            term_6m: vec![point("6M", 0.85)],
        };
        let artifact = build_artifact(&job, date(), &curves);
        assert_eq!(artifact.file_name, "fixtures_bgn_tibor.go");
        let names: Vec<&str> = artifact.blocks.iter().map(|b| b.variable_name.as_str()).collect();
        assert_eq!(names, vec!["BGNTonar", "BGNTibor3M", "BGNTibor6M"]);
    }

    #[test]
    fn rates_keep_full_precision() {
        assert_eq!(format_rate(1.8916), "1.8916");
        assert_eq!(format_rate(2.0), "2.0");
        assert_eq!(format_rate(-0.123456789012345), "-0.123456789012345");
        assert_eq!(format_rate(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn timestamp_is_opt_in() {
        let job = FixtureJob::new("LCH", CurrencyFamily::Eur);
        let artifact = build_artifact(&job, date(), &eur_curves());

        let plain_a = render(&artifact, None);
        let plain_b = render(&artifact, None);
        assert_eq!(plain_a, plain_b);
        assert!(!plain_a.contains("Generated by"));

        let ts = date().and_hms_opt(18, 30, 0).unwrap();
        let stamped = render(&artifact, Some(ts));
        assert!(stamped.contains("// Generated by basis-audit on 2025-11-25 18:30:00\n"));
    }

    #[test]
    fn write_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("swap").join("basis").join("data");
        let job = FixtureJob::new("LCH", CurrencyFamily::Eur);
        let artifact = build_artifact(&job, date(), &eur_curves());

        let path = write_artifact(&dir, &artifact, None).unwrap();
        assert_eq!(path, dir.join("fixtures_lch_euribor.go"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, render(&artifact, None));
    }
}
