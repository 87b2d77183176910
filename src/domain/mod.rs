//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - canonical curve quotes (`QuoteMap`, `CurveQuoteSet`, `CurvePoint`)
//! - fixture naming tables (`CurrencyFamily`, `CurveRole`, `FixtureJob`)
//! - scan inputs and outputs (`ScanConfig`, `EngineConfig`, `DiffIssue`)

pub mod types;

pub use types::*;
