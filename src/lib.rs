//! `basis-audit` library crate.
//!
//! The binary is a thin wrapper around this library so that:
//!
//! - fixture generation and scanning are testable without a database or engine
//! - the store and engine sit behind traits (`data::MarketStore`,
//!   `engine::PricingEngineClient`) with in-memory stand-ins for tests

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod io;
pub mod report;
pub mod scan;
