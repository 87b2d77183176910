//! Input/output helpers.
//!
//! - stored payload normalization (`normalize`)
//! - tenor whitelists and calendar ordering (`tenor`)
//! - Go fixture emission (`fixture`)
//! - scan report JSON export (`export`)

pub mod export;
pub mod fixture;
pub mod normalize;
pub mod tenor;

pub use export::*;
pub use fixture::*;
pub use normalize::*;
pub use tenor::*;
