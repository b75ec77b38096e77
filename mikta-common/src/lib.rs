//! Common definitions (error and result types), relied upon by all mikta-* crates.

pub mod error;
pub mod result;

pub use result::Result;
