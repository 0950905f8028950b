//! LIR - Common Types and Utilities
//!
//! This crate contains shared identifier types and the umbrella error type
//! used across all stages of the LIR pipeline (IR, lowering, assembly writer).

pub mod error;
pub mod types;

pub use error::CompilerError;
pub use types::*;
