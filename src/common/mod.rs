//! Common types and utilities shared across modules.

// Submodule declarations
pub mod bom;
pub mod encoding;
pub mod error;

// Re-exports for convenience
pub use bom::BomKind;
pub use encoding::{CandidateEncoding, CandidateEncodingList, DecodeFault};
pub use error::{Error, ParseFault, Result};
