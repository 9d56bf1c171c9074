//! Format-specific writers for text tables.

pub mod delimited;

// Re-export common types and functions
pub use delimited::{WriterConfig, to_delimited_string, write_delimited, write_delimited_path};
