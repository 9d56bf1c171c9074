//! Loquat - delimited text tables with character-encoding fallback
//!
//! Spreadsheet exports reach us as semicolon- or comma-separated text in
//! whatever encoding the exporting machine used. Loquat tries an ordered
//! list of candidate encodings, strictly, and parses the first decode that
//! succeeds into a [`Table`].
//!
//! # Features
//!
//! - **Ordered fallback**: UTF-8, then ISO-8859-1, then Windows-1252 by default
//! - **Typed failures**: unreadable sources, exhausted encodings and malformed
//!   tables are distinct [`Error`] variants, and only decode failures are retried
//! - **Writer**: tables write back out as delimited text that reloads equal
//!
//! # Example
//!
//! ```no_run
//! use loquat::{CandidateEncodingList, load_delimited};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let encodings = CandidateEncodingList::from_labels(["utf-8", "latin-1", "cp1252"])?;
//! let table = load_delimited("harvest.csv", ';', Some(100), encodings)?;
//!
//! println!("Rows: {}", table.row_count());
//! println!("Columns: {:?}", table.column_names().collect::<Vec<_>>());
//! # Ok(())
//! # }
//! ```

/// Shared error, encoding and BOM types
pub mod common;

/// Table model and delimited text loading/writing
pub mod sheet;

// Re-export commonly used types for convenience
pub use common::{CandidateEncoding, CandidateEncodingList, DecodeFault, Error, ParseFault, Result};
pub use sheet::text::formats::{WriterConfig, write_delimited, write_delimited_path};
pub use sheet::text::{EncodingFallbackLoader, Loaded, LoaderConfig, load_delimited};
pub use sheet::{CellValue, Column, Table};
