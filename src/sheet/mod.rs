//! Tables of named columns and their text formats.
//!
//! # Architecture
//!
//! - [`Table`] and [`CellValue`]: the in-memory model every loader produces
//! - [`text`]: loading and writing delimited text

// Submodule declarations
pub mod table;
pub mod text;
pub mod types;

// Re-exports
pub use table::{Column, Rows, Table};
pub use types::CellValue;
