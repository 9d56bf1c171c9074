//! Delimited text table support (CSV, TSV, semicolon-separated, etc.)
//!
//! Files are loaded by [`EncodingFallbackLoader`], which decodes the bytes
//! with each candidate encoding in turn and parses the first successful
//! decode. The [`formats`] module writes tables back out as delimited text.
//!
//! # Features
//!
//! - **Encoding fallback**: strict decoding with an ordered candidate list
//! - **Configurable delimiters**: semicolon by default, comma, tab, or any character
//! - **Quote handling**: quoted fields with doubled quotes and optional escapes
//! - **Row cap**: read only the first N data rows
//! - **Type inference**: integers, floats, booleans and NA tokens
//!
//! # Example
//!
//! ```rust,no_run
//! use loquat::sheet::text::{EncodingFallbackLoader, LoaderConfig};
//!
//! let config = LoaderConfig::new().with_delimiter(';').with_max_rows(100);
//! let loader = EncodingFallbackLoader::new(config)?;
//! let loaded = loader.load("Ejemplo plantilla post cosecha.csv")?;
//!
//! println!("Decoded as {} after {} attempt(s)", loaded.encoding, loaded.attempts());
//! println!("Rows: {}", loaded.table.row_count());
//! for name in loaded.table.column_names() {
//!     println!("Column: {}", name);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cell;
pub mod config;
pub mod formats;
pub mod header;
pub mod loader;
pub mod parser;

pub use config::LoaderConfig;
pub use loader::{AttemptOutcome, EncodingFallbackLoader, Loaded, MEMORY_SOURCE, load_delimited};
pub use parser::{TextParser, parse_table};
