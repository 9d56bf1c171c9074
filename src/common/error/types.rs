//! Unified error types for Loquat.
//!
//! Loading distinguishes three failure classes: the source could not be read,
//! no candidate encoding could decode it, or the decoded text is not a valid
//! delimited table. Only decode failures are retried, and those never escape
//! the loader individually.
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for Loquat operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The file is missing or could not be read. Never retried.
    #[error("source unavailable: {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every candidate encoding failed to decode the bytes.
    #[error("no candidate encoding could decode {}: tried {}", path.display(), attempted.join(", "))]
    DecodingExhausted {
        path: PathBuf,
        /// Labels of the candidates, in the order they were tried.
        attempted: Vec<String>,
    },

    /// The decoded text is not a well-formed delimited table.
    #[error("malformed table in {}: {fault}", path.display())]
    StructuralParseFailure { path: PathBuf, fault: ParseFault },

    /// Loader or writer configuration violates an invariant.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Columns of unequal length or with clashing names.
    #[error("invalid table: {0}")]
    InvalidTable(String),

    /// The writer's target encoding cannot represent a character.
    #[error("text cannot be encoded as {encoding}: unmappable character at byte {offset}")]
    Unencodable { encoding: String, offset: usize },

    /// IO error while writing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structural problems found while splitting decoded text into records.
///
/// Line numbers are 1-based and count physical lines of the decoded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFault {
    /// A data record has more fields than the header.
    TooManyFields {
        line: usize,
        expected: usize,
        found: usize,
    },
    /// A quoted field is still open at end of input.
    UnterminatedQuote { line: usize },
    /// The input holds no records at all.
    NoColumns,
}

impl fmt::Display for ParseFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFault::TooManyFields {
                line,
                expected,
                found,
            } => write!(f, "expected {expected} fields in line {line}, saw {found}"),
            ParseFault::UnterminatedQuote { line } => {
                write!(f, "end of input inside quoted field starting at line {line}")
            },
            ParseFault::NoColumns => f.write_str("no columns to parse from input"),
        }
    }
}

impl Error {
    /// Whether this error came from the table structure rather than the source or its encoding.
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::StructuralParseFailure { .. })
    }
}

/// Result type for Loquat operations.
pub type Result<T> = std::result::Result<T, Error>;
