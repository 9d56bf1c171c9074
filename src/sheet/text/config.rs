//! Configuration for loading delimited text tables

use serde::{Deserialize, Serialize};

use crate::common::encoding::CandidateEncodingList;
use crate::common::{Error, Result};

/// Configuration for parsing delimited text files
///
/// Deserializes from YAML (or any serde format); missing keys take their
/// default values. Encodings are given as labels:
///
/// ```yaml
/// delimiter: ";"
/// max_rows: 100
/// encodings: [utf-8, latin-1, cp1252]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Field delimiter character
    pub delimiter: char,
    /// Quote character for quoted fields
    pub quote: char,
    /// Escape character inside quoted fields (None disables escapes)
    pub escape: Option<char>,
    /// Comment character (records starting with this are ignored)
    pub comment: Option<char>,
    /// Whether to trim whitespace from unquoted fields
    pub trim_whitespace: bool,
    /// Whether the first record contains column names
    pub has_headers: bool,
    /// Maximum number of data rows to materialize (None for unbounded)
    pub max_rows: Option<usize>,
    /// Encodings to try, in order
    pub encodings: CandidateEncodingList,
    /// Whether to convert fields to numbers and booleans
    pub infer_types: bool,
    /// Whether the standard NA tokens become empty cells
    pub keep_default_na: bool,
    /// Decimal separator for floating point fields
    pub decimal: char,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: ';',         // Observed default of the source data
            quote: '"',             // Standard CSV quoting
            escape: None,           // Doubled quotes only
            comment: None,          // No comment lines
            trim_whitespace: false, // Preserve whitespace by default
            has_headers: true,      // Assume first row is headers
            max_rows: None,         // Unbounded
            encodings: CandidateEncodingList::default(),
            infer_types: true,
            keep_default_na: true,
            decimal: '.',
        }
    }
}

impl LoaderConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create comma-separated configuration
    pub fn csv() -> Self {
        Self::new().with_delimiter(',')
    }

    /// Create TSV (tab-separated) configuration
    pub fn tsv() -> Self {
        Self::new().with_delimiter('\t')
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the quote character
    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    /// Set the escape character (None to disable escapes)
    pub fn with_escape(mut self, escape: Option<char>) -> Self {
        self.escape = escape;
        self
    }

    /// Set the comment character (None to disable comments)
    pub fn with_comment(mut self, comment: Option<char>) -> Self {
        self.comment = comment;
        self
    }

    /// Enable/disable whitespace trimming
    pub fn with_trim_whitespace(mut self, trim: bool) -> Self {
        self.trim_whitespace = trim;
        self
    }

    /// Set whether first row contains headers
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Cap the number of data rows; `None` removes the cap
    pub fn with_max_rows(mut self, max_rows: impl Into<Option<usize>>) -> Self {
        self.max_rows = max_rows.into();
        self
    }

    /// Set the candidate encodings
    pub fn with_encodings(mut self, encodings: CandidateEncodingList) -> Self {
        self.encodings = encodings;
        self
    }

    /// Enable/disable type inference
    pub fn with_infer_types(mut self, infer: bool) -> Self {
        self.infer_types = infer;
        self
    }

    /// Enable/disable the standard NA tokens
    pub fn with_keep_default_na(mut self, keep: bool) -> Self {
        self.keep_default_na = keep;
        self
    }

    /// Set the decimal separator
    pub fn with_decimal(mut self, decimal: char) -> Self {
        self.decimal = decimal;
        self
    }

    /// Parse and validate a YAML configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_saphyr::from_str(yaml)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse loader config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_saphyr::to_string(self)
            .map_err(|e| Error::InvalidConfig(format!("Failed to serialize loader config: {}", e)))
    }

    /// Check that the special characters do not collide.
    pub fn validate(&self) -> Result<()> {
        let is_line_break = |c: char| c == '\n' || c == '\r';

        if is_line_break(self.delimiter) {
            return Err(Error::InvalidConfig("delimiter cannot be a line break".to_string()));
        }
        if is_line_break(self.quote) {
            return Err(Error::InvalidConfig("quote cannot be a line break".to_string()));
        }
        if self.delimiter == self.quote {
            return Err(Error::InvalidConfig(format!(
                "delimiter and quote are both '{}'",
                self.delimiter.escape_default()
            )));
        }
        if let Some(escape) = self.escape
            && (escape == self.delimiter || is_line_break(escape))
        {
            return Err(Error::InvalidConfig(format!(
                "escape '{}' collides with the delimiter or a line break",
                escape.escape_default()
            )));
        }
        if self.comment == Some(self.delimiter) || self.comment == Some(self.quote) {
            return Err(Error::InvalidConfig(
                "comment character collides with the delimiter or quote".to_string(),
            ));
        }
        if self.infer_types && self.decimal == self.delimiter {
            return Err(Error::InvalidConfig(format!(
                "decimal separator and delimiter are both '{}'",
                self.decimal.escape_default()
            )));
        }
        Ok(())
    }
}
