//! Loading delimited text files with ordered encoding fallback
//!
//! The file is read once. Each candidate encoding then gets one attempt at
//! decoding and parsing the same bytes, in list order. Only a decode failure
//! moves on to the next candidate: a structural fault in the decoded text is
//! reported immediately, since no other encoding could repair it.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

use super::config::LoaderConfig;
use super::parser::parse_table;
use crate::common::encoding::{CandidateEncoding, CandidateEncodingList, DecodeFault};
use crate::common::{Error, ParseFault, Result};
use crate::sheet::Table;

/// Path reported in errors for in-memory sources.
pub const MEMORY_SOURCE: &str = "<memory>";

/// A successfully loaded table.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub table: Table,
    /// The candidate that decoded the source
    pub encoding: CandidateEncoding,
    /// Candidates rejected before `encoding`, in trial order
    pub rejected: Vec<DecodeFault>,
}

impl Loaded {
    /// Total number of candidates tried, including the successful one.
    pub fn attempts(&self) -> usize {
        self.rejected.len() + 1
    }

    pub fn into_table(self) -> Table {
        self.table
    }
}

/// Outcome of trying a single candidate encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Decoded and parsed.
    Parsed(Table),
    /// The candidate cannot decode the bytes; try the next one.
    Undecodable(DecodeFault),
    /// Decoded, but the text is not a valid table.
    Malformed(ParseFault),
}

/// Loader that tries candidate encodings in order until one decodes the source.
#[derive(Debug, Clone, Default)]
pub struct EncodingFallbackLoader {
    config: LoaderConfig,
}

impl EncodingFallbackLoader {
    /// Create a loader, validating the configuration.
    pub fn new(config: LoaderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Loader with the default configuration: semicolon delimiter, no row
    /// cap, and UTF-8, ISO-8859-1, Windows-1252 as candidates.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load a file.
    ///
    /// Fails with [`Error::SourceUnavailable`] before trying any encoding if
    /// the file cannot be read.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Loaded> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_source(path, &bytes)
    }

    /// Load a file and keep only the table.
    pub fn load_table<P: AsRef<Path>>(&self, path: P) -> Result<Table> {
        self.load(path).map(Loaded::into_table)
    }

    /// Load from an in-memory buffer.
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<Loaded> {
        self.load_source(Path::new(MEMORY_SOURCE), bytes)
    }

    /// Drain a reader and load its contents.
    pub fn load_reader<R: Read>(&self, mut reader: R) -> Result<Loaded> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| Error::SourceUnavailable {
                path: PathBuf::from(MEMORY_SOURCE),
                source,
            })?;
        self.load_bytes(&bytes)
    }

    /// Load many files in parallel. Results keep the order of `paths`.
    pub fn load_all<P>(&self, paths: &[P]) -> Vec<Result<Loaded>>
    where
        P: AsRef<Path> + Sync,
    {
        paths.par_iter().map(|path| self.load(path)).collect()
    }

    /// Decode and parse `bytes` with a single candidate.
    pub fn attempt(&self, encoding: CandidateEncoding, bytes: &[u8]) -> AttemptOutcome {
        let text = match encoding.decode(bytes) {
            Ok(text) => text,
            Err(fault) => return AttemptOutcome::Undecodable(fault),
        };

        match parse_table(&text, &self.config) {
            Ok(table) => AttemptOutcome::Parsed(table),
            Err(fault) => AttemptOutcome::Malformed(fault),
        }
    }

    fn load_source(&self, path: &Path, bytes: &[u8]) -> Result<Loaded> {
        let mut rejected = Vec::new();

        for encoding in self.config.encodings.iter() {
            match self.attempt(encoding, bytes) {
                AttemptOutcome::Parsed(table) => {
                    debug!(
                        path = %path.display(),
                        %encoding,
                        attempts = rejected.len() + 1,
                        rows = table.row_count(),
                        columns = table.column_count(),
                        "loaded delimited table"
                    );
                    if !rejected.is_empty() {
                        warn!(
                            path = %path.display(),
                            %encoding,
                            rejected = rejected.len(),
                            "decoded with a fallback encoding"
                        );
                    }
                    return Ok(Loaded {
                        table,
                        encoding,
                        rejected,
                    });
                },
                AttemptOutcome::Undecodable(fault) => {
                    debug!(
                        path = %path.display(),
                        %encoding,
                        offset = fault.offset,
                        "candidate encoding rejected"
                    );
                    rejected.push(fault);
                },
                AttemptOutcome::Malformed(fault) => {
                    debug!(path = %path.display(), %encoding, %fault, "malformed table");
                    return Err(Error::StructuralParseFailure {
                        path: path.to_path_buf(),
                        fault,
                    });
                },
            }
        }

        Err(Error::DecodingExhausted {
            path: path.to_path_buf(),
            attempted: self.config.encodings.labels(),
        })
    }
}

/// Load a delimited file with the given delimiter, row cap and candidate encodings.
///
/// Every other setting takes its default.
pub fn load_delimited<P: AsRef<Path>>(
    path: P,
    delimiter: char,
    max_rows: Option<usize>,
    encodings: CandidateEncodingList,
) -> Result<Table> {
    let config = LoaderConfig::new()
        .with_delimiter(delimiter)
        .with_max_rows(max_rows)
        .with_encodings(encodings);
    EncodingFallbackLoader::new(config)?.load_table(path)
}
