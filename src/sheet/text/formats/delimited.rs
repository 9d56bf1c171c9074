//! Delimited text (CSV/TSV/semicolon) writer.
//!
//! Output reloads through [`EncodingFallbackLoader`] with the same special
//! characters into an equal table: fields the parser would split, skip or
//! trim are quoted, floats are written in shortest round-trip form, and a
//! record that would otherwise be a blank line is written as `""`. A NaN
//! float is written as an empty field and reloads as [`CellValue::Empty`].
//!
//! [`EncodingFallbackLoader`]: crate::sheet::text::EncodingFallbackLoader

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::common::encoding::CandidateEncoding;
use crate::common::{Error, Result};
use crate::sheet::text::LoaderConfig;
use crate::sheet::{CellValue, Table};

#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub delimiter: char,
    pub quote: char,
    /// Escape character the reader will honor; doubled inside quoted fields
    pub escape: Option<char>,
    /// Comment character the reader will honor; fields containing it are quoted
    pub comment: Option<char>,
    pub decimal: char,
    /// Whether to write the column names as the first record
    pub has_headers: bool,
    /// Output encoding
    pub encoding: CandidateEncoding,
    /// Whether to start the output with the encoding's BOM, if it has one
    pub write_bom: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            delimiter: ';',
            quote: '"',
            escape: None,
            comment: None,
            decimal: '.',
            has_headers: true,
            encoding: CandidateEncoding::utf8(),
            write_bom: false,
        }
    }
}

impl WriterConfig {
    pub fn csv() -> Self {
        Self {
            delimiter: ',',
            ..Self::default()
        }
    }

    pub fn tsv() -> Self {
        Self {
            delimiter: '\t',
            ..Self::default()
        }
    }

    /// Mirror the special characters of a loader configuration, writing in
    /// its first candidate encoding.
    pub fn from_loader(config: &LoaderConfig) -> Self {
        Self {
            delimiter: config.delimiter,
            quote: config.quote,
            escape: config.escape,
            comment: config.comment,
            decimal: config.decimal,
            has_headers: config.has_headers,
            encoding: config.encodings.first(),
            write_bom: false,
        }
    }

    pub fn with_encoding(mut self, encoding: CandidateEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn with_write_bom(mut self, write_bom: bool) -> Self {
        self.write_bom = write_bom;
        self
    }

    fn validate(&self) -> Result<()> {
        if matches!(self.delimiter, '\n' | '\r') || matches!(self.quote, '\n' | '\r') {
            return Err(Error::InvalidConfig(
                "delimiter and quote cannot be line breaks".to_string(),
            ));
        }
        if self.delimiter == self.quote {
            return Err(Error::InvalidConfig(format!(
                "delimiter and quote are both '{}'",
                self.delimiter.escape_default()
            )));
        }
        Ok(())
    }
}

/// Render a table as delimited text, header record first unless
/// `has_headers` is off.
pub fn to_delimited_string(table: &Table, config: &WriterConfig) -> Result<String> {
    config.validate()?;

    let mut out = String::new();
    if config.has_headers {
        let header: Vec<Cow<'_, str>> = table.column_names().map(Cow::Borrowed).collect();
        push_record(&mut out, &header, config);
    }

    for row in table.rows() {
        let fields: Vec<Cow<'_, str>> = row.into_iter().map(|v| format_cell(v, config)).collect();
        push_record(&mut out, &fields, config);
    }

    Ok(out)
}

/// Write a table as delimited text in the configured encoding.
pub fn write_delimited<W: Write>(table: &Table, writer: &mut W, config: &WriterConfig) -> Result<()> {
    let text = to_delimited_string(table, config)?;
    let bytes = config.encoding.encode(&text)?;

    if config.write_bom
        && let Some(bom) = config.encoding.bom()
    {
        bom.write_to(writer)?;
    }

    writer.write_all(&bytes)?;
    Ok(())
}

/// Write a table to a file, replacing any existing content.
pub fn write_delimited_path<P: AsRef<Path>>(table: &Table, path: P, config: &WriterConfig) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_delimited(table, &mut writer, config)?;
    writer.flush()?;
    Ok(())
}

fn format_cell<'a>(value: &'a CellValue, config: &WriterConfig) -> Cow<'a, str> {
    match value {
        CellValue::Empty => Cow::Borrowed(""),
        CellValue::Bool(b) => Cow::Borrowed(if *b { "True" } else { "False" }),
        CellValue::Int(i) => Cow::Owned(itoa::Buffer::new().format(*i).to_owned()),
        CellValue::Float(f) if f.is_nan() => Cow::Borrowed(""),
        CellValue::Float(f) => {
            let mut buffer = ryu::Buffer::new();
            let text = buffer.format(*f);
            if config.decimal == '.' {
                Cow::Owned(text.to_owned())
            } else {
                Cow::Owned(text.replace('.', config.decimal.encode_utf8(&mut [0u8; 4])))
            }
        },
        CellValue::String(s) => Cow::Borrowed(s),
    }
}

fn push_record(out: &mut String, fields: &[Cow<'_, str>], config: &WriterConfig) {
    let lone_field = fields.len() == 1;

    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            out.push(config.delimiter);
        }
        if needs_quote(field, config) || (lone_field && field.is_empty()) {
            push_quoted(out, field, config);
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}

fn needs_quote(field: &str, config: &WriterConfig) -> bool {
    field.starts_with(char::is_whitespace)
        || field.ends_with(char::is_whitespace)
        || field.chars().any(|c| {
            c == config.delimiter
                || c == config.quote
                || c == '\n'
                || c == '\r'
                || Some(c) == config.comment
                || Some(c) == config.escape
        })
}

fn push_quoted(out: &mut String, field: &str, config: &WriterConfig) {
    out.push(config.quote);
    for c in field.chars() {
        if c == config.quote || Some(c) == config.escape {
            out.push(c);
        }
        out.push(c);
    }
    out.push(config.quote);
}
