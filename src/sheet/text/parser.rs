//! Record parser for decoded delimited text

use std::iter::Peekable;
use std::str::Chars;

use smallvec::SmallVec;

use super::cell::infer_cell;
use super::config::LoaderConfig;
use super::header::normalize_header;
use crate::common::ParseFault;
use crate::sheet::{CellValue, Table};

/// One record split into raw fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 1-based line on which the record starts
    pub line: usize,
    pub fields: SmallVec<[String; 16]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    /// Nothing consumed yet
    Start,
    Unquoted,
    Quoted,
    /// Closing quote seen; further characters are taken literally
    QuoteClosed,
}

/// Streaming record parser over decoded text.
pub struct TextParser<'a> {
    chars: Peekable<Chars<'a>>,
    config: &'a LoaderConfig,
    line: usize,
}

impl<'a> TextParser<'a> {
    /// Create a new text parser
    pub fn new(text: &'a str, config: &'a LoaderConfig) -> Self {
        TextParser {
            chars: text.chars().peekable(),
            config,
            line: 1,
        }
    }

    /// Parse the next non-blank record, or `None` at end of input.
    pub fn next_record(&mut self) -> Result<Option<Record>, ParseFault> {
        loop {
            if self.chars.peek().is_none() {
                return Ok(None);
            }

            let start_line = self.line;
            let mut fields = SmallVec::new();
            let mut field = String::new();
            let mut state = FieldState::Start;
            let mut quote_line = start_line;
            let mut has_content = false;

            while let Some(c) = self.chars.next() {
                if state == FieldState::Quoted {
                    self.quoted_char(c, &mut field, &mut state);
                    continue;
                }

                if c == self.config.delimiter {
                    self.finish_field(&mut field, state, &mut fields);
                    state = FieldState::Start;
                    has_content = true;
                } else if c == '\n' || c == '\r' {
                    self.end_line(c);
                    break;
                } else if self.config.comment == Some(c) {
                    self.skip_line();
                    break;
                } else if self.config.escape == Some(c) {
                    if let Some(next) = self.chars.next() {
                        self.count_line_break(next);
                        field.push(next);
                    }
                    if state == FieldState::Start {
                        state = FieldState::Unquoted;
                    }
                    has_content = true;
                } else if c == self.config.quote && state == FieldState::Start {
                    state = FieldState::Quoted;
                    quote_line = self.line;
                    has_content = true;
                } else if state == FieldState::Start
                    && self.config.trim_whitespace
                    && c.is_whitespace()
                {
                    // Leading whitespace before the field proper
                } else {
                    field.push(c);
                    if state == FieldState::Start {
                        state = FieldState::Unquoted;
                    }
                    has_content = true;
                }
            }

            if state == FieldState::Quoted {
                return Err(ParseFault::UnterminatedQuote { line: quote_line });
            }

            if !has_content {
                // Blank or comment-only line
                continue;
            }

            self.finish_field(&mut field, state, &mut fields);
            return Ok(Some(Record {
                line: start_line,
                fields,
            }));
        }
    }

    /// Handle one character inside a quoted field.
    fn quoted_char(&mut self, c: char, field: &mut String, state: &mut FieldState) {
        let quote = self.config.quote;

        if c == quote {
            if self.chars.peek() == Some(&quote) {
                // Escaped quote (doubled quote)
                self.chars.next();
                field.push(quote);
            } else {
                *state = FieldState::QuoteClosed;
            }
            return;
        }

        if self.config.escape == Some(c) {
            match self.chars.next() {
                Some('n') => field.push('\n'),
                Some('r') => field.push('\r'),
                Some('t') => field.push('\t'),
                Some(next) if next == quote || Some(next) == self.config.escape => field.push(next),
                Some(next) => {
                    // Unknown escape, include both characters
                    field.push(c);
                    self.count_line_break(next);
                    field.push(next);
                },
                None => field.push(c),
            }
            return;
        }

        self.count_line_break(c);
        field.push(c);
    }

    /// Advance the line counter for a line break kept inside a field.
    fn count_line_break(&mut self, c: char) {
        // CR of a CRLF pair is counted when the LF arrives
        if c == '\n' || (c == '\r' && self.chars.peek() != Some(&'\n')) {
            self.line += 1;
        }
    }

    /// Consume the rest of a line terminator and advance the line counter.
    fn end_line(&mut self, c: char) {
        if c == '\r' && self.chars.peek() == Some(&'\n') {
            self.chars.next();
        }
        self.line += 1;
    }

    /// Skip a comment through the end of its line.
    fn skip_line(&mut self) {
        while let Some(c) = self.chars.next() {
            if c == '\n' || c == '\r' {
                self.end_line(c);
                return;
            }
        }
    }

    /// Finish parsing a field and add it to the fields vector
    fn finish_field(
        &self,
        current_field: &mut String,
        state: FieldState,
        fields: &mut SmallVec<[String; 16]>,
    ) {
        let mut field = std::mem::take(current_field);

        if self.config.trim_whitespace && state == FieldState::Unquoted {
            let trimmed = field.trim_end().len();
            field.truncate(trimmed);
        }

        fields.push(field);
    }
}

/// Parse decoded text into a table.
///
/// The first record names the columns unless `has_headers` is off, in
/// which case columns are numbered from `0`. Records shorter than the
/// header are padded with empty cells; longer ones are a fault. At most
/// `max_rows` data records are read and nothing past the cap is examined.
pub fn parse_table(text: &str, config: &LoaderConfig) -> Result<Table, ParseFault> {
    let mut parser = TextParser::new(text, config);
    let cap = config.max_rows.unwrap_or(usize::MAX);

    let first = parser.next_record()?.ok_or(ParseFault::NoColumns)?;
    let width = first.fields.len();

    let mut rows = Vec::new();
    let names = if config.has_headers {
        normalize_header(first.fields.into_vec())
    } else {
        if cap > 0 {
            rows.push(convert_record(first, width, config)?);
        }
        (0..width).map(|idx| idx.to_string()).collect()
    };

    while rows.len() < cap {
        let Some(record) = parser.next_record()? else {
            break;
        };
        rows.push(convert_record(record, width, config)?);
    }

    Ok(Table::from_aligned_rows(names, rows))
}

/// Type the fields of a record and pad it to `width`.
fn convert_record(
    record: Record,
    width: usize,
    config: &LoaderConfig,
) -> Result<Vec<CellValue>, ParseFault> {
    if record.fields.len() > width {
        return Err(ParseFault::TooManyFields {
            line: record.line,
            expected: width,
            found: record.fields.len(),
        });
    }

    let mut row = Vec::with_capacity(width);
    row.extend(record.fields.into_iter().map(|field| infer_cell(field, config)));
    row.resize(width, CellValue::Empty);
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(text: &str, config: &LoaderConfig) -> Vec<Vec<String>> {
        let mut parser = TextParser::new(text, config);
        let mut out = Vec::new();
        while let Some(record) = parser.next_record().unwrap() {
            out.push(record.fields.into_vec());
        }
        out
    }

    #[test]
    fn test_simple_records() {
        let config = LoaderConfig::default();
        let rows = records("Envase;Nro envases\nCaja;3\r\nCanasto;2", &config);
        assert_eq!(
            rows,
            vec![
                vec!["Envase".to_string(), "Nro envases".to_string()],
                vec!["Caja".to_string(), "3".to_string()],
                vec!["Canasto".to_string(), "2".to_string()],
            ]
        );
    }

    #[test]
    fn test_quoted_fields() {
        let config = LoaderConfig::csv();
        let rows = records("\"Hello, World\",\"Value with \"\"quotes\"\"\",\"Normal\"", &config);
        assert_eq!(rows[0], vec!["Hello, World", "Value with \"quotes\"", "Normal"]);
    }

    #[test]
    fn test_quoted_line_breaks_and_line_numbers() {
        let config = LoaderConfig::csv();
        let mut parser = TextParser::new("a,b\n\"multi\nline\",x\nlast,y\n", &config);

        let header = parser.next_record().unwrap().unwrap();
        assert_eq!(header.line, 1);
        let multi = parser.next_record().unwrap().unwrap();
        assert_eq!(multi.line, 2);
        assert_eq!(multi.fields[0], "multi\nline");
        let last = parser.next_record().unwrap().unwrap();
        assert_eq!(last.line, 4);
        assert!(parser.next_record().unwrap().is_none());
    }

    #[test]
    fn test_quote_inside_unquoted_field_is_literal() {
        let config = LoaderConfig::csv();
        let rows = records("5\" pipe,\"ab\"cd", &config);
        assert_eq!(rows[0], vec!["5\" pipe", "abcd"]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let config = LoaderConfig::csv();
        let rows = records("a,b\n\n\r\n1,2\n\n", &config);
        assert_eq!(rows.len(), 2);
        // A lone empty quoted field is a record, not a blank line
        let rows = records("a\n\"\"\n", &config);
        assert_eq!(rows, vec![vec!["a".to_string()], vec![String::new()]]);
    }

    #[test]
    fn test_lone_carriage_return_ends_record() {
        let config = LoaderConfig::csv();
        let rows = records("a,b\r1,2\r", &config);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_comments() {
        let config = LoaderConfig::csv().with_comment(Some('#'));
        let rows = records("# exported\na,b\n1,2 # trailing\n", &config);
        assert_eq!(rows, vec![vec!["a", "b"], vec!["1", "2 "]]);
    }

    #[test]
    fn test_escape_character() {
        let config = LoaderConfig::csv().with_escape(Some('\\'));
        let rows = records("\"tab\\there\",\"say \\\"hi\\\"\",a\\,b", &config);
        assert_eq!(rows[0], vec!["tab\there", "say \"hi\"", "a,b"]);
    }

    #[test]
    fn test_escaped_line_break_keeps_line_numbers() {
        let config = LoaderConfig::new().with_escape(Some('\\'));

        let table = parse_table("a;b\n1\\\n;2\n", &config).unwrap();
        assert_eq!(table.cell(0, 0), Some(&CellValue::String("1\n".to_string())));

        let err = parse_table("a;b\n1\\\n;2\n1;2;3\n", &config).unwrap_err();
        assert_eq!(
            err,
            ParseFault::TooManyFields {
                line: 4,
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn test_trim_whitespace() {
        let config = LoaderConfig::csv().with_trim_whitespace(true);
        let rows = records("  a  , \" b \" ,c", &config);
        assert_eq!(rows[0], vec!["a", " b  ", "c"]);
    }

    #[test]
    fn test_unterminated_quote() {
        let config = LoaderConfig::csv();
        let mut parser = TextParser::new("a,b\n1,\"open\n2,3\n", &config);
        parser.next_record().unwrap();
        assert_eq!(
            parser.next_record().unwrap_err(),
            ParseFault::UnterminatedQuote { line: 2 }
        );
    }

    #[test]
    fn test_parse_table_pads_short_rows() {
        let table = parse_table("a;b;c\n1;2\n", &LoaderConfig::default()).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(
            table.row(0).unwrap(),
            vec![&CellValue::Int(1), &CellValue::Int(2), &CellValue::Empty]
        );
    }

    #[test]
    fn test_parse_table_rejects_long_rows() {
        let err = parse_table("a;b\n1;2\n1;2;3\n", &LoaderConfig::default()).unwrap_err();
        assert_eq!(
            err,
            ParseFault::TooManyFields {
                line: 3,
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn test_parse_table_empty_input() {
        assert_eq!(
            parse_table("", &LoaderConfig::default()).unwrap_err(),
            ParseFault::NoColumns
        );
        assert_eq!(
            parse_table("\n\n", &LoaderConfig::default()).unwrap_err(),
            ParseFault::NoColumns
        );
    }

    #[test]
    fn test_parse_table_header_only() {
        let table = parse_table("a;b\n", &LoaderConfig::default()).unwrap();
        assert_eq!(table.column_count(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_parse_table_without_headers() {
        let config = LoaderConfig::default().with_headers(false);
        let table = parse_table("x;1\ny;2\n", &config).unwrap();
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["0", "1"]);
        assert_eq!(table.row_count(), 2);

        let capped = parse_table("x;1\ny;2\n", &config.with_max_rows(0)).unwrap();
        assert_eq!(capped.row_count(), 0);
        assert_eq!(capped.column_count(), 2);
    }

    #[test]
    fn test_row_cap_stops_before_later_faults() {
        let config = LoaderConfig::default().with_max_rows(1);
        let table = parse_table("a;b\n1;2\n1;2;3;4\n", &config).unwrap();
        assert_eq!(table.row_count(), 1);
    }
}
