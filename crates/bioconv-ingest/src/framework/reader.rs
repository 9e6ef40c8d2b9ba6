//! Record reader for delimited and line-oriented inputs
//!
//! Turns a byte stream into a lazy, non-restartable sequence of [`Record`]s.
//! Each input format then declares a named-field row type implementing
//! [`RowSchema`]; [`TypedRows`] is the single place where column counts and
//! field formats are validated, with the converter's [`MalformedRowPolicy`]
//! deciding whether a bad row is skipped or aborts the run.

use bioconv_common::{ConvertError, Result};
use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Split};
use std::marker::PhantomData;
use std::path::Path;
use tracing::{debug, warn};

/// Field separator of an input format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    /// Comma-separated with double-quote quoting
    Comma,
    Semicolon,
    /// Runs of whitespace; see [`RecordReader::max_fields`]
    Whitespace,
}

impl Delimiter {
    fn byte(self) -> Option<u8> {
        match self {
            Delimiter::Tab => Some(b'\t'),
            Delimiter::Comma => Some(b','),
            Delimiter::Semicolon => Some(b';'),
            Delimiter::Whitespace => None,
        }
    }
}

/// What to do with a row that does not match its schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRowPolicy {
    /// Log a warning and continue with the next row
    Skip,
    /// Abort the run
    #[default]
    Fail,
}

impl std::str::FromStr for MalformedRowPolicy {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "fail" | "abort" => Ok(Self::Fail),
            _ => Err(ConvertError::parse(format!("Invalid malformed-row policy: {}", s))),
        }
    }
}

/// One input row: 1-based line number plus its raw fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

impl Record {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Trimmed field value; empty when the column is absent
    pub fn get(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.trim()).unwrap_or("")
    }

    /// Trimmed field value that must be non-empty
    pub fn required(&self, index: usize, field: &'static str) -> Result<String> {
        let value = self.get(index);
        if value.is_empty() {
            return Err(ConvertError::InvalidField {
                line: self.line,
                field,
                value: String::new(),
            });
        }
        Ok(value.to_string())
    }
}

enum Source<R: Read> {
    Delimited(csv::ByteRecordsIntoIter<R>),
    Lines { lines: Split<BufReader<R>>, line: usize },
}

/// Lazy reader producing [`Record`]s from a byte stream
pub struct RecordReader<R: Read> {
    source: Source<R>,
    header_lines: usize,
    max_fields: Option<usize>,
}

impl<R: Read> RecordReader<R> {
    pub fn new(input: R, delimiter: Delimiter) -> Self {
        let source = match delimiter.byte() {
            Some(byte) => {
                let reader = csv::ReaderBuilder::new()
                    .delimiter(byte)
                    .has_headers(false)
                    .flexible(true)
                    .quoting(delimiter == Delimiter::Comma)
                    .from_reader(input);
                Source::Delimited(reader.into_byte_records())
            },
            None => Source::Lines {
                lines: BufReader::new(input).split(b'\n'),
                line: 0,
            },
        };

        Self {
            source,
            header_lines: 0,
            max_fields: None,
        }
    }

    /// Skip this many leading rows before yielding records
    pub fn skip_header_lines(mut self, lines: usize) -> Self {
        self.header_lines = lines;
        self
    }

    /// Split whitespace-delimited lines into at most `n` fields; the last
    /// field keeps the remainder of the line
    pub fn max_fields(mut self, n: usize) -> Self {
        self.max_fields = Some(n.max(1));
        self
    }

    /// Validate rows against a schema
    pub fn typed<T: RowSchema>(self, policy: MalformedRowPolicy) -> TypedRows<R, T> {
        TypedRows {
            records: self,
            policy,
            read: 0,
            skipped: 0,
            _row: PhantomData,
        }
    }

    fn next_raw(&mut self) -> Option<Result<Record>> {
        match &mut self.source {
            Source::Delimited(records) => {
                let record = match records.next()? {
                    Ok(record) => record,
                    Err(e) => return Some(Err(e.into())),
                };
                let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
                let fields = record
                    .iter()
                    .map(|field| std::str::from_utf8(field).map(str::to_string))
                    .collect::<std::result::Result<Vec<_>, _>>();
                Some(match fields {
                    Ok(fields) => Ok(Record { line, fields }),
                    Err(_) => Err(ConvertError::InvalidEncoding { line }),
                })
            },
            Source::Lines { lines, line } => loop {
                let bytes = match lines.next()? {
                    Ok(bytes) => bytes,
                    Err(e) => return Some(Err(e.into())),
                };
                *line += 1;
                let Ok(text) = std::str::from_utf8(&bytes) else {
                    return Some(Err(ConvertError::InvalidEncoding { line: *line }));
                };
                if text.trim().is_empty() {
                    continue;
                }
                return Some(Ok(Record {
                    line: *line,
                    fields: split_whitespace_n(text, self.max_fields),
                }));
            },
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.header_lines > 0 {
            self.header_lines -= 1;
            match self.next_raw()? {
                Ok(header) => debug!(line = header.line, "Skipping header row"),
                Err(e) if e.is_data_error() => debug!(error = %e, "Skipping unreadable header row"),
                Err(e) => return Some(Err(e)),
            }
        }
        self.next_raw()
    }
}

fn split_whitespace_n(text: &str, max_fields: Option<usize>) -> Vec<String> {
    let Some(max) = max_fields else {
        return text.split_whitespace().map(str::to_string).collect();
    };

    let mut fields = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        if fields.len() + 1 == max {
            fields.push(rest.trim_end().to_string());
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                fields.push(rest[..end].to_string());
                rest = rest[end..].trim_start();
            },
            None => {
                fields.push(rest.to_string());
                break;
            },
        }
    }
    fields
}

/// Named-field view of one input row
pub trait RowSchema: Sized {
    /// Minimum number of columns a row must have
    const COLUMNS: usize;

    /// Build the typed row; called only when the column count is satisfied
    fn from_record(record: &Record) -> Result<Self>;
}

/// Rows validated against a [`RowSchema`]
pub struct TypedRows<R: Read, T: RowSchema> {
    records: RecordReader<R>,
    policy: MalformedRowPolicy,
    read: usize,
    skipped: usize,
    _row: PhantomData<T>,
}

impl<R: Read, T: RowSchema> TypedRows<R, T> {
    /// Rows consumed so far, including skipped ones
    pub fn read(&self) -> usize {
        self.read
    }

    /// Rows dropped under [`MalformedRowPolicy::Skip`]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn validate(record: &Record) -> Result<T> {
        if record.len() < T::COLUMNS {
            return Err(ConvertError::MalformedRow {
                line: record.line,
                expected: T::COLUMNS,
                found: record.len(),
            });
        }
        T::from_record(record)
    }
}

impl<R: Read, T: RowSchema> Iterator for TypedRows<R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match self.records.next()? {
                Ok(record) => Self::validate(&record),
                Err(e) if e.is_data_error() => Err(e),
                Err(e) => return Some(Err(e)),
            };
            self.read += 1;

            match row {
                Ok(row) => return Some(Ok(row)),
                Err(e) if self.policy == MalformedRowPolicy::Skip && e.is_data_error() => {
                    warn!(error = %e, "Skipping malformed row");
                    self.skipped += 1;
                },
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Open an input file, decompressing `.gz` files transparently
pub fn open_input(path: impl AsRef<Path>) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let is_gzip = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
    if is_gzip {
        debug!(path = %path.display(), "Opening gzip input");
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}
