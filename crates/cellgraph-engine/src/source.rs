//! Cell sources: where raw `(id, x, y, z)` records come from.
//!
//! A [`CellSource`] hands the run an iterator of per-record results.
//! Per-record problems (a malformed row, a missing column value) are
//! [`RecordError`]s that the registry skips and counts. Problems with the
//! source as a whole (it cannot be opened, the header is unusable, the
//! stream fails mid-read) are [`SourceError`]s and stop the run.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use cellgraph_core::{RawCellRecord, RecordError};
use serde::Deserialize;

use crate::config::InputFormat;
use crate::csv::{split_record, SplitError};

const NOT_UTF8: &str = "line is not valid UTF-8";

/// Read one physical line into `buf`, replacing its contents. `Ok(false)`
/// at end of input.
fn read_physical_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    Ok(reader.read_until(b'\n', buf)? > 0)
}

/// Boxed per-record iterator returned by [`CellSource::records`].
pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<RawCellRecord, RecordError>> + 'a>;

/// Errors that make a whole source unusable.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source could not be opened.
    #[error("cannot open cell source {path}")]
    Open {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Reading failed partway through.
    #[error("read error after line {line}")]
    Read {
        /// Last line read successfully.
        line: u64,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The CSV header lacks a required column.
    #[error("header is missing required column `{column}`")]
    MissingColumn {
        /// The absent column name.
        column: &'static str,
    },
    /// The CSV header itself could not be parsed.
    #[error("malformed header: {reason}")]
    BadHeader {
        /// Parse failure description.
        reason: String,
    },
}

/// Supplier of raw cell records.
///
/// Implementations adapt whatever holds the geometry (files, an in-memory
/// list, a host application) to a stream of records in a consistent frame.
pub trait CellSource {
    /// Short human-readable description for logs.
    fn describe(&self) -> String;

    /// Begin reading records.
    fn records(&mut self) -> Result<RecordIter<'_>, SourceError>;

    /// Report any stream failure hit while iterating [`records`](Self::records).
    ///
    /// Called once the iterator is exhausted. A source whose iterator
    /// stopped early because of an I/O failure returns it here.
    fn finish(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}

// ── VecSource ─────────────────────────────────────────────────────

/// In-memory records.
#[derive(Clone, Debug, Default)]
pub struct VecSource {
    records: Vec<RawCellRecord>,
}

impl VecSource {
    /// Wrap `records`.
    pub fn new(records: Vec<RawCellRecord>) -> Self {
        Self { records }
    }
}

impl From<Vec<RawCellRecord>> for VecSource {
    fn from(records: Vec<RawCellRecord>) -> Self {
        Self::new(records)
    }
}

impl CellSource for VecSource {
    fn describe(&self) -> String {
        format!("{} in-memory records", self.records.len())
    }

    fn records(&mut self) -> Result<RecordIter<'_>, SourceError> {
        Ok(Box::new(self.records.iter().cloned().map(Ok::<_, RecordError>)))
    }
}

// ── CSV ───────────────────────────────────────────────────────────

/// Column positions resolved from the header row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Columns {
    id: usize,
    x: usize,
    y: usize,
    z: usize,
}

impl Columns {
    fn from_header(header: &[String]) -> Result<Self, SourceError> {
        let find = |names: &[&str]| {
            header
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let need = |names: &[&str], column: &'static str| {
            find(names).ok_or(SourceError::MissingColumn { column })
        };
        Ok(Self {
            id: need(&["id", "voxel_id"], "id")?,
            x: need(&["x"], "x")?,
            y: need(&["y"], "y")?,
            z: need(&["z"], "z")?,
        })
    }

    fn width(&self) -> usize {
        self.id.max(self.x).max(self.y).max(self.z) + 1
    }
}

/// CSV cell source with a required header row.
///
/// Columns `id` (or `voxel_id`), `x`, `y` and `z` may appear in any order;
/// other columns are ignored. Quoted fields may span lines.
pub struct CsvCellSource<R> {
    reader: R,
    name: String,
    line: u64,
    failure: Option<SourceError>,
}

impl CsvCellSource<BufReader<File>> {
    /// Open the CSV file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::with_name(BufReader::new(file), path.display().to_string()))
    }
}

impl<R: BufRead> CsvCellSource<R> {
    /// Read CSV from `reader`.
    pub fn new(reader: R) -> Self {
        Self::with_name(reader, "csv stream".to_owned())
    }

    fn with_name(reader: R, name: String) -> Self {
        Self {
            reader,
            name,
            line: 0,
            failure: None,
        }
    }

    /// Read one logical record, joining physical lines while a quoted
    /// field is open. `Ok(None)` at end of input.
    ///
    /// A record with any non-UTF-8 line is still read to its end, so the
    /// rows after it stay aligned, and is then reported as unreadable.
    fn next_record(&mut self) -> io::Result<Option<(u64, Result<Vec<String>, String>)>> {
        let mut buf = String::new();
        let mut raw = Vec::new();
        let mut first_line = 0;
        let mut bad_encoding = false;
        loop {
            if !read_physical_line(&mut self.reader, &mut raw)? {
                if buf.is_empty() {
                    return Ok(None);
                }
                let reason = if bad_encoding {
                    NOT_UTF8.to_owned()
                } else {
                    SplitError::Unterminated.to_string()
                };
                return Ok(Some((first_line, Err(reason))));
            }
            self.line += 1;
            let text = match std::str::from_utf8(&raw) {
                Ok(text) => Cow::Borrowed(text),
                Err(_) => {
                    bad_encoding = true;
                    String::from_utf8_lossy(&raw)
                }
            };
            let trimmed = text.trim_end_matches(['\n', '\r']);
            if buf.is_empty() {
                if trimmed.trim().is_empty() {
                    continue;
                }
                first_line = self.line;
            } else {
                buf.push('\n');
            }
            buf.push_str(trimmed);
            match split_record(&buf) {
                Err(SplitError::Unterminated) => continue,
                _ if bad_encoding => return Ok(Some((first_line, Err(NOT_UTF8.to_owned())))),
                other => return Ok(Some((first_line, other.map_err(|e| e.to_string())))),
            }
        }
    }
}

fn parse_row(line: u64, fields: &[String], cols: Columns) -> Result<RawCellRecord, RecordError> {
    if fields.len() < cols.width() {
        return Err(RecordError::Malformed {
            line,
            reason: format!("expected at least {} fields, found {}", cols.width(), fields.len()),
        });
    }
    let coord = |idx: usize, axis: &str| {
        let raw = fields[idx].trim();
        raw.parse::<f64>().map_err(|_| RecordError::Malformed {
            line,
            reason: format!("{axis} value `{raw}` is not a number"),
        })
    };
    Ok(RawCellRecord::new(
        fields[cols.id].clone(),
        coord(cols.x, "x")?,
        coord(cols.y, "y")?,
        coord(cols.z, "z")?,
    ))
}

impl<R: BufRead> CellSource for CsvCellSource<R> {
    fn describe(&self) -> String {
        format!("csv {}", self.name)
    }

    fn records(&mut self) -> Result<RecordIter<'_>, SourceError> {
        let header = match self.next_record() {
            Ok(Some((_, Ok(fields)))) => fields,
            Ok(Some((_, Err(reason)))) => return Err(SourceError::BadHeader { reason }),
            // No header at all: an empty source.
            Ok(None) => return Ok(Box::new(std::iter::empty::<Result<RawCellRecord, RecordError>>())),
            Err(source) => return Err(SourceError::Read { line: self.line, source }),
        };
        let cols = Columns::from_header(&header)?;

        Ok(Box::new(std::iter::from_fn(move || {
            if self.failure.is_some() {
                return None;
            }
            match self.next_record() {
                Ok(None) => None,
                Ok(Some((line, Ok(fields)))) => Some(parse_row(line, &fields, cols)),
                Ok(Some((line, Err(reason)))) => Some(Err(RecordError::Malformed { line, reason })),
                Err(source) => {
                    self.failure = Some(SourceError::Read { line: self.line, source });
                    None
                }
            }
        })))
    }

    fn finish(&mut self) -> Result<(), SourceError> {
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// ── JSON Lines ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct JsonCell {
    #[serde(alias = "voxel_id")]
    id: Option<String>,
    x: f64,
    y: f64,
    z: f64,
}

/// One JSON object per line with `id`, `x`, `y` and `z` members.
///
/// Blank lines are skipped. Non-finite coordinates cannot be expressed in
/// JSON, so they surface as malformed lines.
pub struct JsonLinesCellSource<R> {
    reader: R,
    name: String,
    line: u64,
    failure: Option<SourceError>,
}

impl JsonLinesCellSource<BufReader<File>> {
    /// Open the JSON Lines file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            reader: BufReader::new(file),
            name: path.display().to_string(),
            line: 0,
            failure: None,
        })
    }
}

impl<R: BufRead> JsonLinesCellSource<R> {
    /// Read JSON Lines from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            name: "jsonl stream".to_owned(),
            line: 0,
            failure: None,
        }
    }
}

impl<R: BufRead> CellSource for JsonLinesCellSource<R> {
    fn describe(&self) -> String {
        format!("jsonl {}", self.name)
    }

    fn records(&mut self) -> Result<RecordIter<'_>, SourceError> {
        let mut raw = Vec::new();
        Ok(Box::new(std::iter::from_fn(move || loop {
            if self.failure.is_some() {
                return None;
            }
            match read_physical_line(&mut self.reader, &mut raw) {
                Ok(false) => return None,
                Ok(true) => {}
                Err(source) => {
                    self.failure = Some(SourceError::Read { line: self.line, source });
                    return None;
                }
            }
            self.line += 1;
            let line = self.line;
            let Ok(text) = std::str::from_utf8(&raw) else {
                return Some(Err(RecordError::Malformed {
                    line,
                    reason: NOT_UTF8.to_owned(),
                }));
            };
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            return Some(match serde_json::from_str::<JsonCell>(text) {
                Ok(cell) => Ok(RawCellRecord::new(cell.id.unwrap_or_default(), cell.x, cell.y, cell.z)),
                Err(e) => Err(RecordError::Malformed {
                    line,
                    reason: e.to_string(),
                }),
            });
        })))
    }

    fn finish(&mut self) -> Result<(), SourceError> {
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Open the file at `path` as a source of the given format.
pub fn open_source(path: &Path, format: InputFormat) -> Result<Box<dyn CellSource>, SourceError> {
    Ok(match format {
        InputFormat::Csv => Box::new(CsvCellSource::open(path)?),
        InputFormat::JsonLines => Box::new(JsonLinesCellSource::open(path)?),
    })
}
