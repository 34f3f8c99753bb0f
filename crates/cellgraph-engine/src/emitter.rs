//! Edge emission.
//!
//! [`EdgeSink`] streams resolved edges to any `Write` destination in CSV
//! or JSON Lines. It is generic over `W: Write` so tests can use `Vec<u8>`
//! and production code can use `BufWriter<File>`.
//!
//! The sink tracks two counters: edges handed to the writer, and edges
//! confirmed by a successful flush. Only the second survives a failure, so
//! [`EmitError::Write`] reports it.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use cellgraph_core::{CellIndex, CellRegistry, EdgeRecord, NeighborEdge};

use crate::config::{ConfigError, OutputFormat};
use crate::csv::escape_field;
use crate::digest::DigestWriter;

/// CSV header row, without the line terminator.
pub const CSV_HEADER: &str = "from_id,to_id,direction,distance";

/// Errors raised while writing edges.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// The destination rejected a write or flush.
    #[error("edge output failed after {edges_flushed} edges were flushed")]
    Write {
        /// Edges durably written before the failure.
        edges_flushed: u64,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// An edge referenced a cell outside the registry.
    #[error("edge {from} -> {to} references an unknown cell")]
    UnknownCell {
        /// Source index.
        from: CellIndex,
        /// Target index.
        to: CellIndex,
    },
}

/// Create `path` for writing, creating missing parent directories.
pub fn open_destination(path: &Path) -> Result<BufWriter<File>, ConfigError> {
    let unwritable = |source| ConfigError::Unwritable {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(unwritable)?;
    }
    let file = File::create(path).map_err(unwritable)?;
    Ok(BufWriter::new(file))
}

/// Streaming edge writer.
///
/// A file-backed sink wraps a `BufWriter`, which makes a best-effort flush
/// when dropped; use [`finish_durable`](EdgeSink::finish_durable) to flush,
/// sync and observe errors.
pub struct EdgeSink<W: Write> {
    out: DigestWriter<W>,
    format: OutputFormat,
    edges_written: u64,
    edges_flushed: u64,
}

impl<W: Write> EdgeSink<W> {
    /// Create a sink, writing the CSV header immediately when applicable.
    pub fn new(writer: W, format: OutputFormat) -> Result<Self, EmitError> {
        Self::start(writer, format).map_err(|source| EmitError::Write {
            edges_flushed: 0,
            source,
        })
    }

    fn start(writer: W, format: OutputFormat) -> io::Result<Self> {
        let mut sink = Self {
            out: DigestWriter::new(writer),
            format,
            edges_written: 0,
            edges_flushed: 0,
        };
        if format == OutputFormat::Csv {
            writeln!(sink.out, "{CSV_HEADER}")?;
        }
        Ok(sink)
    }

    /// Output encoding.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Edges handed to the writer so far.
    pub fn edges_written(&self) -> u64 {
        self.edges_written
    }

    /// Edges confirmed by the last successful flush.
    pub fn edges_flushed(&self) -> u64 {
        self.edges_flushed
    }

    /// FNV-1a digest of every byte written so far, header included.
    pub fn digest(&self) -> u64 {
        self.out.digest()
    }

    fn write_error(&self, source: io::Error) -> EmitError {
        EmitError::Write {
            edges_flushed: self.edges_flushed,
            source,
        }
    }

    /// Write one edge record.
    pub fn write_record(&mut self, record: &EdgeRecord<'_>) -> Result<(), EmitError> {
        let result = match self.format {
            OutputFormat::Csv => writeln!(
                self.out,
                "{},{},{},{:.3}",
                escape_field(record.from_id),
                escape_field(record.to_id),
                record.direction,
                record.distance
            ),
            OutputFormat::JsonLines => serde_json::to_writer(&mut self.out, record)
                .map_err(io::Error::from)
                .and_then(|()| self.out.write_all(b"\n")),
        };
        result.map_err(|e| self.write_error(e))?;
        self.edges_written += 1;
        Ok(())
    }

    /// Resolve and write `edges` against `registry`, then flush.
    pub fn write_batch(
        &mut self,
        registry: &CellRegistry,
        edges: &[NeighborEdge],
    ) -> Result<(), EmitError> {
        for edge in edges {
            let record = edge.resolve(registry).ok_or(EmitError::UnknownCell {
                from: edge.from,
                to: edge.to,
            })?;
            self.write_record(&record)?;
        }
        self.flush()
    }

    /// Flush buffered output to the destination.
    pub fn flush(&mut self) -> Result<(), EmitError> {
        self.out.flush().map_err(|e| self.write_error(e))?;
        self.edges_flushed = self.edges_written;
        Ok(())
    }

    /// Flush and return the destination.
    pub fn into_inner(mut self) -> Result<W, EmitError> {
        self.flush()?;
        Ok(self.out.into_inner())
    }
}

impl EdgeSink<BufWriter<File>> {
    /// Open a file-backed sink at `path`, creating parent directories.
    pub fn create(path: &Path, format: OutputFormat) -> Result<Self, ConfigError> {
        let writer = open_destination(path)?;
        Self::start(writer, format).map_err(|source| ConfigError::Unwritable {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Flush, then sync file contents to disk.
    pub fn finish_durable(mut self) -> Result<u64, EmitError> {
        self.flush()?;
        let edges = self.edges_flushed;
        self.out
            .get_mut()
            .get_ref()
            .sync_all()
            .map_err(|source| EmitError::Write {
                edges_flushed: edges,
                source,
            })?;
        Ok(edges)
    }
}
