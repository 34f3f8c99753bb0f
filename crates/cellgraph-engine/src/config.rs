//! Run configuration, validation, and error types.
//!
//! [`RunConfig`] is deserialised from TOML (every field optional, with
//! defaults) and then overridden field by field from the command line.
//! [`validate()`](RunConfig::validate) runs before any input is read, so a
//! bad threshold or batch size fails fast.

use std::io;
use std::path::{Path, PathBuf};

use cellgraph_core::{DuplicatePolicy, DEFAULT_ADJACENCY_THRESHOLD};
use serde::{Deserialize, Serialize};

/// Upper bound on evaluation worker threads.
pub const MAX_WORKERS: usize = 64;

/// Default cells per work batch.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

// ── Formats and modes ─────────────────────────────────────────────

/// Encoding of the cell input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputFormat {
    /// Comma-separated values with a header row.
    #[default]
    #[serde(rename = "csv")]
    Csv,
    /// One JSON object per line.
    #[serde(rename = "jsonl")]
    JsonLines,
}

/// Encoding of the edge output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// `from_id,to_id,direction,distance` with a header row.
    #[default]
    #[serde(rename = "csv")]
    Csv,
    /// One JSON object per edge.
    #[serde(rename = "jsonl")]
    JsonLines,
}

/// `true` if `path` has a `.jsonl` or `.ndjson` extension.
fn has_jsonl_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jsonl") || e.eq_ignore_ascii_case("ndjson"))
}

impl InputFormat {
    /// Guess the format from a file extension; CSV unless `.jsonl`/`.ndjson`.
    pub fn from_path(path: &Path) -> Self {
        if has_jsonl_extension(path) {
            Self::JsonLines
        } else {
            Self::Csv
        }
    }
}

impl OutputFormat {
    /// Guess the format from a file extension; CSV unless `.jsonl`/`.ndjson`.
    pub fn from_path(path: &Path) -> Self {
        if has_jsonl_extension(path) {
            Self::JsonLines
        } else {
            Self::Csv
        }
    }
}

/// Order in which edges are emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeOrder {
    /// Source cells in registration order, then targets in registration
    /// order.
    #[default]
    Registration,
    /// Lexicographic by `(from_id, to_id)`. Buffers every edge before
    /// writing.
    ById,
}

/// Candidate index backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Uniform grid sized to the threshold.
    #[default]
    Grid,
    /// Every pair; reference backend.
    BruteForce,
}

// ── Input / output ────────────────────────────────────────────────

/// Where cells are read from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    /// File path.
    pub path: PathBuf,
    /// Encoding; guessed from the extension when absent.
    #[serde(default)]
    pub format: Option<InputFormat>,
}

impl InputConfig {
    /// Input at `path` with the format guessed from its extension.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
        }
    }

    /// The explicit format, or the one implied by the extension.
    pub fn resolved_format(&self) -> InputFormat {
        self.format.unwrap_or_else(|| InputFormat::from_path(&self.path))
    }
}

/// Where edges are written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// File path; parent directories are created as needed.
    pub path: PathBuf,
    /// Encoding; guessed from the extension when absent.
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

impl OutputConfig {
    /// Output at `path` with the format guessed from its extension.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
        }
    }

    /// The explicit format, or the one implied by the extension.
    pub fn resolved_format(&self) -> OutputFormat {
        self.format.unwrap_or_else(|| OutputFormat::from_path(&self.path))
    }
}

// ── ConfigError ───────────────────────────────────────────────────

/// Errors detected while loading or validating a [`RunConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The threshold is NaN, infinite, zero, or negative.
    #[error("adjacency_threshold must be finite and positive, got {value}")]
    InvalidThreshold {
        /// The rejected value.
        value: f64,
    },
    /// `batch_size` is zero.
    #[error("batch_size must be at least 1")]
    ZeroBatchSize,
    /// No input was configured.
    #[error("no input configured")]
    MissingInput,
    /// No output was configured.
    #[error("no output configured")]
    MissingOutput,
    /// The configuration file could not be read.
    #[error("cannot read config file {path}")]
    Read {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The configuration file is not valid TOML for [`RunConfig`].
    #[error("invalid config")]
    Parse(#[from] toml::de::Error),
    /// The output destination could not be created.
    #[error("cannot create output {path}")]
    Unwritable {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

// ── RunConfig ─────────────────────────────────────────────────────

/// Everything one adjacency run needs to know.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Maximum centroid distance for two cells to be neighbours. Default: 1.5.
    pub adjacency_threshold: f64,
    /// Cell input. Required by [`run`](crate::run), unused by
    /// [`run_with`](crate::run_with).
    pub input: Option<InputConfig>,
    /// Edge output. Required by [`run`](crate::run), unused by
    /// [`run_with`](crate::run_with).
    pub output: Option<OutputConfig>,
    /// What to do when an id repeats. Default: last write wins.
    pub duplicate_policy: DuplicatePolicy,
    /// Emission order. Default: registration order.
    pub edge_order: EdgeOrder,
    /// Worker threads. `None` = auto-detect (`available_parallelism`).
    /// Values are clamped to `[1, 64]`.
    pub workers: Option<usize>,
    /// Cells per work batch. Default: 1024.
    pub batch_size: usize,
    /// Candidate index backend. Default: grid.
    pub index: IndexKind,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            adjacency_threshold: DEFAULT_ADJACENCY_THRESHOLD,
            input: None,
            output: None,
            duplicate_policy: DuplicatePolicy::default(),
            edge_order: EdgeOrder::default(),
            workers: None,
            batch_size: DEFAULT_BATCH_SIZE,
            index: IndexKind::default(),
        }
    }
}

impl RunConfig {
    /// Parse a TOML document. Absent fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check structural invariants. Input and output presence is checked
    /// separately by [`run`](crate::run).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.adjacency_threshold;
        if !(t.is_finite() && t > 0.0) {
            return Err(ConfigError::InvalidThreshold { value: t });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }

    /// Resolve the actual worker count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to `[1, 64]`.
    pub fn resolved_workers(&self) -> usize {
        match self.workers {
            Some(n) => n.clamp(1, MAX_WORKERS),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .clamp(1, MAX_WORKERS),
        }
    }
}
