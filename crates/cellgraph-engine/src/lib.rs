//! Batch adjacency runs for cellgraph.
//!
//! A run reads raw cell records from a [`CellSource`], registers them,
//! builds a candidate index, evaluates neighbours on a worker pool and
//! streams the directed edges to an [`EdgeSink`]:
//!
//! ```text
//! CellSource ─► CellRegistry ─► CandidateIndex ─► workers ─► writer ─► EdgeSink
//! ```
//!
//! The registry and index are built on the calling thread and shared
//! read-only. Workers evaluate batches of consecutive cells; the calling
//! thread restores batch order and is the only writer, so output is
//! byte-identical across runs and worker counts.
//!
//! Use [`run`] for file-to-file runs driven by a [`RunConfig`], or
//! [`run_with`] to supply the source and sink directly.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
mod csv;
pub mod digest;
pub mod emitter;
pub mod error;
pub mod evaluator;
pub mod run;
pub mod source;
pub mod summary;
pub mod worker;

pub use config::{
    ConfigError, EdgeOrder, IndexKind, InputConfig, InputFormat, OutputConfig, OutputFormat,
    RunConfig,
};
pub use digest::Fnv1a;
pub use emitter::{open_destination, EdgeSink, EmitError, CSV_HEADER};
pub use error::{RunError, RunErrorKind};
pub use evaluator::{EvalStats, Evaluator};
pub use run::{run, run_with};
pub use source::{
    open_source, CellSource, CsvCellSource, JsonLinesCellSource, RecordIter, SourceError,
    VecSource,
};
pub use summary::{Progress, RunSummary, Stage};
pub use worker::AbortSignal;
