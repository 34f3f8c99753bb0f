//! cellgraph: a spatial adjacency graph builder for large 3D cell sets.
//!
//! Given cells identified by id and centroid, cellgraph emits a directed
//! edge A→B for every pair of distinct cells whose centroids lie within an
//! adjacency threshold, labelled with a coarse direction (above, below,
//! east, west, north, south) and the rounded distance.
//!
//! This is the facade crate that re-exports the public API of the
//! sub-crates, and it also ships the `cellgraph` command-line tool.
//!
//! # Quick start
//!
//! ```rust
//! use cellgraph::prelude::*;
//!
//! let cells = vec![
//!     RawCellRecord::new("A", 0.0, 0.0, 0.0),
//!     RawCellRecord::new("B", 1.0, 0.0, 0.0),
//!     RawCellRecord::new("C", 0.0, 0.0, 5.0),
//! ];
//! let mut sink = EdgeSink::new(Vec::new(), OutputFormat::Csv).unwrap();
//! let summary = run_with(
//!     &RunConfig::default(),
//!     &mut VecSource::new(cells),
//!     &mut sink,
//!     &AbortSignal::new(),
//! )
//! .unwrap();
//! assert_eq!(summary.edges_emitted, 2);
//!
//! let csv = String::from_utf8(sink.into_inner().unwrap()).unwrap();
//! assert_eq!(
//!     csv,
//!     "from_id,to_id,direction,distance\nA,B,east,1.000\nB,A,west,1.000\n"
//! );
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cellgraph-core` | Ids, positions, directions, edges, the cell registry |
//! | [`space`] | `cellgraph-space` | Candidate index trait, grid and brute-force backends |
//! | [`engine`] | `cellgraph-engine` | Configuration, sources, evaluation, emission, runs |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types (`cellgraph-core`).
///
/// Contains [`types::CellId`], [`types::Position`], the direction
/// classifier [`types::Direction`] and the [`types::CellRegistry`].
pub use cellgraph_core as types;

/// Candidate indexes (`cellgraph-space`).
///
/// [`space::SpatialGrid`] for real inputs, [`space::BruteForceIndex`] as
/// the exhaustive reference.
pub use cellgraph_space as space;

/// Adjacency runs (`cellgraph-engine`).
///
/// [`engine::run`] for configured file-to-file runs, [`engine::run_with`]
/// for caller-supplied sources and sinks.
pub use cellgraph_engine as engine;

/// Common imports for typical cellgraph usage.
pub mod prelude {
    // Core types
    pub use cellgraph_core::{
        CellId, CellIndex, CellRegistry, Direction, DuplicatePolicy, EdgeRecord, NeighborEdge,
        Position, RawCellRecord,
    };

    // Space
    pub use cellgraph_space::{CandidateIndex, SpatialGrid};

    // Engine
    pub use cellgraph_engine::{
        run, run_with, AbortSignal, CellSource, EdgeOrder, EdgeSink, InputConfig, OutputConfig,
        OutputFormat, RunConfig, RunError, RunSummary, VecSource,
    };
}
