//! Spatial candidate indexes for threshold neighbour search.
//!
//! This crate defines the [`CandidateIndex`] trait, the seam between the
//! cell registry and the neighbour evaluator, along with two backends:
//!
//! - [`SpatialGrid`]: uniform grid of cubic buckets sized to the adjacency
//!   threshold. A query visits the cell's own bucket and its 26 neighbours,
//!   so per-cell work is bounded by local density instead of the total
//!   cell count.
//! - [`BruteForceIndex`]: every other cell is a candidate. Quadratic, kept
//!   as the reference backend for verification and tiny inputs.
//!
//! Both backends only over-approximate; the evaluator filters candidates by
//! exact distance.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod brute;
pub mod error;
pub mod grid;
pub mod index;

pub use brute::BruteForceIndex;
pub use error::GridError;
pub use grid::{BucketKey, GridStats, SpatialGrid, NEIGHBOUR_OFFSETS};
pub use index::CandidateIndex;
