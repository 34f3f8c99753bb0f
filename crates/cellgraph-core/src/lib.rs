//! Core types for the cellgraph adjacency builder.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! data model shared by every other crate in the workspace: cell identity
//! and position, the [`CellRegistry`] that validates and owns one run's
//! cells, the six-way [`Direction`] classifier, and the directed
//! [`NeighborEdge`] produced for every admitted pair.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cell;
pub mod direction;
pub mod edge;
pub mod error;
pub mod registry;

pub use cell::{CellId, CellIndex, Displacement, Position};
pub use direction::{Direction, VERTICAL_DOMINANCE};
pub use edge::{round_distance, EdgeRecord, NeighborEdge, DISTANCE_DECIMALS};
pub use error::{RecordError, RegistryError};
pub use registry::{CellRegistry, DuplicatePolicy, IngestReport, RawCellRecord, RegistryBuilder};

/// Default adjacency threshold, in model units.
pub const DEFAULT_ADJACENCY_THRESHOLD: f64 = 1.5;
