//! Test fixtures and reference implementations for cellgraph development.
//!
//! - [`fixtures`]: small named scenarios, regular lattices and seeded
//!   random point clouds as [`RawCellRecord`] lists.
//! - [`reference`]: the exhaustive neighbour search every optimised path
//!   is checked against.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod reference;

pub use cellgraph_core::RawCellRecord;
pub use fixtures::{
    lattice, random_cloud, registry_of, scenario_coincident, scenario_empty, scenario_line,
    scenario_single, scenario_vertical,
};
pub use reference::{brute_force_edges, edge_key_set, EdgeKey};
