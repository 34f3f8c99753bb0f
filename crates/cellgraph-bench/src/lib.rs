//! Benchmark profiles for cellgraph.
//!
//! - [`voxel_block`]: dense lattice at unit spacing, the shape of a
//!   voxelised building model.
//! - [`scattered_profile`]: seeded uniform cloud at roughly the same
//!   density.
//! - [`bench_config`]: run configuration used by the pipeline benches.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cellgraph_core::{CellRegistry, RawCellRecord};
use cellgraph_engine::RunConfig;
use cellgraph_test_utils::{lattice, random_cloud};

/// `side * side * layers` lattice at unit spacing.
pub fn voxel_block(side: usize, layers: usize) -> Vec<RawCellRecord> {
    lattice(side, side, layers, 1.0)
}

/// `count` cells scattered uniformly at about one cell per unit volume.
pub fn scattered_profile(count: usize, seed: u64) -> Vec<RawCellRecord> {
    let extent = (count as f64).cbrt() / 2.0;
    random_cloud(count, extent, seed)
}

/// Registry over `records`, default duplicate policy.
pub fn registry(records: Vec<RawCellRecord>) -> CellRegistry {
    cellgraph_test_utils::registry_of(records)
}

/// Default configuration with `workers` threads.
pub fn bench_config(workers: usize) -> RunConfig {
    RunConfig {
        workers: Some(workers),
        ..RunConfig::default()
    }
}
