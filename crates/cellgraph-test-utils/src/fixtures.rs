//! Reusable cell-set fixtures.
//!
//! Every generator is deterministic: the same arguments always produce the
//! same records in the same order.

use cellgraph_core::{CellRegistry, RawCellRecord};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A(0,0,0), B(1,0,0), C(0,0,5). At threshold 1.5 only A and B are linked.
pub fn scenario_line() -> Vec<RawCellRecord> {
    vec![
        RawCellRecord::new("A", 0.0, 0.0, 0.0),
        RawCellRecord::new("B", 1.0, 0.0, 0.0),
        RawCellRecord::new("C", 0.0, 0.0, 5.0),
    ]
}

/// A(0,0,0), B(0,0,1): a vertical pair.
pub fn scenario_vertical() -> Vec<RawCellRecord> {
    vec![
        RawCellRecord::new("A", 0.0, 0.0, 0.0),
        RawCellRecord::new("B", 0.0, 0.0, 1.0),
    ]
}

/// One isolated cell.
pub fn scenario_single() -> Vec<RawCellRecord> {
    vec![RawCellRecord::new("solo", 3.0, -2.0, 7.5)]
}

/// No cells at all.
pub fn scenario_empty() -> Vec<RawCellRecord> {
    Vec::new()
}

/// Two distinct ids at the same position, plus a third cell nearby.
pub fn scenario_coincident() -> Vec<RawCellRecord> {
    vec![
        RawCellRecord::new("P", 1.0, 1.0, 1.0),
        RawCellRecord::new("Q", 1.0, 1.0, 1.0),
        RawCellRecord::new("R", 2.0, 1.0, 1.0),
    ]
}

/// Regular `nx * ny * nz` lattice with the given spacing, x fastest.
///
/// Ids are `v{x}_{y}_{z}`.
pub fn lattice(nx: usize, ny: usize, nz: usize, spacing: f64) -> Vec<RawCellRecord> {
    let mut out = Vec::with_capacity(nx * ny * nz);
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                out.push(RawCellRecord::new(
                    format!("v{x}_{y}_{z}"),
                    x as f64 * spacing,
                    y as f64 * spacing,
                    z as f64 * spacing,
                ));
            }
        }
    }
    out
}

/// `count` points uniformly distributed in the cube `[-extent, extent)^3`,
/// seeded for reproducibility. Ids are `c{i}`.
pub fn random_cloud(count: usize, extent: f64, seed: u64) -> Vec<RawCellRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut coord = move || unit(rng.next_u64()) * 2.0 * extent - extent;
    (0..count)
        .map(|i| {
            let x = coord();
            let y = coord();
            let z = coord();
            RawCellRecord::new(format!("c{i}"), x, y, z)
        })
        .collect()
}

/// Map the top 53 bits of `bits` to `[0, 1)`.
fn unit(bits: u64) -> f64 {
    (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Ingest `records` with the default policy, panicking on failure.
pub fn registry_of(records: Vec<RawCellRecord>) -> CellRegistry {
    CellRegistry::ingest(records)
        .expect("fixture records ingest cleanly")
        .0
}
