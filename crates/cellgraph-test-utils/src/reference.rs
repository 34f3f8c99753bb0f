//! Exhaustive reference neighbour search.
//!
//! Compares every ordered pair directly, with no index. Output order is the
//! plain nested loop: source cells in registration order, targets in
//! registration order. Optimised paths must agree with it exactly.

use std::collections::BTreeSet;

use cellgraph_core::{CellRegistry, Direction, NeighborEdge};

/// Every directed edge within `threshold`, by exhaustive comparison.
pub fn brute_force_edges(registry: &CellRegistry, threshold: f64) -> Vec<NeighborEdge> {
    let mut edges = Vec::new();
    for (a, _, pa) in registry.iter() {
        for (b, _, pb) in registry.iter() {
            if a == b {
                continue;
            }
            let d = pb - pa;
            let distance = d.length();
            if distance <= threshold {
                edges.push(NeighborEdge {
                    from: a,
                    to: b,
                    direction: Direction::classify(d.dx, d.dy, d.dz, distance),
                    distance,
                });
            }
        }
    }
    edges
}

/// Id-level identity of an emitted edge: ids, label and the distance as
/// written (three decimals).
pub type EdgeKey = (String, String, Direction, String);

/// Resolve `edges` into a set of [`EdgeKey`]s.
pub fn edge_key_set(registry: &CellRegistry, edges: &[NeighborEdge]) -> BTreeSet<EdgeKey> {
    edges
        .iter()
        .filter_map(|e| e.resolve(registry))
        .map(|r| {
            (
                r.from_id.to_owned(),
                r.to_id.to_owned(),
                r.direction,
                format!("{:.3}", r.distance),
            )
        })
        .collect()
}
