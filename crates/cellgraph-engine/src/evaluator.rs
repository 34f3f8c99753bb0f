//! Exact-distance neighbour evaluation.
//!
//! For each cell A the [`Evaluator`] asks the candidate index for nearby
//! cells, measures each candidate B exactly and keeps those within the
//! threshold. A→B and B→A are measured independently and each yields its
//! own directed edge.

use std::ops::Range;

use cellgraph_core::{CellIndex, CellRegistry, Direction, NeighborEdge};
use cellgraph_space::CandidateIndex;

/// Counters accumulated while evaluating cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalStats {
    /// Cells whose neighbours were evaluated.
    pub cells: u64,
    /// Candidate pairs measured exactly.
    pub candidate_pairs: u64,
    /// Accepted pairs at distance zero.
    pub coincident_pairs: u64,
    /// Accepted edges per direction, indexed by [`Direction::ordinal`].
    pub direction_counts: [u64; 7],
}

impl EvalStats {
    /// Fold `other` into `self`.
    pub fn merge(&mut self, other: &EvalStats) {
        self.cells += other.cells;
        self.candidate_pairs += other.candidate_pairs;
        self.coincident_pairs += other.coincident_pairs;
        for (a, b) in self.direction_counts.iter_mut().zip(other.direction_counts) {
            *a += b;
        }
    }

    /// Total accepted edges.
    pub fn edges(&self) -> u64 {
        self.direction_counts.iter().sum()
    }
}

/// Neighbour evaluator over a registry and a candidate index built from
/// the same registry.
///
/// Shared by reference across workers.
pub struct Evaluator<'a> {
    registry: &'a CellRegistry,
    index: &'a dyn CandidateIndex,
    threshold: f64,
}

impl<'a> Evaluator<'a> {
    /// Evaluate against `index` with inclusive distance `threshold`.
    pub fn new(registry: &'a CellRegistry, index: &'a dyn CandidateIndex, threshold: f64) -> Self {
        debug_assert_eq!(registry.len(), index.len());
        Self {
            registry,
            index,
            threshold,
        }
    }

    /// The registry being evaluated.
    pub fn registry(&self) -> &'a CellRegistry {
        self.registry
    }

    /// Append the outgoing edges of `a` to `out`, targets in registration
    /// order.
    ///
    /// `scratch` is a reusable candidate buffer.
    pub fn neighbours_of(
        &self,
        a: CellIndex,
        scratch: &mut Vec<CellIndex>,
        out: &mut Vec<NeighborEdge>,
        stats: &mut EvalStats,
    ) {
        let Some(pa) = self.registry.position(a) else {
            return;
        };
        scratch.clear();
        self.index.query_candidates(a, scratch);
        scratch.sort_unstable();
        stats.cells += 1;

        for &b in scratch.iter() {
            let Some(pb) = self.registry.position(b) else {
                continue;
            };
            stats.candidate_pairs += 1;
            let d = pb - pa;
            let distance = d.length();
            if distance > self.threshold {
                continue;
            }
            let direction = Direction::classify(d.dx, d.dy, d.dz, distance);
            if direction == Direction::Same {
                stats.coincident_pairs += 1;
                tracing::debug!(from = %a, to = %b, "coincident cells");
            }
            stats.direction_counts[direction.ordinal()] += 1;
            out.push(NeighborEdge {
                from: a,
                to: b,
                direction,
                distance,
            });
        }
    }

    /// Evaluate every cell whose index lies in `cells`.
    pub fn evaluate_range(&self, cells: Range<usize>) -> (Vec<NeighborEdge>, EvalStats) {
        let mut edges = Vec::new();
        let mut stats = EvalStats::default();
        let mut scratch = Vec::new();
        let end = cells.end.min(self.registry.len());
        for i in cells.start..end {
            self.neighbours_of(CellIndex(i as u32), &mut scratch, &mut edges, &mut stats);
        }
        (edges, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgraph_space::{BruteForceIndex, SpatialGrid};
    use cellgraph_test_utils::{
        brute_force_edges, random_cloud, registry_of, scenario_coincident, scenario_line,
    };
    use proptest::prelude::*;

    fn evaluate_all(registry: &CellRegistry, index: &dyn CandidateIndex, t: f64) -> (Vec<NeighborEdge>, EvalStats) {
        Evaluator::new(registry, index, t).evaluate_range(0..registry.len())
    }

    #[test]
    fn line_scenario_edges() {
        let reg = registry_of(scenario_line());
        let grid = SpatialGrid::build(reg.positions(), 1.5).unwrap();
        let (edges, stats) = evaluate_all(&reg, &grid, 1.5);
        assert_eq!(edges.len(), 2);
        assert_eq!((edges[0].from, edges[0].to), (CellIndex(0), CellIndex(1)));
        assert_eq!(edges[0].direction, Direction::East);
        assert_eq!(edges[1].direction, Direction::West);
        assert_eq!(stats.cells, 3);
        assert_eq!(stats.edges(), 2);
        assert_eq!(stats.direction_counts[Direction::East.ordinal()], 1);
    }

    #[test]
    fn coincident_cells_are_same() {
        let reg = registry_of(scenario_coincident());
        let idx = BruteForceIndex::new(reg.len());
        let (edges, stats) = evaluate_all(&reg, &idx, 1.5);
        assert_eq!(stats.coincident_pairs, 2);
        assert!(edges
            .iter()
            .filter(|e| e.distance == 0.0)
            .all(|e| e.direction == Direction::Same));
        assert_eq!(edges.len(), 6);
    }

    #[test]
    fn ranges_concatenate_to_whole() {
        let reg = registry_of(random_cloud(120, 4.0, 3));
        let grid = SpatialGrid::build(reg.positions(), 1.2).unwrap();
        let ev = Evaluator::new(&reg, &grid, 1.2);
        let (whole, whole_stats) = ev.evaluate_range(0..120);
        let mut parts = Vec::new();
        let mut stats = EvalStats::default();
        for start in (0..120).step_by(17) {
            let (e, s) = ev.evaluate_range(start..start + 17);
            parts.extend(e);
            stats.merge(&s);
        }
        assert_eq!(parts, whole);
        assert_eq!(stats, whole_stats);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn grid_matches_brute_force_reference(count in 0usize..120, extent in 0.5f64..8.0, t in 0.2f64..3.0, seed in any::<u64>()) {
            let reg = registry_of(random_cloud(count, extent, seed));
            let grid = SpatialGrid::build(reg.positions(), t).unwrap();
            let (edges, _) = evaluate_all(&reg, &grid, t);
            prop_assert_eq!(edges, brute_force_edges(&reg, t));
        }

        #[test]
        fn every_edge_has_its_reverse(count in 0usize..80, seed in any::<u64>()) {
            let reg = registry_of(random_cloud(count, 3.0, seed));
            let grid = SpatialGrid::build(reg.positions(), 1.5).unwrap();
            let (edges, _) = evaluate_all(&reg, &grid, 1.5);
            for e in &edges {
                prop_assert!(e.from != e.to);
                prop_assert!(edges.contains(&e.reversed()));
            }
        }
    }
}
