//! The grid never misses a true neighbour.

use cellgraph_core::CellIndex;
use cellgraph_space::{BruteForceIndex, CandidateIndex, SpatialGrid};
use cellgraph_test_utils::{lattice, random_cloud, registry_of};
use proptest::prelude::*;
use std::collections::HashSet;

fn check_superset(records: Vec<cellgraph_core::RawCellRecord>, threshold: f64) {
    let registry = registry_of(records);
    let positions = registry.positions();
    let grid = SpatialGrid::build(positions, threshold).unwrap();
    let brute = BruteForceIndex::new(positions.len());

    let mut buf = Vec::new();
    for i in 0..positions.len() as u32 {
        let a = CellIndex(i);

        buf.clear();
        grid.query_candidates(a, &mut buf);
        let candidates: HashSet<CellIndex> = buf.iter().copied().collect();
        assert_eq!(candidates.len(), buf.len(), "duplicate candidate for {a}");
        assert!(!candidates.contains(&a), "self candidate for {a}");

        buf.clear();
        brute.query_candidates(a, &mut buf);
        for &b in &buf {
            if positions[a.get()].distance(&positions[b.get()]) <= threshold {
                assert!(candidates.contains(&b), "grid missed {a} -> {b}");
            }
        }
    }
}

#[test]
fn lattice_face_neighbours_at_exact_threshold() {
    check_superset(lattice(6, 5, 4, 1.5), 1.5);
}

#[test]
fn lattice_with_diagonals() {
    check_superset(lattice(5, 5, 5, 1.0), 1.8);
}

#[test]
fn negative_and_offset_lattice() {
    let records = lattice(4, 4, 4, 0.75)
        .into_iter()
        .map(|mut r| {
            r.x -= 1.6;
            r.y -= 7.1;
            r.z += 0.3;
            r
        })
        .collect();
    check_superset(records, 0.75);
}

#[test]
fn candidate_order_is_stable() {
    let registry = registry_of(random_cloud(200, 5.0, 11));
    let grid = SpatialGrid::build(registry.positions(), 1.5).unwrap();
    for i in 0..200u32 {
        let mut a = Vec::new();
        let mut b = Vec::new();
        grid.query_candidates(CellIndex(i), &mut a);
        grid.query_candidates(CellIndex(i), &mut b);
        assert_eq!(a, b);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_clouds(count in 0usize..150, extent in 0.5f64..12.0, threshold in 0.1f64..4.0, seed in any::<u64>()) {
        check_superset(random_cloud(count, extent, seed), threshold);
    }
}
