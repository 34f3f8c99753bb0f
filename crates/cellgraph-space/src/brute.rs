//! Exhaustive reference index.

use crate::index::CandidateIndex;
use cellgraph_core::CellIndex;

/// Index in which every other cell is a candidate.
///
/// Quadratic overall. Used to cross-check [`SpatialGrid`](crate::SpatialGrid)
/// and for inputs too small for bucketing to pay off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BruteForceIndex {
    len: u32,
}

impl BruteForceIndex {
    /// Index over `len` cells.
    pub fn new(len: usize) -> Self {
        Self {
            len: u32::try_from(len).unwrap_or(u32::MAX),
        }
    }
}

impl CandidateIndex for BruteForceIndex {
    fn name(&self) -> &'static str {
        "brute_force"
    }

    fn len(&self) -> usize {
        self.len as usize
    }

    fn query_candidates(&self, cell: CellIndex, out: &mut Vec<CellIndex>) {
        if cell.0 >= self.len {
            return;
        }
        out.extend((0..self.len).filter(|&i| i != cell.0).map(CellIndex));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_all_others_in_order() {
        let idx = BruteForceIndex::new(4);
        let mut out = Vec::new();
        idx.query_candidates(CellIndex(2), &mut out);
        assert_eq!(out, vec![CellIndex(0), CellIndex(1), CellIndex(3)]);
    }

    #[test]
    fn appends_without_clearing() {
        let idx = BruteForceIndex::new(2);
        let mut out = vec![CellIndex(9)];
        idx.query_candidates(CellIndex(0), &mut out);
        assert_eq!(out, vec![CellIndex(9), CellIndex(1)]);
    }

    #[test]
    fn out_of_range_and_empty() {
        let idx = BruteForceIndex::new(0);
        assert!(idx.is_empty());
        let mut out = Vec::new();
        idx.query_candidates(CellIndex(0), &mut out);
        assert!(out.is_empty());
        BruteForceIndex::new(3).query_candidates(CellIndex(3), &mut out);
        assert!(out.is_empty());
    }
}
