//! The `CandidateIndex` trait.

use cellgraph_core::CellIndex;

/// Source of neighbour candidates for the evaluator.
///
/// # Contract
///
/// For a cell `a`, [`query_candidates`](Self::query_candidates) must yield
/// every cell `b != a` whose distance to `a` is at most the radius the
/// index was built for. It may yield extra cells; it must never yield `a`
/// itself, and it must never yield the same cell twice for one query.
///
/// The order of candidates is backend-defined but deterministic: two
/// queries for the same cell return the same sequence.
///
/// # Thread Safety
///
/// `Sync` is required because evaluation workers query one shared index
/// concurrently.
pub trait CandidateIndex: Send + Sync {
    /// Short backend name for logs and summaries.
    fn name(&self) -> &'static str;

    /// Number of indexed cells.
    fn len(&self) -> usize;

    /// `true` if no cells are indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append the candidates for `cell` to `out`.
    ///
    /// `out` is not cleared, so callers can reuse one buffer across
    /// queries. Out-of-range `cell` indices yield nothing.
    fn query_candidates(&self, cell: CellIndex, out: &mut Vec<CellIndex>);
}
