//! Run summary, stages and progress.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use cellgraph_core::Direction;
use serde::{Serialize, Serializer};

use crate::evaluator::EvalStats;

/// Pipeline stage, reported with fatal errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Configuration validation and opening input and output.
    Configure,
    /// Reading and registering cells.
    Ingest,
    /// Building the candidate index.
    Index,
    /// Neighbour evaluation.
    Evaluate,
    /// Writing edges.
    Emit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configure => "configure",
            Self::Ingest => "ingest",
            Self::Index => "index",
            Self::Evaluate => "evaluate",
            Self::Emit => "emit",
        })
    }
}

/// How far a run got.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Cells whose edges reached the writer.
    pub cells_evaluated: u64,
    /// Edges durably flushed to the output.
    pub edges_flushed: u64,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cells evaluated, {} edges flushed",
            self.cells_evaluated, self.edges_flushed
        )
    }
}

/// Outcome of a completed (or cleanly aborted) run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    /// Cells whose neighbours were evaluated and written. Equals the
    /// registered cell count unless the run was aborted, in which case it is
    /// the delivered prefix.
    pub cells_processed: u64,
    /// Directed edges written.
    pub edges_emitted: u64,
    /// `edges_emitted / cells_processed`, 0 for an empty run.
    pub average_edges_per_cell: f64,
    /// Input records skipped as invalid.
    pub skipped_records: u64,
    /// Input records whose id repeated an earlier one.
    pub duplicate_ids: u64,
    /// Candidate pairs measured exactly.
    pub candidate_pairs: u64,
    /// Emitted edges between coincident cells.
    pub coincident_pairs: u64,
    /// Emitted edges per direction label.
    pub direction_counts: BTreeMap<Direction, u64>,
    /// `true` if an abort signal cut evaluation short.
    pub aborted: bool,
    /// FNV-1a digest of the emitted bytes.
    #[serde(serialize_with = "hex_u64")]
    pub output_digest: u64,
    /// Wall-clock run time.
    #[serde(rename = "elapsed_secs", serialize_with = "secs_f64")]
    pub elapsed: Duration,
}

fn hex_u64<S: Serializer>(v: &u64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{v:016x}"))
}

fn secs_f64<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Non-zero per-direction counts from evaluator statistics.
pub(crate) fn direction_histogram(stats: &EvalStats) -> BTreeMap<Direction, u64> {
    Direction::ALL
        .iter()
        .map(|&d| (d, stats.direction_counts[d.ordinal()]))
        .filter(|&(_, n)| n > 0)
        .collect()
}

/// `edges / cells`, or 0 when there are no cells.
pub(crate) fn average(edges: u64, cells: u64) -> f64 {
    if cells == 0 {
        0.0
    } else {
        edges as f64 / cells as f64
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cells processed:    {}", self.cells_processed)?;
        writeln!(f, "edges emitted:      {}", self.edges_emitted)?;
        writeln!(f, "avg edges per cell: {:.2}", self.average_edges_per_cell)?;
        writeln!(f, "skipped records:    {}", self.skipped_records)?;
        writeln!(f, "duplicate ids:      {}", self.duplicate_ids)?;
        writeln!(f, "candidate pairs:    {}", self.candidate_pairs)?;
        if self.coincident_pairs > 0 {
            writeln!(f, "coincident pairs:   {}", self.coincident_pairs)?;
        }
        if !self.direction_counts.is_empty() {
            let parts: Vec<String> = self
                .direction_counts
                .iter()
                .map(|(d, n)| format!("{d}={n}"))
                .collect();
            writeln!(f, "directions:         {}", parts.join(" "))?;
        }
        if self.aborted {
            writeln!(f, "aborted:            yes")?;
        }
        writeln!(f, "output digest:      {:016x}", self.output_digest)?;
        write!(f, "elapsed:            {:.3}s", self.elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunSummary {
        let mut direction_counts = BTreeMap::new();
        direction_counts.insert(Direction::East, 1);
        direction_counts.insert(Direction::West, 1);
        RunSummary {
            cells_processed: 3,
            edges_emitted: 2,
            average_edges_per_cell: average(2, 3),
            skipped_records: 0,
            duplicate_ids: 0,
            candidate_pairs: 2,
            coincident_pairs: 0,
            direction_counts,
            aborted: false,
            output_digest: 0xab,
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn average_handles_empty() {
        assert_eq!(average(0, 0), 0.0);
        assert_eq!(average(6, 3), 2.0);
    }

    #[test]
    fn histogram_skips_zero() {
        let mut stats = EvalStats::default();
        stats.direction_counts[Direction::North.ordinal()] = 4;
        let h = direction_histogram(&stats);
        assert_eq!(h.len(), 1);
        assert_eq!(h[&Direction::North], 4);
    }

    #[test]
    fn json_shape() {
        let v = serde_json::to_value(sample()).unwrap();
        assert_eq!(v["cells_processed"], 3);
        assert_eq!(v["direction_counts"]["east"], 1);
        assert_eq!(v["output_digest"], "00000000000000ab");
        assert_eq!(v["elapsed_secs"], 1.5);
    }

    #[test]
    fn text_mentions_counts() {
        let text = sample().to_string();
        assert!(text.contains("edges emitted:      2"));
        assert!(text.contains("east=1 west=1"));
        assert!(!text.contains("aborted"));
    }

    #[test]
    fn stage_and_progress_display() {
        let p = Progress {
            cells_evaluated: 10,
            edges_flushed: 4,
        };
        assert_eq!(format!("{} after {p}", Stage::Emit), "emit after 10 cells evaluated, 4 edges flushed");
    }
}
