//! Run orchestration: configure, ingest, index, evaluate, emit.

use std::cmp::Ordering;
use std::io::Write;
use std::time::Instant;

use cellgraph_core::{CellRegistry, DuplicatePolicy, IngestReport, NeighborEdge, RegistryBuilder};
use cellgraph_space::{BruteForceIndex, CandidateIndex, SpatialGrid};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, EdgeOrder, IndexKind, RunConfig};
use crate::emitter::{EdgeSink, EmitError};
use crate::error::RunError;
use crate::evaluator::Evaluator;
use crate::source::{open_source, CellSource};
use crate::summary::{average, direction_histogram, Progress, RunSummary, Stage};
use crate::worker::{evaluate_parallel, AbortSignal, BatchPlan, PoolOutcome};

/// Run end to end using the input and output named in `config`.
///
/// The output file is created (with parent directories) before any cell
/// is read, and is flushed and synced before returning.
pub fn run(config: &RunConfig, abort: &AbortSignal) -> Result<RunSummary, RunError> {
    config
        .validate()
        .map_err(|e| RunError::at(Stage::Configure, e))?;
    let input = config
        .input
        .as_ref()
        .ok_or_else(|| RunError::at(Stage::Configure, ConfigError::MissingInput))?;
    let output = config
        .output
        .as_ref()
        .ok_or_else(|| RunError::at(Stage::Configure, ConfigError::MissingOutput))?;

    let mut source = open_source(&input.path, input.resolved_format())
        .map_err(|e| RunError::at(Stage::Configure, e))?;
    let mut sink = EdgeSink::create(&output.path, output.resolved_format())
        .map_err(|e| RunError::at(Stage::Configure, e))?;

    let summary = run_with(config, source.as_mut(), &mut sink, abort)?;
    sink.finish_durable()
        .map_err(|e| emit_failure(e, summary.cells_processed, summary.edges_emitted))?;
    info!(path = %output.path.display(), "edges written");
    Ok(summary)
}

/// Run against a caller-supplied source and sink.
///
/// `config.input` and `config.output` are ignored. The sink is flushed but
/// not consumed, so callers can inspect or finish it afterwards.
pub fn run_with<S, W>(
    config: &RunConfig,
    source: &mut S,
    sink: &mut EdgeSink<W>,
    abort: &AbortSignal,
) -> Result<RunSummary, RunError>
where
    S: CellSource + ?Sized,
    W: Write,
{
    let started = Instant::now();
    config
        .validate()
        .map_err(|e| RunError::at(Stage::Configure, e))?;
    let threshold = config.adjacency_threshold;
    let edges_before = sink.edges_written();

    info!(source = %source.describe(), threshold, "ingesting cells");
    let (registry, report) = ingest(source, config.duplicate_policy)?;
    info!(
        cells = registry.len(),
        skipped = report.skipped,
        duplicates = report.duplicate_ids,
        "cells registered"
    );
    if registry.is_empty() {
        warn!("input contains no valid cells; no edges will be emitted");
    }

    let index = build_index(config, &registry)?;
    let evaluator = Evaluator::new(&registry, index.as_ref(), threshold);
    let plan = BatchPlan::new(registry.len(), config.batch_size);
    let workers = config.resolved_workers();
    info!(
        index = index.name(),
        workers,
        batches = plan.batch_count(),
        "evaluating neighbours"
    );

    let mut cells_evaluated = 0u64;
    let outcome = match config.edge_order {
        EdgeOrder::Registration => {
            emit_in_batch_order(&evaluator, plan, workers, abort, sink, &mut cells_evaluated)
        }
        EdgeOrder::ById => emit_sorted_by_id(
            &evaluator,
            plan,
            workers,
            abort,
            sink,
            config.batch_size,
            &mut cells_evaluated,
        ),
    }
    .map_err(|e| emit_failure(e, cells_evaluated, sink.edges_flushed()))?;
    sink.flush()
        .map_err(|e| emit_failure(e, cells_evaluated, sink.edges_flushed()))?;

    let stats = outcome.stats;
    if stats.coincident_pairs > 0 {
        warn!(
            pairs = stats.coincident_pairs,
            "distinct cells share a centroid; labelled `same`"
        );
    }
    if outcome.aborted {
        warn!(
            cells_evaluated,
            cells = registry.len(),
            "run aborted; output holds the completed prefix"
        );
    }

    let edges_emitted = sink.edges_written() - edges_before;
    let summary = RunSummary {
        cells_processed: cells_evaluated,
        edges_emitted,
        average_edges_per_cell: average(edges_emitted, cells_evaluated),
        skipped_records: report.skipped,
        duplicate_ids: report.duplicate_ids,
        candidate_pairs: stats.candidate_pairs,
        coincident_pairs: stats.coincident_pairs,
        direction_counts: direction_histogram(&stats),
        aborted: outcome.aborted,
        output_digest: sink.digest(),
        elapsed: started.elapsed(),
    };
    info!(
        cells = summary.cells_processed,
        edges = summary.edges_emitted,
        avg_edges_per_cell = summary.average_edges_per_cell,
        skipped = summary.skipped_records,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "run complete"
    );
    Ok(summary)
}

fn ingest<S: CellSource + ?Sized>(
    source: &mut S,
    policy: DuplicatePolicy,
) -> Result<(CellRegistry, IngestReport), RunError> {
    let mut builder = RegistryBuilder::new(policy);
    {
        let records = source
            .records()
            .map_err(|e| RunError::at(Stage::Ingest, e))?;
        for item in records {
            builder
                .offer(item)
                .map_err(|e| RunError::at(Stage::Ingest, e))?;
        }
    }
    source
        .finish()
        .map_err(|e| RunError::at(Stage::Ingest, e))?;
    Ok(builder.finish())
}

fn build_index(
    config: &RunConfig,
    registry: &CellRegistry,
) -> Result<Box<dyn CandidateIndex>, RunError> {
    match config.index {
        IndexKind::Grid => {
            let grid = SpatialGrid::build(registry.positions(), config.adjacency_threshold)
                .map_err(|e| RunError::at(Stage::Index, e))?;
            let stats = grid.stats();
            debug!(
                buckets = stats.occupied_buckets,
                max_occupancy = stats.max_occupancy,
                mean_occupancy = stats.mean_occupancy,
                "grid built"
            );
            Ok(Box::new(grid))
        }
        IndexKind::BruteForce => Ok(Box::new(BruteForceIndex::new(registry.len()))),
    }
}

fn emit_in_batch_order<W: Write>(
    evaluator: &Evaluator<'_>,
    plan: BatchPlan,
    workers: usize,
    abort: &AbortSignal,
    sink: &mut EdgeSink<W>,
    cells_evaluated: &mut u64,
) -> Result<PoolOutcome, EmitError> {
    let registry = evaluator.registry();
    evaluate_parallel(evaluator, plan, workers, abort, |batch| {
        sink.write_batch(registry, &batch.edges)?;
        *cells_evaluated += batch.cells.len() as u64;
        Ok(())
    })
}

fn emit_sorted_by_id<W: Write>(
    evaluator: &Evaluator<'_>,
    plan: BatchPlan,
    workers: usize,
    abort: &AbortSignal,
    sink: &mut EdgeSink<W>,
    chunk: usize,
    cells_evaluated: &mut u64,
) -> Result<PoolOutcome, EmitError> {
    let registry = evaluator.registry();
    let mut edges: Vec<NeighborEdge> = Vec::new();
    let outcome = evaluate_parallel::<EmitError, _>(evaluator, plan, workers, abort, |batch| {
        edges.extend(batch.edges);
        Ok(())
    })?;
    *cells_evaluated = outcome.stats.cells;
    edges.sort_unstable_by(|a, b| by_ids(registry, a, b));
    for part in edges.chunks(chunk.max(1)) {
        sink.write_batch(registry, part)?;
    }
    Ok(outcome)
}

fn by_ids(registry: &CellRegistry, a: &NeighborEdge, b: &NeighborEdge) -> Ordering {
    let key = |e: &NeighborEdge| {
        (
            registry.id(e.from).map(|id| id.as_str()),
            registry.id(e.to).map(|id| id.as_str()),
        )
    };
    key(a).cmp(&key(b))
}

fn emit_failure(err: EmitError, cells_evaluated: u64, flushed_so_far: u64) -> RunError {
    let edges_flushed = match &err {
        EmitError::Write { edges_flushed, .. } => *edges_flushed,
        EmitError::UnknownCell { .. } => flushed_so_far,
    };
    RunError::at(Stage::Emit, err).with_progress(Progress {
        cells_evaluated,
        edges_flushed,
    })
}
