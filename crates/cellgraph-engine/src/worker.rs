//! Evaluation worker pool.
//!
//! Cells are split into batches of consecutive indices. Workers pull batch
//! numbers from a crossbeam channel, evaluate them, and send the results
//! over a bounded channel to the calling thread, which restores batch order
//! before handing each batch to the consumer. The consumer is the only
//! code that touches the output.
//!
//! An abort signal is checked before each batch. Once raised, workers stop
//! taking batches; the consumer still receives every batch up to the first
//! one that was never finished, so the output is a clean prefix.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use cellgraph_core::NeighborEdge;
use crossbeam_channel::{Receiver, Sender};

use crate::evaluator::{EvalStats, Evaluator};

/// Cooperative cancellation flag, cheap to clone and share with other
/// threads.
#[derive(Clone, Debug, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    /// A signal that has not been raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop after the batches in flight.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// `true` once [`raise`](Self::raise) has been called.
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Split of `cells` consecutive indices into batches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BatchPlan {
    pub(crate) cells: usize,
    pub(crate) batch_size: usize,
}

impl BatchPlan {
    pub(crate) fn new(cells: usize, batch_size: usize) -> Self {
        Self {
            cells,
            batch_size: batch_size.max(1),
        }
    }

    pub(crate) fn batch_count(&self) -> usize {
        self.cells.div_ceil(self.batch_size)
    }

    pub(crate) fn range(&self, batch: usize) -> Range<usize> {
        let start = (batch * self.batch_size).min(self.cells);
        let end = (start + self.batch_size).min(self.cells);
        start..end
    }
}

/// One evaluated batch.
#[derive(Debug)]
pub(crate) struct BatchOutput {
    pub(crate) batch: usize,
    pub(crate) cells: Range<usize>,
    pub(crate) edges: Vec<NeighborEdge>,
    pub(crate) stats: EvalStats,
}

/// What the pool did.
#[derive(Debug, Default)]
pub(crate) struct PoolOutcome {
    /// Batches delivered to the consumer, in order.
    pub(crate) batches_delivered: usize,
    /// Statistics of the delivered batches only.
    pub(crate) stats: EvalStats,
    /// `true` if the abort signal left batches unevaluated.
    pub(crate) aborted: bool,
}

fn worker_loop(
    evaluator: &Evaluator<'_>,
    plan: BatchPlan,
    task_rx: Receiver<usize>,
    result_tx: Sender<BatchOutput>,
    abort: &AbortSignal,
    stop: &AtomicBool,
) {
    while let Ok(batch) = task_rx.recv() {
        if abort.is_raised() || stop.load(Ordering::Acquire) {
            break;
        }
        let cells = plan.range(batch);
        let (edges, stats) = evaluator.evaluate_range(cells.clone());
        let out = BatchOutput {
            batch,
            cells,
            edges,
            stats,
        };
        if result_tx.send(out).is_err() {
            break;
        }
    }
}

/// Evaluate every batch of `plan` on `workers` threads, delivering results
/// to `consume` in batch order.
///
/// If `consume` fails, remaining work is abandoned and the error returned.
pub(crate) fn evaluate_parallel<E, F>(
    evaluator: &Evaluator<'_>,
    plan: BatchPlan,
    workers: usize,
    abort: &AbortSignal,
    mut consume: F,
) -> Result<PoolOutcome, E>
where
    F: FnMut(BatchOutput) -> Result<(), E>,
{
    let batch_count = plan.batch_count();
    let workers = workers.clamp(1, batch_count.max(1));

    let (task_tx, task_rx) = crossbeam_channel::unbounded();
    for batch in 0..batch_count {
        // Receiver is alive; send cannot fail.
        let _ = task_tx.send(batch);
    }
    drop(task_tx);

    let (result_tx, result_rx) = crossbeam_channel::bounded::<BatchOutput>(workers * 2);
    let stop = AtomicBool::new(false);

    thread::scope(|s| {
        for _ in 0..workers {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            let stop = &stop;
            s.spawn(move || worker_loop(evaluator, plan, task_rx, result_tx, abort, stop));
        }
        drop(result_tx);

        let mut outcome = PoolOutcome::default();
        let mut pending: BTreeMap<usize, BatchOutput> = BTreeMap::new();
        let mut failure = None;

        'recv: for out in result_rx.iter() {
            pending.insert(out.batch, out);
            while let Some(ready) = pending.remove(&outcome.batches_delivered) {
                tracing::debug!(
                    batch = ready.batch,
                    cells = ready.cells.len(),
                    edges = ready.edges.len(),
                    "batch evaluated"
                );
                outcome.stats.merge(&ready.stats);
                if let Err(e) = consume(ready) {
                    failure = Some(e);
                    break 'recv;
                }
                outcome.batches_delivered += 1;
            }
        }

        // Unblock workers waiting on a full result channel.
        stop.store(true, Ordering::Release);
        drop(result_rx);

        if let Some(e) = failure {
            return Err(e);
        }
        if !pending.is_empty() {
            tracing::debug!(
                discarded = pending.len(),
                "dropping batches completed after an unfinished one"
            );
        }
        outcome.aborted = outcome.batches_delivered < batch_count;
        Ok(outcome)
    })
}
