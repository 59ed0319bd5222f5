//! Per-stage, per-worker timing diagnostics.
//!
//! A plain accumulator the engine passes into each stage -- deliberately
//! not global state, and kept off the correctness path. Workers store
//! their own elapsed time; totals are summed on demand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// The three pipeline phases that report timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Kinematic advance + global forces + histogram publish.
    Integrate,
    /// Scatter into bucket-sorted order.
    Sort,
    /// Neighbor scan, depenetration, constraints.
    Resolve,
}

/// Per-worker elapsed-time records for one tick.
#[derive(Debug)]
pub struct StageTimings {
    integrate: Vec<AtomicU64>,
    sort: Vec<AtomicU64>,
    resolve: Vec<AtomicU64>,
}

impl StageTimings {
    /// Create records for `workers` workers.
    pub fn new(workers: usize) -> Self {
        let row = |n: usize| (0..n).map(|_| AtomicU64::new(0)).collect();
        Self {
            integrate: row(workers),
            sort: row(workers),
            resolve: row(workers),
        }
    }

    fn row(&self, stage: Stage) -> &[AtomicU64] {
        match stage {
            Stage::Integrate => &self.integrate,
            Stage::Sort => &self.sort,
            Stage::Resolve => &self.resolve,
        }
    }

    /// Zero all records for a new tick.
    pub fn reset(&self) {
        for stage in [Stage::Integrate, Stage::Sort, Stage::Resolve] {
            for cell in self.row(stage) {
                cell.store(0, Ordering::Relaxed);
            }
        }
    }

    /// Record `elapsed` for `worker` in `stage`.
    pub fn record(&self, stage: Stage, worker: usize, elapsed: Duration) {
        self.row(stage)[worker].store(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Sum of all workers' elapsed time in `stage` for the last tick.
    pub fn total(&self, stage: Stage) -> Duration {
        let nanos: u64 = self
            .row(stage)
            .iter()
            .map(|cell| cell.load(Ordering::Relaxed))
            .sum();
        Duration::from_nanos(nanos)
    }
}
