//! Fixed-width worker pool for the per-stage parallel loops.
//!
//! Each dispatch splits an index range `[0, n)` into contiguous,
//! non-overlapping per-worker ranges and runs the work function once per
//! worker on scoped threads. A dispatch returns only after every worker has
//! finished, so the return itself is the stage barrier the pipeline chains
//! on. A pool constructed with a single worker runs the work function
//! inline on the caller's thread over the whole range; that path must be
//! (and is tested to be) result-equivalent to the threaded one.

use std::ops::Range;
use std::thread;

/// Parallel-for executor with a worker count fixed at construction.
#[derive(Debug)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Create a pool that splits work across `workers` workers.
    pub fn new(workers: usize) -> Self {
        assert!(workers >= 1, "worker pool needs at least one worker");
        Self { workers }
    }

    /// Create a pool sized to the machine's available parallelism.
    pub fn with_available_parallelism() -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(workers)
    }

    /// Number of workers this pool splits work across.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Length of each worker's contiguous range for `total` items.
    #[inline]
    fn stride(&self, total: usize) -> usize {
        total.div_ceil(self.workers)
    }

    /// Run `work(worker_index, range)` over a partition of `[0, total)`.
    ///
    /// Blocks until every worker has returned.
    pub fn dispatch<F>(&self, total: usize, work: F)
    where
        F: Fn(usize, Range<usize>) + Sync,
    {
        if self.workers == 1 || total == 0 {
            work(0, 0..total);
            return;
        }
        let stride = self.stride(total);
        thread::scope(|scope| {
            for worker in 0..self.workers {
                let start = worker * stride;
                if start >= total {
                    break;
                }
                let end = (start + stride).min(total);
                let work = &work;
                scope.spawn(move || work(worker, start..end));
            }
        });
    }

    /// Run `work(worker_index, offset, chunk)` over per-worker mutable
    /// chunks of `items`, split with the same arithmetic as [`dispatch`]
    /// (`offset` is the index of `chunk[0]` within `items`).
    ///
    /// Blocks until every worker has returned.
    ///
    /// [`dispatch`]: WorkerPool::dispatch
    pub fn dispatch_chunks<T, F>(&self, items: &mut [T], work: F)
    where
        T: Send,
        F: Fn(usize, usize, &mut [T]) + Sync,
    {
        if self.workers == 1 || items.is_empty() {
            work(0, 0, items);
            return;
        }
        let stride = self.stride(items.len());
        thread::scope(|scope| {
            for (worker, chunk) in items.chunks_mut(stride).enumerate() {
                let offset = worker * stride;
                let work = &work;
                scope.spawn(move || work(worker, offset, chunk));
            }
        });
    }
}
