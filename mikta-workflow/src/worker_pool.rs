//! Keyed registry of sequential workers with idle reaping.

use std::{
    hash::Hash,
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use ahash::AHashMap;

use crate::{
    clock::{Clock, SystemClock},
    executor::Executor,
    sequential_worker::SequentialWorker,
};

/// Default interval between idle-reap passes.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// A keyed map of lazily created [`SequentialWorker`]s.
///
/// [`get`](Self::get) returns the worker for a key, creating it on first
/// use. Each `get` also runs a non-blocking flush check: when more than the
/// flush interval has elapsed since the last flush and a compare-and-swap
/// on the flush timestamp succeeds, every worker with no pending tasks and
/// nothing running is removed from the map and retired. A non-idle worker
/// is never removed.
pub struct SequentialWorkerPool<K> {
    executor: Arc<dyn Executor>,
    workers: RwLock<AHashMap<K, Arc<SequentialWorker>>>,
    clock: Arc<dyn Clock>,
    origin: Instant,
    flush_interval: Duration,
    last_flush_millis: AtomicU64,
}

impl<K: Eq + Hash + Clone> SequentialWorkerPool<K> {
    /// Creates a pool with the default flush interval and the system clock.
    pub fn new(executor: Arc<dyn Executor>) -> SequentialWorkerPool<K> {
        Self::with_flush_interval(executor, DEFAULT_FLUSH_INTERVAL)
    }

    /// Creates a pool that reaps idle workers at the given interval.
    pub fn with_flush_interval(
        executor: Arc<dyn Executor>,
        flush_interval: Duration,
    ) -> SequentialWorkerPool<K> {
        Self::with_clock(executor, flush_interval, Arc::new(SystemClock))
    }

    /// Creates a pool reading time from the given clock.
    pub fn with_clock(
        executor: Arc<dyn Executor>,
        flush_interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> SequentialWorkerPool<K> {
        let origin = clock.now();
        SequentialWorkerPool {
            executor,
            workers: RwLock::new(AHashMap::new()),
            clock,
            origin,
            flush_interval,
            last_flush_millis: AtomicU64::new(0),
        }
    }

    /// Returns the worker for `key`, creating it when absent.
    pub fn get(&self, key: &K) -> Arc<SequentialWorker> {
        self.maybe_flush();

        if let Some(worker) = self.workers.read().unwrap().get(key) {
            return worker.clone();
        }

        let mut workers = self.workers.write().unwrap();
        workers
            .entry(key.clone())
            .or_insert_with(|| Arc::new(SequentialWorker::new(self.executor.clone())))
            .clone()
    }

    /// Number of workers currently in the map.
    pub fn len(&self) -> usize {
        self.workers.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.read().unwrap().is_empty()
    }

    /// Removes and retires every idle worker, regardless of the flush
    /// throttle.
    pub fn flush(&self) {
        let mut reaped = Vec::new();
        {
            let mut workers = self.workers.write().unwrap();
            workers.retain(|_, worker| {
                let idle = worker.pending_task_count() == 0 && !worker.is_running();
                if idle {
                    reaped.push(worker.clone());
                }
                !idle
            });
        }
        // Retirement happens outside the map lock; a removed worker is
        // unreachable through the pool already.
        for worker in reaped {
            worker.retire();
        }
    }

    /// Runs a flush when the interval elapsed and this caller wins the
    /// timestamp compare-and-swap. Losers return immediately.
    fn maybe_flush(&self) {
        let elapsed = self
            .clock
            .now()
            .duration_since(self.origin)
            .as_millis()
            .min(u64::MAX as u128) as u64;
        let last = self.last_flush_millis.load(Ordering::SeqCst);
        if elapsed.saturating_sub(last) <= self.flush_interval.as_millis() as u64 {
            return;
        }
        if self
            .last_flush_millis
            .compare_exchange(last, elapsed, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        self.flush();
    }
}
