//! A per-key task queue with at most one task in flight.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use mikta_common::{Result, error::Error};

use crate::{
    completion::{self, TaskHandle},
    executor::Executor,
    task::{QueuedTask, StepOutcome},
};

/// Serializes caller-submitted tasks on an externally supplied executor.
///
/// Tasks are dispatched strictly in submission order, at most one in flight.
/// The worker owns no threads: a processing token, claimed by compare-and-
/// swap before dispatch, decides which submission drives the queue on the
/// executor. Completion of each task re-enters the scheduling decision.
///
/// Lifecycle:
/// - [`disable`](Self::disable) pauses the worker between tasks; a running
///   task finishes, then nothing dispatches until [`enable`](Self::enable).
/// - [`retire`](Self::retire) is terminal: pending tasks are cancelled,
///   the running task (if any) finishes without a successor, and later
///   submissions return pre-failed handles.
///
/// Submission never fails synchronously; all errors flow through the
/// returned [`TaskHandle`].
pub struct SequentialWorker {
    core: Arc<WorkerCore>,
}

pub(crate) struct WorkerCore {
    executor: Arc<dyn Executor>,
    queue: Mutex<VecDeque<QueuedTask>>,
    processing: AtomicBool,
    retired: AtomicBool,
    enabled: AtomicBool,
}

impl SequentialWorker {
    /// Creates an enabled worker over the given executor.
    pub fn new(executor: Arc<dyn Executor>) -> SequentialWorker {
        SequentialWorker {
            core: Arc::new(WorkerCore {
                executor,
                queue: Mutex::new(VecDeque::new()),
                processing: AtomicBool::new(false),
                retired: AtomicBool::new(false),
                enabled: AtomicBool::new(true),
            }),
        }
    }

    /// Enqueues a synchronous action. The handle settles with the action's
    /// result, or with its error.
    pub fn submit_task<T, F>(&self, action: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (task, handle) = QueuedTask::from_sync(1, action);
        self.enqueue(task, handle)
    }

    /// Enqueues an action that returns a handle to further asynchronous
    /// work. The worker dispatches the next task only once that inner
    /// handle settles; the returned handle mirrors it. An action failing
    /// synchronously is equivalent to an immediately failed inner handle.
    pub fn submit_async_task<T, F>(&self, action: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<TaskHandle<T>> + Send + 'static,
    {
        let (task, handle) = QueuedTask::from_async(1, action);
        self.enqueue(task, handle)
    }

    /// Fast-path submission: fails with `Busy` when the worker is running
    /// or has queued work.
    pub fn run_task_if_idle<T, F>(&self, action: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        if !self.is_idle() {
            return completion::failed(Error::busy("worker has tasks in flight"));
        }
        self.submit_task(action)
    }

    /// Fast-path async submission: fails with `Busy` when the worker is
    /// running or has queued work.
    pub fn run_async_task_if_idle<T, F>(&self, action: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<TaskHandle<T>> + Send + 'static,
    {
        if !self.is_idle() {
            return completion::failed(Error::busy("worker has tasks in flight"));
        }
        self.submit_async_task(action)
    }

    fn enqueue<T>(&self, task: QueuedTask, handle: TaskHandle<T>) -> TaskHandle<T> {
        {
            let mut queue = self.core.queue.lock().unwrap();
            if self.core.retired.load(Ordering::SeqCst) {
                return completion::failed(Error::invalid_state("worker is retired"));
            }
            queue.push_back(task);
        }
        WorkerCore::maybe_schedule(&self.core);
        handle
    }

    fn is_idle(&self) -> bool {
        !self.is_running() && self.pending_task_count() == 0
    }

    /// True while a dispatch attempt holds the processing token.
    pub fn is_running(&self) -> bool {
        self.core.processing.load(Ordering::SeqCst)
    }

    /// Number of queued tasks that are still live (not cancelled).
    pub fn pending_task_count(&self) -> usize {
        self.core
            .queue
            .lock()
            .unwrap()
            .iter()
            .filter(|task| !task.observer.is_settled())
            .count()
    }

    pub fn is_retired(&self) -> bool {
        self.core.retired.load(Ordering::SeqCst)
    }

    pub fn is_enabled(&self) -> bool {
        self.core.enabled.load(Ordering::SeqCst)
    }

    /// Pauses dispatching between tasks. A running task finishes normally.
    pub fn disable(&self) {
        self.core.enabled.store(false, Ordering::SeqCst);
    }

    /// Resumes dispatching and triggers a dispatch attempt.
    pub fn enable(&self) {
        if self.core.retired.load(Ordering::SeqCst) {
            return;
        }
        self.core.enabled.store(true, Ordering::SeqCst);
        WorkerCore::maybe_schedule(&self.core);
    }

    /// Retires the worker: cancels every pending task and prevents any
    /// further dispatch. A running task is not interrupted, but no
    /// successor starts. Terminal.
    pub fn retire(&self) {
        let drained: Vec<QueuedTask> = {
            let mut queue = self.core.queue.lock().unwrap();
            self.core.retired.store(true, Ordering::SeqCst);
            self.core.enabled.store(false, Ordering::SeqCst);
            queue.drain(..).collect()
        };
        for task in drained {
            task.observer.cancel_task();
        }
    }
}

impl WorkerCore {
    /// Claims the processing token and starts a drive pass on the executor
    /// when there is runnable work. The token guarantees at most one pass.
    pub(crate) fn maybe_schedule(core: &Arc<WorkerCore>) {
        if core.retired.load(Ordering::SeqCst) || !core.enabled.load(Ordering::SeqCst) {
            return;
        }
        if core.queue.lock().unwrap().is_empty() {
            return;
        }
        if core
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let driver = core.clone();
            core.executor.execute(Box::new(move || Self::drive(driver)));
        }
    }

    /// Runs tasks from the queue until it drains, the worker is paused or
    /// retired, or an async task leaves a pending gate.
    fn drive(core: Arc<WorkerCore>) {
        loop {
            let Some(task) = core.next_task() else {
                core.processing.store(false, Ordering::SeqCst);
                // A submission may have raced the token release; reclaim.
                if core.enabled.load(Ordering::SeqCst)
                    && !core.retired.load(Ordering::SeqCst)
                    && !core.queue.lock().unwrap().is_empty()
                    && core
                        .processing
                        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok()
                {
                    continue;
                }
                return;
            };
            match (task.step)() {
                StepOutcome::Completed => continue,
                StepOutcome::Pending(gate) => {
                    // Keep the token across the async gap; the settle
                    // callback resumes the drive pass on the executor.
                    let driver = core.clone();
                    gate.on_settle(Box::new(move || Self::resume(driver)));
                    return;
                }
            }
        }
    }

    fn resume(core: Arc<WorkerCore>) {
        let executor = core.executor.clone();
        let driver = core;
        executor.execute(Box::new(move || Self::drive(driver)));
    }

    /// Pops the next live task, skipping entries cancelled before dispatch.
    /// Returns `None` when paused, retired, or drained.
    fn next_task(&self) -> Option<QueuedTask> {
        let mut queue = self.queue.lock().unwrap();
        if self.retired.load(Ordering::SeqCst) || !self.enabled.load(Ordering::SeqCst) {
            return None;
        }
        while let Some(task) = queue.pop_front() {
            if task.observer.is_settled() {
                continue;
            }
            return Some(task);
        }
        None
    }
}
