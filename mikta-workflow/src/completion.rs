//! A thread-safe, cancellable completion cell for single task results.
//!
//! [`task_cell`] returns a completer/handle pair around one shared cell. The
//! producer side settles the cell exactly once with a `Result`; the consumer
//! side waits for and takes the result, or cancels the task. Workers chain
//! continuations onto cells through settle callbacks, and an async task's
//! outer cell carries a cancel hook that forwards cancellation into the
//! task's inner handle once it is known.
//!
//! ## Cell lifecycle
//!
//! 1. Pending: no result yet; callbacks and the cancel hook accumulate.
//! 2. Settled: a result (success, failure, or cancellation) is stored;
//!    callbacks have run.
//! 3. The result is taken once, by [`TaskHandle::join`] or by an internal
//!    transfer into another cell.
//!
//! Dropping the last completer without settling cancels the cell, so a task
//! discarded by its executor still settles its submitter's handle.

use std::{
    sync::{
        Arc, Condvar, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use mikta_common::{Result, error::Error};

/// Creates a completer/handle pair around a new pending cell.
pub fn task_cell<T>() -> (TaskCompleter<T>, TaskHandle<T>) {
    let cell = Arc::new(TaskCell::new());
    (TaskCompleter(cell.clone()), TaskHandle(cell))
}

/// Creates a handle that is already settled with a value.
pub fn ready<T>(value: T) -> TaskHandle<T> {
    TaskHandle(Arc::new(TaskCell::settled(Ok(value))))
}

/// Creates a handle that is already settled with an error.
pub fn failed<T>(error: Error) -> TaskHandle<T> {
    TaskHandle(Arc::new(TaskCell::settled(Err(error))))
}

/// The producer half: settles the cell with the task's result.
///
/// Not cloneable; the worker dispatching the task is the only producer.
/// Dropping the completer without settling cancels the cell.
pub struct TaskCompleter<T>(Arc<TaskCell<T>>);

impl<T> TaskCompleter<T> {
    /// Settles the cell. Returns false when the cell was already settled,
    /// e.g. by cancellation racing completion.
    pub fn complete(&self, result: Result<T>) -> bool {
        self.0.settle(result)
    }

    pub(crate) fn cell(&self) -> Arc<TaskCell<T>> {
        self.0.clone()
    }
}

impl<T> Drop for TaskCompleter<T> {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// The consumer half: observes and takes the task's result.
///
/// Returned by worker submission. `join` blocks for and takes the result;
/// `cancel` requests cancellation, which removes a not-yet-dispatched task
/// from its queue and propagates into a dispatched async task's inner
/// handle.
pub struct TaskHandle<T>(Arc<TaskCell<T>>);

impl<T> TaskHandle<T> {
    /// True once the task has completed, failed, or been cancelled.
    pub fn is_settled(&self) -> bool {
        self.0.is_settled()
    }

    /// True when the cell was settled by cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    /// Requests cancellation. Returns true when this call settled the cell;
    /// false when the task had already settled.
    pub fn cancel(&self) -> bool {
        self.0.cancel()
    }

    /// Blocks until the cell settles, without taking the result.
    pub fn wait(&self) {
        self.0.wait();
    }

    /// Blocks until the cell settles or the timeout elapses. Returns true
    /// when settled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.0.wait_timeout(timeout)
    }

    /// Blocks until the cell settles and takes the result.
    ///
    /// A cancelled task yields a `Cancelled` error.
    pub fn join(self) -> Result<T> {
        self.0.wait();
        self.0.take()
    }

    pub(crate) fn cell(&self) -> Arc<TaskCell<T>> {
        self.0.clone()
    }

    pub(crate) fn into_cell(self) -> Arc<TaskCell<T>> {
        self.0
    }
}

/// Type-erased view of a cell, used by worker queues to observe and cancel
/// tasks without knowing their result type.
pub(crate) trait TaskObserver: Send + Sync {
    fn is_settled(&self) -> bool;

    fn cancel_task(&self);

    /// Registers a settle callback; runs it immediately when the cell has
    /// already settled.
    fn on_settle(&self, callback: Box<dyn FnOnce() + Send>);
}

impl<T: Send> TaskObserver for TaskCell<T> {
    fn is_settled(&self) -> bool {
        TaskCell::is_settled(self)
    }

    fn cancel_task(&self) {
        self.cancel();
    }

    fn on_settle(&self, callback: Box<dyn FnOnce() + Send>) {
        TaskCell::on_settle(self, callback);
    }
}

/// Shared state behind a completer/handle pair.
pub(crate) struct TaskCell<T> {
    state: Mutex<CellState<T>>,
    condvar: Condvar,
    cancelled: AtomicBool,
}

enum CellState<T> {
    Pending {
        callbacks: Vec<Box<dyn FnOnce() + Send>>,
        cancel_hook: Option<Box<dyn FnOnce() + Send>>,
    },
    /// Settled; `None` once the result has been taken.
    Settled(Option<Result<T>>),
}

impl<T> TaskCell<T> {
    fn new() -> TaskCell<T> {
        TaskCell {
            state: Mutex::new(CellState::Pending {
                callbacks: Vec::new(),
                cancel_hook: None,
            }),
            condvar: Condvar::new(),
            cancelled: AtomicBool::new(false),
        }
    }

    fn settled(result: Result<T>) -> TaskCell<T> {
        TaskCell {
            state: Mutex::new(CellState::Settled(Some(result))),
            condvar: Condvar::new(),
            cancelled: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_settled(&self) -> bool {
        matches!(*self.state.lock().unwrap(), CellState::Settled(_))
    }

    /// Stores the result and runs pending callbacks. Returns false when
    /// already settled.
    pub(crate) fn settle(&self, result: Result<T>) -> bool {
        let callbacks = {
            let mut state = self.state.lock().unwrap();
            match std::mem::replace(&mut *state, CellState::Settled(Some(result))) {
                CellState::Pending { callbacks, .. } => callbacks,
                previous @ CellState::Settled(_) => {
                    *state = previous;
                    return false;
                }
            }
        };
        self.condvar.notify_all();
        for callback in callbacks {
            callback();
        }
        true
    }

    /// Settles with a `Cancelled` error, running the cancel hook and pending
    /// callbacks. Returns false when already settled.
    pub(crate) fn cancel(&self) -> bool {
        let (callbacks, hook) = {
            let mut state = self.state.lock().unwrap();
            match std::mem::replace(&mut *state, CellState::Settled(Some(Err(Error::cancelled())))) {
                CellState::Pending {
                    callbacks,
                    cancel_hook,
                } => {
                    self.cancelled.store(true, Ordering::SeqCst);
                    (callbacks, cancel_hook)
                }
                previous @ CellState::Settled(_) => {
                    *state = previous;
                    return false;
                }
            }
        };
        self.condvar.notify_all();
        if let Some(hook) = hook {
            hook();
        }
        for callback in callbacks {
            callback();
        }
        true
    }

    /// Registers a settle callback, or runs it immediately when the cell has
    /// already settled. Immediate execution on the registering thread is what
    /// lets a worker continue in place when an async task settled before its
    /// continuation was attached.
    pub(crate) fn on_settle(&self, callback: Box<dyn FnOnce() + Send>) {
        {
            let mut state = self.state.lock().unwrap();
            if let CellState::Pending { callbacks, .. } = &mut *state {
                callbacks.push(callback);
                return;
            }
        }
        callback();
    }

    /// Installs the hook that forwards cancellation into an async task's
    /// inner handle. When the cell was already cancelled the hook runs
    /// immediately; when it settled normally the hook is dropped.
    pub(crate) fn set_cancel_hook(&self, hook: Box<dyn FnOnce() + Send>) {
        {
            let mut state = self.state.lock().unwrap();
            if let CellState::Pending { cancel_hook, .. } = &mut *state {
                *cancel_hook = Some(hook);
                return;
            }
        }
        if self.cancelled.load(Ordering::SeqCst) {
            hook();
        }
    }

    fn wait(&self) {
        let guard = self.state.lock().unwrap();
        let _guard = self
            .condvar
            .wait_while(guard, |state| matches!(state, CellState::Pending { .. }))
            .unwrap();
    }

    fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.state.lock().unwrap();
        let (_guard, result) = self
            .condvar
            .wait_timeout_while(guard, timeout, |state| {
                matches!(state, CellState::Pending { .. })
            })
            .unwrap();
        !result.timed_out()
    }

    /// Takes the settled result. Panics when the cell is still pending or
    /// the result was already taken; both halves are single-owner, so this
    /// does not happen in practice.
    pub(crate) fn take(&self) -> Result<T> {
        match &mut *self.state.lock().unwrap() {
            CellState::Settled(result) => result.take().expect("task result already taken"),
            CellState::Pending { .. } => panic!("task result is not ready yet"),
        }
    }
}
