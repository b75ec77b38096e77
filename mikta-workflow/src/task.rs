//! Queued-task plumbing shared by the worker variants.

use std::sync::Arc;

use mikta_common::Result;

use crate::completion::{TaskCell, TaskCompleter, TaskHandle, TaskObserver};

/// What a dispatched task left behind.
pub(crate) enum StepOutcome {
    /// The task settled synchronously; the worker moves on.
    Completed,
    /// The task returned an inner handle that has not settled yet; the
    /// worker parks until the carried cell settles.
    Pending(Arc<dyn TaskObserver>),
}

/// A queue entry: the dispatch closure plus the type-erased cell the
/// submitter observes.
pub(crate) struct QueuedTask {
    /// Admission weight; 1 for unweighted workers.
    pub weight: u64,
    /// The submitter-visible cell. Settled before dispatch means the task
    /// was cancelled and is skipped.
    pub observer: Arc<dyn TaskObserver>,
    pub step: Box<dyn FnOnce() -> StepOutcome + Send>,
}

impl QueuedTask {
    /// Packages a synchronous action: run it, settle the submitter's cell.
    pub fn from_sync<T, F>(weight: u64, action: F) -> (QueuedTask, TaskHandle<T>)
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (completer, handle) = crate::completion::task_cell::<T>();
        let observer: Arc<dyn TaskObserver> = handle.cell();
        let step = Box::new(move || {
            completer.complete(action());
            StepOutcome::Completed
        });
        (
            QueuedTask {
                weight,
                observer,
                step,
            },
            handle,
        )
    }

    /// Packages an asynchronous action: run it to obtain an inner handle,
    /// link the submitter's cell to it, and report the outer cell as the
    /// pending gate. A synchronous error settles the outer cell at once.
    pub fn from_async<T, F>(weight: u64, action: F) -> (QueuedTask, TaskHandle<T>)
    where
        T: Send + 'static,
        F: FnOnce() -> Result<TaskHandle<T>> + Send + 'static,
    {
        let (completer, handle) = crate::completion::task_cell::<T>();
        let outer: Arc<TaskCell<T>> = handle.cell();
        let observer: Arc<dyn TaskObserver> = handle.cell();
        let step = Box::new(move || match action() {
            Err(error) => {
                completer.complete(Err(error));
                StepOutcome::Completed
            }
            Ok(inner) => {
                let gate: Arc<dyn TaskObserver> = outer.clone();
                link(outer, completer, inner.into_cell());
                StepOutcome::Pending(gate)
            }
        });
        (
            QueuedTask {
                weight,
                observer,
                step,
            },
            handle,
        )
    }
}

/// Ties an async task's outer cell to its inner cell: cancellation of the
/// outer cell propagates in, and the inner result transfers out when it
/// settles.
fn link<T: Send + 'static>(
    outer: Arc<TaskCell<T>>,
    completer: TaskCompleter<T>,
    inner: Arc<TaskCell<T>>,
) {
    let cancel_target = inner.clone();
    outer.set_cancel_hook(Box::new(move || {
        cancel_target.cancel();
    }));

    let transfer_source = inner.clone();
    inner.on_settle(Box::new(move || {
        completer.complete(transfer_source.take());
    }));
}
