//! Weighted task admission gated by a periodic trigger.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use mikta_common::{Result, error::Error};

use crate::{
    clock::{Clock, SystemClock},
    completion::{self, TaskHandle},
    executor::ScheduledExecutor,
    task::{QueuedTask, StepOutcome},
    trigger::{Trigger, TriggerContext},
};

/// Admits weighted tasks so that the weight dispatched within one trigger
/// period never exceeds the limit.
///
/// Tasks queue in FIFO order. The head task is dispatched only when its
/// weight still fits the remaining budget; otherwise the queue halts until
/// the trigger's next reset zeroes the consumed weight. FIFO is preserved
/// across admission pauses: a delayed head blocks all successors, and a
/// head whose weight exceeds the limit outright blocks the queue
/// indefinitely.
///
/// Weight is consumed when a task is dispatched, not when an async task's
/// inner handle settles; a long-running async task holds the budget it was
/// admitted with, nothing more.
///
/// The reset loop arms itself on construction from a trigger context with
/// no previous execution, and after each firing re-seeds the context with
/// the fired instant. A trigger returning `None` ends the resets.
pub struct RateLimiterWorker {
    core: Arc<LimiterCore>,
}

struct LimiterCore {
    executor: Arc<dyn ScheduledExecutor>,
    trigger: Box<dyn Trigger>,
    clock: Arc<dyn Clock>,
    limit: u64,
    queue: Mutex<LimiterQueue>,
    processing: AtomicBool,
    retired: AtomicBool,
}

struct LimiterQueue {
    tasks: VecDeque<QueuedTask>,
    current_weight: u64,
}

impl RateLimiterWorker {
    /// Creates a limiter with the system clock. The first reset is armed
    /// immediately.
    pub fn new(
        executor: Arc<dyn ScheduledExecutor>,
        trigger: Box<dyn Trigger>,
        limit: u64,
    ) -> RateLimiterWorker {
        Self::with_clock(executor, trigger, limit, Arc::new(SystemClock))
    }

    /// Creates a limiter reading time from the given clock.
    pub fn with_clock(
        executor: Arc<dyn ScheduledExecutor>,
        trigger: Box<dyn Trigger>,
        limit: u64,
        clock: Arc<dyn Clock>,
    ) -> RateLimiterWorker {
        let core = Arc::new(LimiterCore {
            executor,
            trigger,
            clock,
            limit,
            queue: Mutex::new(LimiterQueue {
                tasks: VecDeque::new(),
                current_weight: 0,
            }),
            processing: AtomicBool::new(false),
            retired: AtomicBool::new(false),
        });
        LimiterCore::schedule_next_reset(&core, None, None);
        RateLimiterWorker { core }
    }

    /// Enqueues a synchronous action with the given admission weight.
    pub fn submit_task<T, F>(&self, weight: u64, action: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (task, handle) = QueuedTask::from_sync(weight, action);
        self.enqueue(task, handle)
    }

    /// Enqueues an asynchronous action with the given admission weight.
    pub fn submit_async_task<T, F>(&self, weight: u64, action: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<TaskHandle<T>> + Send + 'static,
    {
        let (task, handle) = QueuedTask::from_async(weight, action);
        self.enqueue(task, handle)
    }

    fn enqueue<T>(&self, task: QueuedTask, handle: TaskHandle<T>) -> TaskHandle<T> {
        {
            let mut queue = self.core.queue.lock().unwrap();
            if self.core.retired.load(Ordering::SeqCst) {
                return completion::failed(Error::invalid_state("worker is retired"));
            }
            queue.tasks.push_back(task);
        }
        LimiterCore::maybe_schedule(&self.core);
        handle
    }

    /// Weight consumed since the last reset.
    pub fn current_weight(&self) -> u64 {
        self.core.queue.lock().unwrap().current_weight
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
            .tasks
            .iter()
            .filter(|task| !task.observer.is_settled())
            .count()
    }

    pub fn is_retired(&self) -> bool {
        self.core.retired.load(Ordering::SeqCst)
    }

    /// Retires the limiter: cancels every pending task, prevents further
    /// dispatch, and lets future reset firings fall through. Terminal.
    pub fn retire(&self) {
        let drained: Vec<QueuedTask> = {
            let mut queue = self.core.queue.lock().unwrap();
            self.core.retired.store(true, Ordering::SeqCst);
            queue.tasks.drain(..).collect()
        };
        for task in drained {
            task.observer.cancel_task();
        }
    }
}

impl LimiterCore {
    /// Arms the next reset from the trigger. `last_scheduled` and
    /// `last_completion` thread the previous firing through; both are
    /// `None` on construction.
    fn schedule_next_reset(
        core: &Arc<LimiterCore>,
        last_scheduled: Option<Instant>,
        last_completion: Option<Instant>,
    ) {
        let now = core.clock.now();
        let context = TriggerContext {
            now,
            last_scheduled,
            last_completion,
        };
        let Some(next) = core.trigger.next_execution(&context) else {
            return;
        };
        let delay = next.saturating_duration_since(now);
        let fired = core.clone();
        core.executor
            .schedule(delay, Box::new(move || Self::on_reset(fired, next)));
    }

    /// A reset firing: zero the consumed weight, re-arm the trigger, then
    /// try to drain.
    fn on_reset(core: Arc<LimiterCore>, scheduled_for: Instant) {
        if core.retired.load(Ordering::SeqCst) {
            return;
        }
        core.queue.lock().unwrap().current_weight = 0;
        let completed = core.clock.now();
        Self::schedule_next_reset(&core, Some(scheduled_for), Some(completed));
        Self::maybe_schedule(&core);
    }

    fn maybe_schedule(core: &Arc<LimiterCore>) {
        if core.retired.load(Ordering::SeqCst) {
            return;
        }
        if core.queue.lock().unwrap().tasks.is_empty() {
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

    fn drive(core: Arc<LimiterCore>) {
        loop {
            let Some(task) = core.next_admitted_task() else {
                core.processing.store(false, Ordering::SeqCst);
                // An admission may have become possible while releasing the
                // token; reclaim only if the head fits now.
                if !core.retired.load(Ordering::SeqCst)
                    && core.head_admittable()
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
                    let driver = core.clone();
                    gate.on_settle(Box::new(move || Self::resume(driver)));
                    return;
                }
            }
        }
    }

    fn resume(core: Arc<LimiterCore>) {
        let executor = core.executor.clone();
        let driver = core;
        executor.execute(Box::new(move || Self::drive(driver)));
    }

    /// Pops the head task when its weight fits the remaining budget,
    /// consuming that weight. Cancelled entries are skipped. Returns `None`
    /// when the queue is empty, the head does not fit, or the limiter is
    /// retired.
    fn next_admitted_task(&self) -> Option<QueuedTask> {
        let mut queue = self.queue.lock().unwrap();
        if self.retired.load(Ordering::SeqCst) {
            return None;
        }
        loop {
            let task = queue.tasks.front()?;
            if task.observer.is_settled() {
                queue.tasks.pop_front();
                continue;
            }
            let admitted = queue
                .current_weight
                .checked_add(task.weight)
                .is_some_and(|total| total <= self.limit);
            if !admitted {
                return None;
            }
            queue.current_weight += task.weight;
            return queue.tasks.pop_front();
        }
    }

    /// True when the live head task would be admitted under the current
    /// budget.
    fn head_admittable(&self) -> bool {
        let queue = self.queue.lock().unwrap();
        queue
            .tasks
            .iter()
            .find(|task| !task.observer.is_settled())
            .is_some_and(|task| {
                queue
                    .current_weight
                    .checked_add(task.weight)
                    .is_some_and(|total| total <= self.limit)
            })
    }
}
