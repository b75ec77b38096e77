//! Executor traits and a thread-pool implementation.
//!
//! Workers borrow threads through [`Executor::execute`]; the rate limiter
//! additionally needs [`ScheduledExecutor::schedule`] to arm its reset
//! timer. [`ThreadPoolExecutor`] provides both: a fixed set of worker
//! threads fed from an MPMC channel, plus a timer thread that releases
//! delayed tasks into the same channel when they come due.

use std::{
    cmp::Ordering as CmpOrdering,
    collections::BinaryHeap,
    sync::{Arc, Condvar, Mutex},
    thread,
    time::{Duration, Instant},
};

/// A task submitted for execution.
pub type Task = Box<dyn FnOnce() + Send>;

/// Immediate task execution on borrowed threads.
///
/// The executor must preserve submission order well enough that a task
/// submitted after another task's completion observes that completion;
/// beyond that, workers are executor-agnostic.
pub trait Executor: Send + Sync {
    fn execute(&self, task: Task);
}

/// An [`Executor`] that can additionally run a task after a delay.
pub trait ScheduledExecutor: Executor {
    fn schedule(&self, delay: Duration, task: Task);
}

/// A fixed-size thread pool with a delay timer.
///
/// Worker threads drain an unbounded MPMC channel in FIFO order. Scheduled
/// tasks sit in a timer heap until due, then enter the same channel. All
/// clones of the pool share the worker threads; threads wind down when the
/// last clone is dropped and the channel disconnects.
#[derive(Clone)]
pub struct ThreadPoolExecutor(Arc<PoolShared>);

struct PoolShared {
    sender: crossbeam_channel::Sender<Task>,
    timer: Arc<Timer>,
}

impl ThreadPoolExecutor {
    /// Creates a pool with `num_threads` unnamed worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `num_threads` is 0.
    pub fn new(num_threads: usize) -> ThreadPoolExecutor {
        Self::with_thread_name(num_threads, |_| String::new())
    }

    /// Creates a pool whose worker threads are named by `thread_name`,
    /// called with each thread's index. An empty name leaves the thread
    /// unnamed.
    ///
    /// # Panics
    ///
    /// Panics if `num_threads` is 0.
    pub fn with_thread_name(
        num_threads: usize,
        thread_name: impl Fn(usize) -> String,
    ) -> ThreadPoolExecutor {
        assert_ne!(num_threads, 0);

        let (sender, receiver) = crossbeam_channel::unbounded::<Task>();
        for i in 0..num_threads {
            let receiver = receiver.clone();
            let mut builder = thread::Builder::new();
            let name = thread_name(i);
            if !name.is_empty() {
                builder = builder.name(name);
            }
            builder
                .spawn(move || Self::thread_fn(receiver))
                .expect("spawn worker thread");
        }

        let timer = Timer::start(sender.clone());
        ThreadPoolExecutor(Arc::new(PoolShared { sender, timer }))
    }

    fn thread_fn(receiver: crossbeam_channel::Receiver<Task>) {
        while let Ok(task) = receiver.recv() {
            task();
        }
    }
}

impl Executor for ThreadPoolExecutor {
    fn execute(&self, task: Task) {
        self.0
            .sender
            .send(task)
            .expect("must have listening worker threads");
    }
}

impl ScheduledExecutor for ThreadPoolExecutor {
    fn schedule(&self, delay: Duration, task: Task) {
        self.0.timer.schedule(Instant::now() + delay, task);
    }
}

impl Drop for PoolShared {
    fn drop(&mut self) {
        // Runs when the last pool clone goes away. Stopping the timer drops
        // its channel sender, which lets worker threads disconnect.
        self.timer.stop();
    }
}

/// Deadline-ordered task heap serviced by a dedicated thread.
struct Timer {
    state: Mutex<TimerState>,
    condvar: Condvar,
}

struct TimerState {
    heap: BinaryHeap<TimerEntry>,
    next_seq: u64,
    stopped: bool,
}

struct TimerEntry {
    deadline: Instant,
    seq: u64,
    task: Task,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    /// Reversed so the earliest deadline sits at the top of the max-heap;
    /// ties release in submission order.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        (other.deadline, other.seq).cmp(&(self.deadline, self.seq))
    }
}

impl Timer {
    fn start(sender: crossbeam_channel::Sender<Task>) -> Arc<Timer> {
        let timer = Arc::new(Timer {
            state: Mutex::new(TimerState {
                heap: BinaryHeap::new(),
                next_seq: 0,
                stopped: false,
            }),
            condvar: Condvar::new(),
        });
        let thread_timer = timer.clone();
        thread::Builder::new()
            .name("mikta-timer".to_string())
            .spawn(move || Self::thread_fn(thread_timer, sender))
            .expect("spawn timer thread");
        timer
    }

    fn schedule(&self, deadline: Instant, task: Task) {
        let mut state = self.state.lock().unwrap();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.heap.push(TimerEntry {
            deadline,
            seq,
            task,
        });
        self.condvar.notify_one();
    }

    fn stop(&self) {
        self.state.lock().unwrap().stopped = true;
        self.condvar.notify_one();
    }

    fn thread_fn(timer: Arc<Timer>, sender: crossbeam_channel::Sender<Task>) {
        let mut state = timer.state.lock().unwrap();
        loop {
            if state.stopped {
                return;
            }
            let now = Instant::now();
            match state.heap.peek() {
                Some(entry) if entry.deadline <= now => {
                    let entry = state.heap.pop().expect("peeked entry");
                    drop(state);
                    // A disconnected channel means the pool is gone; the
                    // remaining entries are dropped with the timer.
                    if sender.send(entry.task).is_err() {
                        return;
                    }
                    state = timer.state.lock().unwrap();
                }
                Some(entry) => {
                    let wait = entry.deadline - now;
                    state = timer.condvar.wait_timeout(state, wait).unwrap().0;
                }
                None => {
                    state = timer.condvar.wait(state).unwrap();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[test]
    fn test_execute_runs_tasks() {
        let pool = ThreadPoolExecutor::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let counter = counter.clone();
            pool.execute(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_execute_runs_off_caller_thread() {
        let pool = ThreadPoolExecutor::new(1);
        let (tx, rx) = std::sync::mpsc::channel();
        pool.execute(Box::new(move || {
            tx.send(std::thread::current().id()).unwrap();
        }));
        let worker_id = rx.recv().unwrap();
        assert_ne!(worker_id, std::thread::current().id());
    }

    #[test]
    fn test_schedule_respects_delay() {
        let pool = ThreadPoolExecutor::new(1);
        let (tx, rx) = std::sync::mpsc::channel();
        let start = Instant::now();
        pool.schedule(
            Duration::from_millis(50),
            Box::new(move || {
                tx.send(Instant::now()).unwrap();
            }),
        );
        let fired = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(fired.duration_since(start) >= Duration::from_millis(50));
    }

    #[test]
    fn test_schedule_ordering() {
        let pool = ThreadPoolExecutor::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = std::sync::mpsc::channel();

        for (delay, tag) in [(80u64, 3), (20, 1), (50, 2)] {
            let order = order.clone();
            let tx = tx.clone();
            pool.schedule(
                Duration::from_millis(delay),
                Box::new(move || {
                    order.lock().unwrap().push(tag);
                    tx.send(()).unwrap();
                }),
            );
        }
        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(2)).unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_named_threads() {
        let pool = ThreadPoolExecutor::with_thread_name(1, |i| format!("mikta-worker-{i}"));
        let (tx, rx) = std::sync::mpsc::channel();
        pool.execute(Box::new(move || {
            tx.send(std::thread::current().name().map(str::to_string))
                .unwrap();
        }));
        assert_eq!(rx.recv().unwrap().as_deref(), Some("mikta-worker-0"));
    }
}
