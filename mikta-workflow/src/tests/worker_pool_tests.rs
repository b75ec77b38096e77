use std::{sync::Arc, time::Duration};

use crate::{SequentialWorkerPool, ThreadPoolExecutor};

fn pool(flush_millis: u64) -> SequentialWorkerPool<String> {
    let executor = Arc::new(ThreadPoolExecutor::new(2));
    SequentialWorkerPool::with_flush_interval(executor, Duration::from_millis(flush_millis))
}

#[test]
fn test_get_creates_lazily_and_returns_same_worker() {
    let pool = pool(60_000);
    assert!(pool.is_empty());

    let w1 = pool.get(&"a".to_string());
    let w2 = pool.get(&"a".to_string());
    assert!(Arc::ptr_eq(&w1, &w2));
    assert_eq!(pool.len(), 1);

    let other = pool.get(&"b".to_string());
    assert!(!Arc::ptr_eq(&w1, &other));
    assert_eq!(pool.len(), 2);
}

#[test]
fn test_workers_from_pool_run_tasks() {
    let pool = pool(60_000);
    let worker = pool.get(&"k".to_string());
    assert_eq!(worker.submit_task(|| Ok(5)).join().unwrap(), 5);
}

#[test]
fn test_idle_worker_is_reaped_and_retired() {
    let pool = pool(100);
    let original = pool.get(&"k".to_string());

    // no tasks submitted; after the flush interval the next get reaps the
    // idle worker and creates a fresh one
    std::thread::sleep(Duration::from_millis(150));
    let replacement = pool.get(&"k".to_string());

    assert!(!Arc::ptr_eq(&original, &replacement));
    assert!(original.is_retired());
    assert!(!replacement.is_retired());
}

#[test]
fn test_flush_skips_non_idle_workers() {
    let pool = pool(100);
    let busy = pool.get(&"busy".to_string());
    let idle = pool.get(&"idle".to_string());

    // keep one worker non-idle with a queued task behind a disabled gate
    busy.disable();
    let queued = busy.submit_task(|| Ok(()));

    std::thread::sleep(Duration::from_millis(150));
    let busy_again = pool.get(&"busy".to_string());
    let idle_again = pool.get(&"idle".to_string());

    assert!(Arc::ptr_eq(&busy, &busy_again));
    assert!(!busy.is_retired());
    assert!(!Arc::ptr_eq(&idle, &idle_again));
    assert!(idle.is_retired());

    busy.enable();
    queued.join().unwrap();
}

#[test]
fn test_explicit_flush_reaps_immediately() {
    let pool = pool(60_000);
    let worker = pool.get(&"k".to_string());
    assert_eq!(pool.len(), 1);

    pool.flush();
    assert_eq!(pool.len(), 0);
    assert!(worker.is_retired());
}

#[test]
fn test_flush_throttle_does_not_reap_early() {
    let pool = pool(60_000);
    let worker = pool.get(&"k".to_string());

    // well inside the flush interval: repeated gets keep the same worker
    for _ in 0..10 {
        assert!(Arc::ptr_eq(&worker, &pool.get(&"k".to_string())));
    }
    assert!(!worker.is_retired());
}
