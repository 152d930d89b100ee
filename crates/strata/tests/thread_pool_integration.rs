//! Integration tests for the work-stealing thread pool scheduler

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use strata::{kinds, AsyncTask, ErrorKind, ErrorValue, PoolConfig, TaskState, ThreadPoolScheduler};

static REJECTED: ErrorKind = ErrorKind::extends("Rejected", &kinds::RUNTIME);

fn pool(workers: usize) -> ThreadPoolScheduler {
    ThreadPoolScheduler::new(PoolConfig::default().with_workers(workers)).unwrap()
}

/// Poll `condition` until it holds or five seconds pass
fn eventually(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn test_tasks_resolve_without_wait() {
    let pool = pool(2);
    let task = pool.scheduler().schedule(|| Ok(10)).then(|v| Ok(v + 1));

    assert!(eventually(|| task.is_resolved()));
    assert_eq!(task.peek().value(), Some(&11));
}

#[test]
fn test_concurrent_waiters_run_body_once() {
    let pool = pool(4);
    let runs = Arc::new(AtomicUsize::new(0));

    let counter = runs.clone();
    let task = pool.scheduler().schedule(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        Ok(99)
    });

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let task = task.clone();
            thread::spawn(move || task.wait().unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 99);
    }
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_chain_order_under_contention() {
    let pool = pool(4);
    let log = Arc::new(Mutex::new(Vec::new()));

    let root_log = log.clone();
    let mut nodes: Vec<AsyncTask<usize>> = vec![pool.scheduler().schedule(move || {
        root_log.lock().push(0);
        Ok(0)
    })];
    for step in 1..50 {
        let step_log = log.clone();
        let next = nodes[step - 1].then(move |v| {
            step_log.lock().push(step);
            Ok(v + 1)
        });
        nodes.push(next);
    }

    let handles: Vec<_> = nodes
        .iter()
        .rev()
        .cloned()
        .map(|node| thread::spawn(move || node.wait().unwrap()))
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let expected: Vec<usize> = (0..50).collect();
    assert_eq!(*log.lock(), expected);
    for (index, node) in nodes.iter().enumerate() {
        assert_eq!(node.peek().value(), Some(&index));
    }
}

#[test]
fn test_fan_out_runs_root_once() {
    let pool = pool(4);
    let runs = Arc::new(AtomicUsize::new(0));

    let counter = runs.clone();
    let root = pool.scheduler().schedule(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(7)
    });
    let children: Vec<_> = (0..64).map(|i| root.then(move |v| Ok(v * i))).collect();

    for (i, child) in children.iter().enumerate() {
        assert_eq!(child.wait().unwrap(), 7 * i);
    }
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(root.children().len(), 64);
}

#[test]
fn test_then_result_on_pool() {
    let pool = pool(2);
    let inner = pool.scheduler().clone();
    let task = pool
        .scheduler()
        .schedule(|| Ok(20))
        .then_result(move |v| inner.schedule(move || Ok(v + 22)).into());
    assert_eq!(task.wait().unwrap(), 42);
}

#[test]
fn test_failure_and_recovery_on_pool() {
    let pool = pool(2);
    let failed = pool
        .scheduler()
        .schedule(|| Err::<i32, _>(ErrorValue::new(&REJECTED, "no")));
    let recovered = failed.catch_error(&kinds::RUNTIME, |_| Ok(1));
    let unrecovered = failed.catch_error(&kinds::ILLEGAL_ARGUMENT, |_| Ok(2));

    assert_eq!(recovered.wait().unwrap(), 1);
    let err = unrecovered.wait().unwrap_err();
    assert_eq!(err.kind(), &kinds::AWAIT);
    assert_eq!(err.cause().unwrap().kind(), &REJECTED);
    assert_eq!(failed.state(), TaskState::Failed);
}

#[test]
fn test_panicking_body_does_not_kill_worker() {
    let pool = pool(1);
    let broken = pool
        .scheduler()
        .schedule(|| -> strata::TaskResult<i32> { panic!("worker body panic") });
    assert_eq!(broken.wait_expecting(&kinds::PANIC).unwrap_err().kind(), &kinds::PANIC);

    let healthy = pool.scheduler().schedule(|| Ok(5));
    assert!(eventually(|| healthy.is_resolved()));
    assert_eq!(healthy.wait().unwrap(), 5);
}

#[test]
fn test_stats_count_created_and_executed() {
    let pool = pool(2);
    let scheduler = pool.scheduler().clone();
    let tasks: Vec<_> = (0..10).map(|i| scheduler.schedule(move || Ok(i))).collect();
    for task in &tasks {
        task.wait().unwrap();
    }

    let stats = scheduler.stats();
    assert_eq!(stats.tasks_created, 10);
    assert_eq!(stats.tasks_executed, 10);
}

#[test]
fn test_shutdown_with_pending_chain() {
    let mut pool = pool(2);
    let gate = Arc::new(Mutex::new(()));
    let held = gate.lock();

    let body_gate = gate.clone();
    let root = pool.scheduler().schedule(move || {
        let _open = body_gate.lock();
        Ok(1)
    });
    let child = root.then(|v| Ok(v + 1));

    drop(held);
    pool.shutdown();

    assert_eq!(child.wait().unwrap(), 2);
    assert_eq!(root.wait().unwrap(), 1);
}
