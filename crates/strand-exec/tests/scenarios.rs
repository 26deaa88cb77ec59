//! End-to-end scenarios exercising the public `Executor` API across
//! multiple threads.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use strand_core::ExecutorConfig;
use strand_exec::Executor;

fn executor(num_strands: usize, num_threads: usize, max_waiting: usize, max_pending: usize) -> Executor {
    let params = ExecutorConfig::new()
        .num_strands(num_strands)
        .num_threads(num_threads)
        .max_waiting(max_waiting)
        .max_pending(max_pending)
        .build()
        .unwrap();
    Executor::new(params)
}

/// Scenario 1: FIFO within a strand.
#[test]
fn fifo_within_a_strand() {
    let exec = executor(8, 4, 100, 1000);
    let id = exec.executor_id(3);
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..200 {
        let order = Arc::clone(&order);
        exec.submit(id, move || {
            order.lock().unwrap().push(i);
        })
        .unwrap();
    }
    exec.sync();

    let order = order.lock().unwrap();
    let expected: Vec<i32> = (0..200).collect();
    assert_eq!(*order, expected);
}

/// Scenario 2: parallelism across strands — with enough strands and
/// threads, concurrently-running tasks on different strands should overlap.
#[test]
fn parallelism_across_strands() {
    let num_strands = 8;
    let exec = executor(num_strands, num_strands, 1000, 1000);

    let concurrent = Arc::new(AtomicUsize::new(0));
    let max_concurrent = Arc::new(AtomicUsize::new(0));
    let barrier_done = Arc::new(std::sync::Barrier::new(num_strands));

    for key in 0..num_strands as u64 {
        let id = exec.executor_id(key);
        let concurrent = Arc::clone(&concurrent);
        let max_concurrent = Arc::clone(&max_concurrent);
        let barrier_done = Arc::clone(&barrier_done);
        exec.submit(id, move || {
            let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            max_concurrent.fetch_max(now, Ordering::SeqCst);
            barrier_done.wait();
            concurrent.fetch_sub(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    exec.sync();
    assert_eq!(max_concurrent.load(Ordering::SeqCst), num_strands);
}

/// Scenario 3: backpressure with hysteresis — submitting `max_pending` tasks
/// that block on a gate should not block submission; one more should block
/// the producer until the queue drains below `wakeup_limit`.
#[test]
fn backpressure_with_hysteresis() {
    let max_pending = 20;
    let exec = Arc::new(executor(1, 1, 100, max_pending));
    let id = exec.executor_id(0);

    let release = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let started = Arc::new(AtomicUsize::new(0));

    // One long-running task occupies the single worker so the queue backs up.
    {
        let release = Arc::clone(&release);
        let started = Arc::clone(&started);
        exec.submit(id, move || {
            started.fetch_add(1, Ordering::SeqCst);
            while !release.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
        })
        .unwrap();
    }

    while started.load(Ordering::SeqCst) == 0 {
        thread::sleep(Duration::from_millis(1));
    }

    // Fill up to max_pending - 1 more (the first task is still pending too).
    for _ in 0..(max_pending - 1) {
        exec.submit(id, || {}).unwrap();
    }

    // The next submit should block until the running task releases and
    // drains the queue below wakeup_limit. Prove it blocks by racing a
    // timeout thread against it.
    let exec2 = Arc::clone(&exec);
    let blocked = Arc::new(std::sync::atomic::AtomicBool::new(true));
    let blocked2 = Arc::clone(&blocked);
    let id2 = id;
    let handle = thread::spawn(move || {
        exec2.submit(id2, || {}).unwrap();
        blocked2.store(false, Ordering::SeqCst);
    });

    thread::sleep(Duration::from_millis(50));
    assert!(blocked.load(Ordering::SeqCst), "submit should have blocked under backpressure");

    release.store(true, Ordering::SeqCst);
    handle.join().unwrap();
    exec.sync();
}

/// Scenario 4: barrier after partial completion — `sync()` only waits on
/// tasks submitted strictly before the call.
#[test]
fn barrier_after_partial_completion() {
    let exec = executor(4, 4, 100, 1000);
    let ran_before = Arc::new(AtomicUsize::new(0));
    let ran_after = Arc::new(AtomicUsize::new(0));

    for key in 0..4u64 {
        let id = exec.executor_id(key);
        let ran_before = Arc::clone(&ran_before);
        exec.submit(id, move || {
            ran_before.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    exec.sync();
    assert_eq!(ran_before.load(Ordering::SeqCst), 4);

    for key in 0..4u64 {
        let id = exec.executor_id(key);
        let ran_after = Arc::clone(&ran_after);
        exec.submit(id, move || {
            ran_after.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    exec.sync();
    assert_eq!(ran_after.load(Ordering::SeqCst), 4);
}

/// Scenario 5: shutdown with queued work — dropping the executor drains all
/// pending tasks before workers exit.
#[test]
fn shutdown_with_queued_work() {
    let exec = executor(8, 4, 100, 1000);
    let completed = Arc::new(AtomicU64::new(0));

    for key in 0..200u64 {
        let id = exec.executor_id(key);
        let completed = Arc::clone(&completed);
        exec.submit(id, move || {
            completed.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    drop(exec);
    assert_eq!(completed.load(Ordering::SeqCst), 200);
}

/// Scenario 6: fairness under sustained load — flooding two strands with a
/// low `max_waiting` should keep both strands making progress rather than
/// starving one while the other drains.
#[test]
fn fairness_under_sustained_load() {
    let exec = Arc::new(executor(2, 2, 2, 4000));
    let id_a = exec.executor_id(0);
    let id_b = exec.executor_id(1);

    let completed_a = Arc::new(AtomicU64::new(0));
    let completed_b = Arc::new(AtomicU64::new(0));
    let total = 2000u64;

    let exec_a = Arc::clone(&exec);
    let completed_a2 = Arc::clone(&completed_a);
    let producer_a = thread::spawn(move || {
        for _ in 0..total {
            let completed_a2 = Arc::clone(&completed_a2);
            exec_a
                .submit(id_a, move || {
                    completed_a2.fetch_add(1, Ordering::Relaxed);
                })
                .unwrap();
        }
    });

    let exec_b = Arc::clone(&exec);
    let completed_b2 = Arc::clone(&completed_b);
    let producer_b = thread::spawn(move || {
        for _ in 0..total {
            let completed_b2 = Arc::clone(&completed_b2);
            exec_b
                .submit(id_b, move || {
                    completed_b2.fetch_add(1, Ordering::Relaxed);
                })
                .unwrap();
        }
    });

    producer_a.join().unwrap();
    producer_b.join().unwrap();
    exec.sync();

    assert_eq!(completed_a.load(Ordering::Relaxed), total);
    assert_eq!(completed_b.load(Ordering::Relaxed), total);
}

/// Invariant check: `num_threads = 1` serializes all tasks globally
/// regardless of strand key.
#[test]
fn single_thread_serializes_everything() {
    let exec = executor(8, 1, 100, 1000);
    let concurrent = Arc::new(AtomicUsize::new(0));
    let max_concurrent = Arc::new(AtomicUsize::new(0));

    for key in 0..50u64 {
        let id = exec.executor_id(key);
        let concurrent = Arc::clone(&concurrent);
        let max_concurrent = Arc::clone(&max_concurrent);
        exec.submit(id, move || {
            let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            max_concurrent.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_micros(200));
            concurrent.fetch_sub(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    exec.sync();
    assert_eq!(max_concurrent.load(Ordering::SeqCst), 1);
}

/// Invariant check: `num_strands = 1` serializes all tasks regardless of
/// thread count.
#[test]
fn single_strand_serializes_everything() {
    let exec = executor(1, 8, 100, 1000);
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..100 {
        let id = exec.executor_id(0);
        let order = Arc::clone(&order);
        exec.submit(id, move || {
            order.lock().unwrap().push(i);
        })
        .unwrap();
    }
    exec.sync();

    let order = order.lock().unwrap();
    let expected: Vec<i32> = (0..100).collect();
    assert_eq!(*order, expected);
}
