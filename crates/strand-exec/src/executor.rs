//! The public-facing `Executor`: owns the worker threads and exposes
//! `submit`/`sync`/`set_task_limit`/`stats`, draining and joining workers on
//! `Drop`.

use crate::core::Inner;
use crate::task::TaskBody;
use crate::{kdebug, kerror};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use strand_core::config::ExecutorParams;
use strand_core::error::ExecutorError;
use strand_core::kprint;

/// Identifies a strand, derived from a caller's key via `key % num_strands`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExecutorId(pub u32);

impl ExecutorId {
    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Adaptive sequenced task executor.
///
/// Tasks submitted against the same strand run strictly in FIFO order on at
/// most one worker thread at a time; tasks on different strands may run in
/// parallel up to `num_threads`.
pub struct Executor {
    inner: Arc<Inner>,
    handles: Vec<JoinHandle<()>>,
}

impl Executor {
    /// Spawn the worker pool and return a ready-to-use executor.
    ///
    /// Panics if `params` was built with zero strands, zero threads, more
    /// than 255 threads, zero `max_waiting`, or zero `max_pending` — these
    /// are caught earlier by `ExecutorConfig::build`, but are re-asserted
    /// here since `Inner` assumes them.
    pub fn new(params: ExecutorParams) -> Self {
        assert!(params.num_strands() > 0, "num_strands must be at least 1");
        assert!(params.num_threads() > 0, "num_threads must be at least 1");
        assert!(params.num_threads() <= 255, "num_threads must not exceed 255");
        assert!(params.max_waiting() > 0, "max_waiting must be at least 1");
        assert!(params.max_pending() > 0, "max_pending must be at least 1");

        let inner = Arc::new(Inner::new(
            params.num_strands(),
            params.num_threads(),
            params.max_waiting(),
            params.max_pending(),
            params.wakeup_limit(),
        ));

        let mut handles = Vec::with_capacity(params.num_threads());
        for worker_id in 0..params.num_threads() as u32 {
            let inner = Arc::clone(&inner);
            let handle = thread::Builder::new()
                .name(format!("strand-worker-{}", worker_id))
                .spawn(move || worker_main(inner, worker_id))
                .expect("failed to spawn strand worker thread");
            handles.push(handle);
        }

        Executor { inner, handles }
    }

    /// Maps a caller-supplied key to a strand id. Pure function of
    /// `num_strands`.
    pub fn executor_id(&self, key: u64) -> ExecutorId {
        ExecutorId((key % self.inner.num_strands as u64) as u32)
    }

    /// Enqueue `task` against `id`'s strand. Blocks on backpressure. Returns
    /// the task back to the caller, wrapped in `ExecutorError::Closed`, if
    /// the executor has already started shutting down.
    pub fn submit<F>(&self, id: ExecutorId, task: F) -> Result<(), ExecutorError<TaskBody>>
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner
            .submit(id.0, Box::new(task))
            .map_err(ExecutorError::Closed)
    }

    /// Blocks until every task submitted strictly before this call has
    /// completed.
    pub fn sync(&self) {
        self.inner.sync();
    }

    /// Reconfigures `max_pending` (and its derived `wakeup_limit`),
    /// potentially unblocking producers immediately.
    pub fn set_task_limit(&self, max_pending: usize) {
        self.inner.set_task_limit(max_pending);
    }

    /// Snapshot of accepted-task count and queue-size samples accumulated
    /// since the last call; resets the counters.
    pub fn stats(&self) -> crate::stats::Stats {
        self.inner.stats()
    }

    /// Test-only hook: transition to CLOSED without draining or joining
    /// workers, so `submit`'s shutdown-rejection path can be exercised while
    /// the `Executor` is still alive. `close` is idempotent, so the normal
    /// `Drop` impl still runs safely afterward.
    #[cfg(test)]
    fn close_for_test(&self) {
        self.inner.close();
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.inner.sync();
        self.inner.close();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_main(inner: Arc<Inner>, worker_id: u32) {
    kprint::set_worker_id(worker_id);
    let mut prev_token: Option<u32> = None;
    loop {
        match inner.next_task(worker_id, prev_token) {
            Some((strand_id, task)) => {
                kprint::set_strand_id(Some(strand_id));
                kdebug!("running task on strand {}", strand_id);
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task.body)) {
                    kerror!("task panicked on strand {}: {}", strand_id, describe_panic(&payload));
                }
                prev_token = Some(task.token);
            }
            None => break,
        }
    }
    kprint::clear_worker_id();
    kprint::set_strand_id(None);
}

fn describe_panic(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use strand_core::ExecutorConfig;

    fn small_executor() -> Executor {
        let params = ExecutorConfig::new()
            .num_strands(4)
            .num_threads(2)
            .max_waiting(10)
            .max_pending(100)
            .build()
            .unwrap();
        Executor::new(params)
    }

    #[test]
    fn test_fifo_within_strand() {
        let exec = small_executor();
        let id = exec.executor_id(7);
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..50 {
            let order = Arc::clone(&order);
            exec.submit(id, move || {
                order.lock().unwrap().push(i);
            })
            .unwrap();
        }
        exec.sync();
        let order = order.lock().unwrap();
        let expected: Vec<i32> = (0..50).collect();
        assert_eq!(*order, expected);
    }

    #[test]
    fn test_parallelism_across_strands() {
        let exec = small_executor();
        let counter = Arc::new(AtomicUsize::new(0));
        for key in 0..4u64 {
            let id = exec.executor_id(key);
            let counter = Arc::clone(&counter);
            exec.submit(id, move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        exec.sync();
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_sync_on_quiescent_executor_returns_immediately() {
        let exec = small_executor();
        exec.sync();
    }

    #[test]
    fn test_stats_round_trip_on_quiescent_executor() {
        let exec = small_executor();
        let _ = exec.stats();
        let stats = exec.stats();
        assert_eq!(stats.accepted_tasks, 0);
    }

    #[test]
    fn test_drop_with_no_pending_work_joins_cleanly() {
        let exec = small_executor();
        drop(exec);
    }

    #[test]
    fn test_submit_after_close_is_rejected_and_hands_back_task() {
        let exec = small_executor();
        exec.close_for_test();

        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = Arc::clone(&ran);
        let result = exec.submit(exec.executor_id(0), move || {
            ran2.fetch_add(1, Ordering::SeqCst);
        });

        let body = match result {
            Err(ExecutorError::Closed(body)) => body,
            Ok(()) => panic!("submit after close should be rejected"),
        };
        assert_eq!(ran.load(Ordering::SeqCst), 0, "rejected task must not run");

        // The returned body is the exact task handed back, not a stand-in.
        body();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_task_does_not_break_the_strand() {
        let exec = small_executor();
        let id = exec.executor_id(1);
        let ran_after = Arc::new(AtomicUsize::new(0));

        exec.submit(id, || panic!("boom")).unwrap();
        let ran_after2 = Arc::clone(&ran_after);
        exec.submit(id, move || {
            ran_after2.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        exec.sync();
        assert_eq!(ran_after.load(Ordering::SeqCst), 1);
    }
}
