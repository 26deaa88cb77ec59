//! The scheduler core: the single lock-protected state machine that matches
//! strands to workers.
//!
//! Every field reachable from [`Shared`] is touched only while holding
//! [`Inner::shared`]. The per-worker condition variables and the shared
//! producer condition variable live on [`Inner`] itself, next to the mutex,
//! so `notify_one`/`notify_all` can be issued after the guard is dropped —
//! the same unlock-then-signal discipline the original implementation uses.

use crate::barrier::EventBarrier;
use crate::stats::Stats;
use crate::strand::{Strand, StrandState};
use crate::gate::Gate;
use crate::task::{TaggedTask, TaskBody};
use crate::worker::{WorkerRunState, WorkerSlot};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfState {
    Open,
    Blocked,
    Closed,
}

pub struct Shared {
    pub strands: Vec<Strand>,
    pub wait_queue: VecDeque<u32>,
    pub worker_stack: Vec<u32>,
    pub workers: Vec<WorkerSlot>,
    pub self_state: SelfState,
    pub waiting_tasks: usize,
    pub pending_tasks: usize,
    pub barrier: EventBarrier,
    pub stats: Stats,
    pub max_pending: usize,
    pub wakeup_limit: usize,
}

/// Derives `wakeup_limit` from `max_pending`: `max(1, floor(0.9 * max_pending))`.
pub fn derive_wakeup_limit(max_pending: usize) -> usize {
    ((max_pending * 9) / 10).max(1)
}

pub struct Inner {
    pub shared: Mutex<Shared>,
    pub worker_conds: Vec<Condvar>,
    pub producer_cond: Condvar,
    pub num_strands: usize,
    pub num_threads: usize,
    pub max_waiting: usize,
}

impl Inner {
    pub fn new(num_strands: usize, num_threads: usize, max_waiting: usize, max_pending: usize, wakeup_limit: usize) -> Self {
        let strands = (0..num_strands).map(|_| Strand::new()).collect();
        let workers = (0..num_threads).map(|_| WorkerSlot::new()).collect();
        let worker_conds = (0..num_threads).map(|_| Condvar::new()).collect();
        let shared = Shared {
            strands,
            wait_queue: VecDeque::with_capacity(num_strands),
            worker_stack: Vec::with_capacity(num_threads),
            workers,
            self_state: SelfState::Open,
            waiting_tasks: 0,
            pending_tasks: 0,
            barrier: EventBarrier::new(),
            stats: Stats::default(),
            max_pending,
            wakeup_limit,
        };
        Inner {
            shared: Mutex::new(shared),
            worker_conds,
            producer_cond: Condvar::new(),
            num_strands,
            num_threads,
            max_waiting,
        }
    }

    /// Block the calling (producer) thread while backpressured.
    ///
    /// Mirrors `maybe_block_self`: first waits out any existing BLOCKED
    /// state left by another producer, then re-checks the pending-task
    /// threshold and blocks again if still over it.
    pub fn maybe_block_self<'a>(&self, mut guard: MutexGuard<'a, Shared>) -> MutexGuard<'a, Shared> {
        loop {
            while guard.self_state == SelfState::Blocked {
                guard = self.producer_cond.wait(guard).unwrap();
            }
            if guard.self_state == SelfState::Open && guard.pending_tasks >= guard.max_pending {
                guard.self_state = SelfState::Blocked;
                continue;
            }
            break;
        }
        guard
    }

    /// If backpressure can be lifted, flip state to OPEN and report that the
    /// producer condition should be broadcast once the lock is released.
    pub fn maybe_unblock_self(&self, shared: &mut Shared) -> bool {
        if shared.self_state == SelfState::Blocked && shared.pending_tasks < shared.wakeup_limit {
            shared.self_state = SelfState::Open;
            true
        } else {
            false
        }
    }

    /// If the wait queue has backed up beyond `max_waiting` and a worker is
    /// parked, wake it onto the head of the wait queue.
    pub fn get_worker_to_wake(&self, shared: &mut Shared) -> Option<u32> {
        if shared.waiting_tasks > self.max_waiting && !shared.worker_stack.is_empty() {
            debug_assert!(!shared.wait_queue.is_empty());
            let worker_id = shared.worker_stack.pop().unwrap();
            debug_assert_eq!(shared.workers[worker_id as usize].state, WorkerRunState::Blocked);
            debug_assert!(shared.workers[worker_id as usize].strand.is_none());
            let strand_id = shared.wait_queue.pop_front().unwrap();
            debug_assert_eq!(shared.strands[strand_id as usize].state, StrandState::Waiting);
            debug_assert!(!shared.strands[strand_id as usize].queue.is_empty());

            shared.workers[worker_id as usize].state = WorkerRunState::Running;
            shared.workers[worker_id as usize].strand = Some(strand_id);
            shared.strands[strand_id as usize].state = StrandState::Active;
            let qlen = shared.strands[strand_id as usize].queue.len();
            debug_assert!(shared.waiting_tasks >= qlen);
            shared.waiting_tasks -= qlen;
            Some(worker_id)
        } else {
            None
        }
    }

    /// Give `worker_id` a strand to work on, parking it if none is
    /// immediately available. Returns whether the worker ended up RUNNING
    /// (`false` means it was marked DONE and should exit).
    pub fn obtain_strand<'a>(&self, worker_id: u32, mut guard: MutexGuard<'a, Shared>) -> (MutexGuard<'a, Shared>, bool) {
        debug_assert!(guard.workers[worker_id as usize].strand.is_none());
        if let Some(strand_id) = guard.wait_queue.pop_front() {
            debug_assert_eq!(guard.strands[strand_id as usize].state, StrandState::Waiting);
            debug_assert!(!guard.strands[strand_id as usize].queue.is_empty());
            guard.strands[strand_id as usize].state = StrandState::Active;
            let qlen = guard.strands[strand_id as usize].queue.len();
            debug_assert!(guard.waiting_tasks >= qlen);
            guard.waiting_tasks -= qlen;
            guard.workers[worker_id as usize].strand = Some(strand_id);
        } else if guard.self_state == SelfState::Closed {
            guard.workers[worker_id as usize].state = WorkerRunState::Done;
        } else {
            guard.workers[worker_id as usize].state = WorkerRunState::Blocked;
            guard.worker_stack.push(worker_id);
            while guard.workers[worker_id as usize].state == WorkerRunState::Blocked {
                guard = self.worker_conds[worker_id as usize].wait(guard).unwrap();
            }
        }
        let running = guard.workers[worker_id as usize].state == WorkerRunState::Running;
        (guard, running)
    }

    /// Decide whether `worker_id` keeps its current strand, yields it back
    /// to the wait queue, releases it as idle, or needs a brand new one.
    pub fn exchange_strand<'a>(&self, worker_id: u32, guard: MutexGuard<'a, Shared>) -> (MutexGuard<'a, Shared>, bool) {
        let held = guard.workers[worker_id as usize].strand;
        let Some(strand_id) = held else {
            return self.obtain_strand(worker_id, guard);
        };
        let mut guard = guard;
        if guard.strands[strand_id as usize].queue.is_empty() {
            guard.strands[strand_id as usize].state = StrandState::Idle;
            guard.workers[worker_id as usize].strand = None;
            return self.obtain_strand(worker_id, guard);
        }
        if !guard.wait_queue.is_empty() {
            guard.strands[strand_id as usize].state = StrandState::Waiting;
            let qlen = guard.strands[strand_id as usize].queue.len();
            guard.waiting_tasks += qlen;
            guard.wait_queue.push_back(strand_id);
            guard.workers[worker_id as usize].strand = None;
            return self.obtain_strand(worker_id, guard);
        }
        (guard, true)
    }

    /// Take the next task for `worker_id`, completing `prev_token`'s barrier
    /// bookkeeping first. Returns `None` when the worker should exit, or the
    /// strand id the task came from alongside the task itself (used to keep
    /// the worker's logging context up to date).
    pub fn next_task(&self, worker_id: u32, prev_token: Option<u32>) -> Option<(u32, TaggedTask)> {
        let mut guard = self.shared.lock().unwrap();

        let mut due_barriers = Vec::new();
        if let Some(token) = prev_token {
            due_barriers = guard.barrier.complete_event(token);
        }

        let (mut guard, got_strand) = self.exchange_strand(worker_id, guard);

        let mut worker_to_wake = None;
        let task = if got_strand {
            let strand_id = guard.workers[worker_id as usize].strand.unwrap();
            debug_assert!(!guard.strands[strand_id as usize].queue.is_empty());
            let task = guard.strands[strand_id as usize].queue.pop_front().unwrap();
            guard.pending_tasks -= 1;
            let pending = guard.pending_tasks as u64;
            guard.stats.queue_size.add(pending);
            worker_to_wake = self.get_worker_to_wake(&mut guard);
            Some((strand_id, task))
        } else {
            debug_assert_eq!(guard.workers[worker_id as usize].state, WorkerRunState::Done);
            None
        };

        let signal_producers = self.maybe_unblock_self(&mut guard);
        drop(guard);

        for cb in due_barriers {
            cb();
        }
        if let Some(w) = worker_to_wake {
            self.worker_conds[w as usize].notify_one();
        }
        if signal_producers {
            self.producer_cond.notify_all();
        }
        task
    }

    /// Enqueue `body` against `strand_id`, blocking the caller on
    /// backpressure. Returns the task back to the caller if the executor is
    /// already CLOSED.
    pub fn submit(&self, strand_id: u32, body: TaskBody) -> Result<(), TaskBody> {
        let guard = self.shared.lock().unwrap();
        if guard.self_state == SelfState::Closed {
            return Err(body);
        }
        let mut guard = self.maybe_block_self(guard);
        debug_assert!(guard.self_state != SelfState::Closed);

        let token = guard.barrier.start_event();
        guard.strands[strand_id as usize]
            .queue
            .push_back(TaggedTask::new(body, token));
        guard.pending_tasks += 1;
        let pending = guard.pending_tasks as u64;
        guard.stats.accepted_tasks += 1;
        guard.stats.queue_size.add(pending);

        let mut worker_to_wake = None;
        match guard.strands[strand_id as usize].state {
            StrandState::Waiting => {
                guard.waiting_tasks += 1;
            }
            StrandState::Idle => {
                if guard.worker_stack.len() < self.num_threads {
                    guard.strands[strand_id as usize].state = StrandState::Waiting;
                    let qlen = guard.strands[strand_id as usize].queue.len();
                    guard.waiting_tasks += qlen;
                    guard.wait_queue.push_back(strand_id);
                } else {
                    guard.strands[strand_id as usize].state = StrandState::Active;
                    debug_assert!(guard.wait_queue.is_empty());
                    let worker_id = guard.worker_stack.pop().unwrap();
                    debug_assert_eq!(guard.workers[worker_id as usize].state, WorkerRunState::Blocked);
                    debug_assert!(guard.workers[worker_id as usize].strand.is_none());
                    guard.workers[worker_id as usize].state = WorkerRunState::Running;
                    guard.workers[worker_id as usize].strand = Some(strand_id);
                    worker_to_wake = Some(worker_id);
                }
            }
            StrandState::Active => {}
        }

        drop(guard);
        if let Some(w) = worker_to_wake {
            self.worker_conds[w as usize].notify_one();
        }
        Ok(())
    }

    /// Register a blocking barrier. Returns immediately if already satisfied.
    pub fn sync(&self) {
        let gate = std::sync::Arc::new(Gate::new());
        let queued = {
            let mut guard = self.shared.lock().unwrap();
            let gate = std::sync::Arc::clone(&gate);
            guard.barrier.start_barrier(Box::new(move || gate.count_down()))
        };
        if queued {
            gate.wait();
        }
    }

    /// Reconfigure `max_pending`/`wakeup_limit`, potentially unblocking
    /// producers immediately.
    pub fn set_task_limit(&self, max_pending: usize) {
        let mut guard = self.shared.lock().unwrap();
        guard.max_pending = max_pending.max(1);
        guard.wakeup_limit = derive_wakeup_limit(guard.max_pending);
        let signal_producers = self.maybe_unblock_self(&mut guard);
        drop(guard);
        if signal_producers {
            self.producer_cond.notify_all();
        }
    }

    /// Snapshot and reset the accumulated stats.
    pub fn stats(&self) -> Stats {
        let mut guard = self.shared.lock().unwrap();
        let stats = guard.stats;
        guard.stats = Stats::default();
        let pending = guard.pending_tasks as u64;
        guard.stats.queue_size.add(pending);
        stats
    }

    /// Initiate shutdown: mark CLOSED, wake every parked worker with DONE.
    /// Caller is responsible for calling `sync()` first to drain, and for
    /// joining worker threads afterward.
    ///
    /// Idempotent: a second call after the executor is already CLOSED is a
    /// no-op, since `Executor::drop` always calls this after any test-only
    /// early close.
    pub fn close(&self) {
        let mut guard = self.shared.lock().unwrap();
        if guard.self_state == SelfState::Closed {
            return;
        }
        guard.self_state = SelfState::Closed;
        let parked: Vec<u32> = guard.worker_stack.drain(..).collect();
        for &worker_id in &parked {
            debug_assert_eq!(guard.workers[worker_id as usize].state, WorkerRunState::Blocked);
            debug_assert!(guard.workers[worker_id as usize].strand.is_none());
            guard.workers[worker_id as usize].state = WorkerRunState::Done;
        }
        drop(guard);
        for &worker_id in &parked {
            self.worker_conds[worker_id as usize].notify_one();
        }
        self.producer_cond.notify_all();
    }
}
