//! Event barrier: maps submitted tasks to sequence tokens and fires a
//! callback once every token issued before a registration point has
//! completed.
//!
//! Lives inside [`crate::core::Core`], so all bookkeeping here happens under
//! the executor's single mutex. Firing a callback is split from calling it:
//! [`EventBarrier::complete_event`] returns the callbacks that became due so
//! the caller can invoke them after releasing the lock.

use std::collections::BTreeSet;

type Callback = Box<dyn FnOnce() + Send>;

struct PendingBarrier {
    /// Fires once no outstanding token is less than this threshold.
    threshold: u32,
    callback: Callback,
}

#[derive(Default)]
pub struct EventBarrier {
    next_token: u32,
    outstanding: BTreeSet<u32>,
    pending: Vec<PendingBarrier>,
}

impl EventBarrier {
    pub fn new() -> Self {
        EventBarrier {
            next_token: 0,
            outstanding: BTreeSet::new(),
            pending: Vec::new(),
        }
    }

    /// Issue a token for a newly submitted task.
    pub fn start_event(&mut self) -> u32 {
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        self.outstanding.insert(token);
        token
    }

    /// Record completion of `token`. Returns callbacks that are now due.
    pub fn complete_event(&mut self, token: u32) -> Vec<Callback> {
        self.outstanding.remove(&token);
        if self.pending.is_empty() {
            return Vec::new();
        }
        let mut due = Vec::new();
        let mut still_pending = Vec::with_capacity(self.pending.len());
        for p in self.pending.drain(..) {
            if self.outstanding.range(..p.threshold).next().is_some() {
                still_pending.push(p);
            } else {
                due.push(p.callback);
            }
        }
        self.pending = still_pending;
        due
    }

    /// Register a barrier callback. Returns `false` if the barrier condition
    /// is already satisfied (no outstanding token precedes it) — the caller
    /// should treat the barrier as already complete and must not expect the
    /// callback to be invoked. Returns `true` if the callback was queued and
    /// will fire later via [`EventBarrier::complete_event`].
    pub fn start_barrier(&mut self, callback: Callback) -> bool {
        let threshold = self.next_token;
        if self.outstanding.range(..threshold).next().is_none() {
            return false;
        }
        self.pending.push(PendingBarrier { threshold, callback });
        true
    }
}
