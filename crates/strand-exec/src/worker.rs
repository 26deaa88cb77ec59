//! Per-worker scheduling state.
//!
//! The condition variable each worker parks on lives alongside the core
//! lock (see [`crate::core::Shared::worker_conds`]), not inside this struct —
//! it must be reachable for `notify_one` after the guard protecting
//! `WorkerSlot` has already been dropped.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRunState {
    Running,
    Blocked,
    Done,
}

pub struct WorkerSlot {
    pub state: WorkerRunState,
    pub strand: Option<u32>,
}

impl WorkerSlot {
    pub fn new() -> Self {
        WorkerSlot {
            state: WorkerRunState::Running,
            strand: None,
        }
    }
}

impl Default for WorkerSlot {
    fn default() -> Self {
        Self::new()
    }
}
