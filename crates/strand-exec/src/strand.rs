//! The strand table: one FIFO lane per `key mod num_strands`.

use crate::task::TaggedTask;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrandState {
    Idle,
    Waiting,
    Active,
}

pub struct Strand {
    pub state: StrandState,
    pub queue: VecDeque<TaggedTask>,
}

impl Strand {
    pub fn new() -> Self {
        Strand {
            state: StrandState::Idle,
            queue: VecDeque::new(),
        }
    }
}

impl Default for Strand {
    fn default() -> Self {
        Self::new()
    }
}
