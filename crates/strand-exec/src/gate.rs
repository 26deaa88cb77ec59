//! A one-shot countdown latch, analogous to the original `vespalib::Gate`.

use std::sync::{Condvar, Mutex};

/// Released exactly once via [`Gate::count_down`]; any number of threads may
/// block on [`Gate::wait`] until that happens.
pub struct Gate {
    done: Mutex<bool>,
    cond: Condvar,
}

impl Gate {
    pub fn new() -> Self {
        Gate {
            done: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Release the gate, waking every waiter.
    pub fn count_down(&self) {
        let mut done = self.done.lock().unwrap();
        *done = true;
        self.cond.notify_all();
    }

    /// Block until the gate is released.
    pub fn wait(&self) {
        let mut done = self.done.lock().unwrap();
        while !*done {
            done = self.cond.wait(done).unwrap();
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}
