//! Error types for the strand executor

use core::fmt;

/// Errors that can occur when driving the executor from the outside.
///
/// Internal invariant failures (counters out of sync, a strand in an
/// impossible state) are bugs, not recoverable errors — they `assert!` or
/// `debug_assert!` rather than appearing here.
#[derive(Debug)]
pub enum ExecutorError<T = ()> {
    /// `submit` was called after the executor started shutting down.
    ///
    /// The task that could not be accepted is handed back so the caller can
    /// dispose of it (log it, retry elsewhere, drop it).
    Closed(T),
}

impl<T> fmt::Display for ExecutorError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorError::Closed(_) => write!(f, "executor is closed"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for ExecutorError<T> {}
