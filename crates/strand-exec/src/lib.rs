//! Adaptive sequenced task executor.
//!
//! Tasks are submitted against a strand key; tasks sharing a key run in
//! strict FIFO order on at most one worker at a time, while tasks on
//! different strands run in parallel up to the configured thread count. The
//! executor balances the number of active threads against the depth of the
//! wait queue to minimize critical-path wakeups.
//!
//! ```
//! use strand_core::ExecutorConfig;
//! use strand_exec::Executor;
//!
//! let params = ExecutorConfig::new()
//!     .num_strands(16)
//!     .num_threads(4)
//!     .build()
//!     .unwrap();
//! let exec = Executor::new(params);
//! let id = exec.executor_id(42);
//! exec.submit(id, || println!("hello from a strand")).unwrap();
//! exec.sync();
//! ```

mod barrier;
mod core;
mod executor;
mod gate;
mod stats;
mod strand;
mod task;
mod worker;

pub use executor::{Executor, ExecutorId};
pub use stats::{SampleStat, Stats};
pub use task::TaskBody;

pub use strand_core::{kdebug, kerror, kinfo, ktrace, kwarn};
