//! Executor configuration.
//!
//! Mirrors the constructor parameters of the original adaptive sequenced
//! executor: strand count, worker count, and the two backpressure
//! thresholds. `max_pending` is the hard limit; `wakeup_limit` is the
//! low-water mark a producer blocks until once `max_pending` is hit.

use crate::env::{env_get, env_get_bool};

/// Builder for executor configuration.
///
/// ```
/// use strand_core::config::ExecutorConfig;
///
/// let cfg = ExecutorConfig::new()
///     .num_strands(64)
///     .num_threads(8)
///     .max_waiting(1000)
///     .max_pending(3000)
///     .build()
///     .unwrap();
/// assert_eq!(cfg.num_strands(), 64);
/// ```
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    num_strands: usize,
    num_threads: usize,
    max_waiting: usize,
    max_pending: usize,
    wakeup_limit: Option<usize>,
    debug_logging: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            num_strands: 64,
            num_threads: num_cpus_fallback(),
            max_waiting: 1000,
            max_pending: 10_000,
            wakeup_limit: None,
            debug_logging: false,
        }
    }
}

/// A dependency-free stand-in for `num_cpus::get()`: the teacher's own
/// crates avoid a thread-count-detection dependency and fall back to a
/// fixed default, so we do the same.
fn num_cpus_fallback() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl ExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// - `STX_NUM_STRANDS`
    /// - `STX_NUM_THREADS`
    /// - `STX_MAX_WAITING`
    /// - `STX_MAX_PENDING`
    /// - `STX_WAKEUP_LIMIT`
    /// - `STX_DEBUG_LOGGING`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut cfg = ExecutorConfig {
            num_strands: env_get("STX_NUM_STRANDS", defaults.num_strands),
            num_threads: env_get("STX_NUM_THREADS", defaults.num_threads),
            max_waiting: env_get("STX_MAX_WAITING", defaults.max_waiting),
            max_pending: env_get("STX_MAX_PENDING", defaults.max_pending),
            wakeup_limit: None,
            debug_logging: env_get_bool("STX_DEBUG_LOGGING", defaults.debug_logging),
        };
        if let Some(limit) = crate::env::env_get_opt::<usize>("STX_WAKEUP_LIMIT") {
            cfg.wakeup_limit = Some(limit);
        }
        cfg
    }

    pub fn num_strands(mut self, n: usize) -> Self {
        self.num_strands = n;
        self
    }

    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = n;
        self
    }

    pub fn max_waiting(mut self, n: usize) -> Self {
        self.max_waiting = n;
        self
    }

    pub fn max_pending(mut self, n: usize) -> Self {
        self.max_pending = n;
        self
    }

    /// Override the derived wakeup low-water mark explicitly. Left unset,
    /// it is computed as `max(1, 0.9 * max_pending)` at `build()` time.
    pub fn wakeup_limit(mut self, n: usize) -> Self {
        self.wakeup_limit = Some(n);
        self
    }

    pub fn debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<ExecutorParams, &'static str> {
        if self.num_strands == 0 {
            return Err("num_strands must be at least 1");
        }
        if self.num_threads == 0 {
            return Err("num_threads must be at least 1");
        }
        if self.max_pending == 0 {
            return Err("max_pending must be at least 1");
        }
        let wakeup_limit = self.wakeup_limit.unwrap_or_else(|| derive_wakeup_limit(self.max_pending));
        if wakeup_limit == 0 || wakeup_limit > self.max_pending {
            return Err("wakeup_limit must be in 1..=max_pending");
        }
        Ok(ExecutorParams {
            num_strands: self.num_strands,
            num_threads: self.num_threads,
            max_waiting: self.max_waiting,
            max_pending: self.max_pending,
            wakeup_limit,
            debug_logging: self.debug_logging,
        })
    }
}

/// `max(1, floor(0.9 * max_pending))`, the same hysteresis band the
/// original executor uses between its hard task limit and the point at
/// which a blocked producer is allowed to resume.
fn derive_wakeup_limit(max_pending: usize) -> usize {
    ((max_pending * 9) / 10).max(1)
}

/// A validated, immutable configuration ready to drive an executor.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorParams {
    num_strands: usize,
    num_threads: usize,
    max_waiting: usize,
    max_pending: usize,
    wakeup_limit: usize,
    debug_logging: bool,
}

impl ExecutorParams {
    pub fn num_strands(&self) -> usize {
        self.num_strands
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn max_waiting(&self) -> usize {
        self.max_waiting
    }

    pub fn max_pending(&self) -> usize {
        self.max_pending
    }

    pub fn wakeup_limit(&self) -> usize {
        self.wakeup_limit
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }
}
