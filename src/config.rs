//! Pool configuration.
//!
//! # Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `threads` | available CPU parallelism, else 1 |
//! | `steal_attempts` | 4 |
//! | `idle_sleep` | 1 ms |
//! | `max_queue_tasks` | 65 536 |
//! | `steal_policy` | `Random` |
//! | `thread_name_prefix` | `"quarry-worker"` |

use crate::error::{Error, ErrorKind, Result};
use crate::steal::StealPolicy;
use std::time::Duration;

/// Configuration for a [`ThreadPool`](crate::ThreadPool).
///
/// The configuration is immutable after construction; the pool never
/// resizes its worker set.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads. Must be at least 1.
    pub threads: usize,
    /// Victims tried per empty-local pass before idling. Must be at least 1.
    pub steal_attempts: usize,
    /// How long a worker sleeps after a pass that found no work.
    pub idle_sleep: Duration,
    /// Capacity of each worker's local deque. Submissions that find the
    /// target deque full spill into the global overflow queue.
    pub max_queue_tasks: usize,
    /// Victim selection policy for the steal sweep. Submission targeting
    /// is always randomized, independent of this policy.
    pub steal_policy: StealPolicy,
    /// Name prefix for worker threads.
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            threads: default_thread_count(),
            steal_attempts: 4,
            idle_sleep: Duration::from_millis(1),
            max_queue_tasks: 1 << 16,
            steal_policy: StealPolicy::Random,
            thread_name_prefix: "quarry-worker".to_string(),
        }
    }
}

impl PoolConfig {
    /// Checks the configuration for values the pool cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidConfig`] when `threads` or
    /// `steal_attempts` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(
                Error::new(ErrorKind::InvalidConfig).with_message("threads must be at least 1")
            );
        }
        if self.steal_attempts == 0 {
            return Err(Error::new(ErrorKind::InvalidConfig)
                .with_message("steal_attempts must be at least 1"));
        }
        Ok(())
    }
}

/// Default worker count: available hardware parallelism, else 1.
#[must_use]
pub fn default_thread_count() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}
