//! Monotonic pool counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters incremented on the scheduler hot paths.
///
/// All increments are Relaxed; the counters are advisory and never
/// synchronize task state.
#[derive(Debug, Default)]
pub(crate) struct PoolStats {
    pub tasks_submitted: AtomicU64,
    pub tasks_executed: AtomicU64,
    pub tasks_stolen: AtomicU64,
    pub steal_attempts: AtomicU64,
    pub failed_steals: AtomicU64,
}

impl PoolStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            tasks_submitted: self.tasks_submitted.load(Ordering::Relaxed),
            tasks_executed: self.tasks_executed.load(Ordering::Relaxed),
            tasks_stolen: self.tasks_stolen.load(Ordering::Relaxed),
            steal_attempts: self.steal_attempts.load(Ordering::Relaxed),
            failed_steals: self.failed_steals.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of the pool counters.
///
/// After a `wait()` with no concurrent submissions, `tasks_submitted`
/// equals `tasks_executed`, and `failed_steals` equals
/// `steal_attempts - tasks_stolen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Tasks accepted by `submit`/`submit_task`.
    pub tasks_submitted: u64,
    /// Tasks whose execution has returned, successfully or not.
    pub tasks_executed: u64,
    /// Steal attempts that yielded a task.
    pub tasks_stolen: u64,
    /// Total steal attempts made by all workers.
    pub steal_attempts: u64,
    /// Steal attempts that found the victim's deque empty.
    pub failed_steals: u64,
}
