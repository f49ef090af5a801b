//! Worker threads: the scheduling loop and task execution.

use crate::pool::PoolShared;
use crate::rng::XorShiftRng;
use crate::task::Task;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;
use tracing::{error, trace};

/// Identifier for a pool worker.
pub(crate) type WorkerId = usize;

/// A worker thread that executes tasks.
pub(crate) struct Worker {
    id: WorkerId,
    shared: Arc<PoolShared>,
    /// Per-worker RNG for victim selection; streams are independent
    /// across workers.
    rng: XorShiftRng,
}

impl Worker {
    pub fn new(id: WorkerId, shared: Arc<PoolShared>) -> Self {
        Self {
            id,
            shared,
            rng: XorShiftRng::from_entropy(),
        }
    }

    /// Runs the scheduling loop until shutdown with no work left.
    ///
    /// One pass: own deque, then the steal sweep over peers, then the
    /// global overflow queue, then the exit check, then an idle park.
    pub fn run_loop(&mut self) {
        loop {
            // Own deque first: LIFO pop keeps recently pushed work
            // cache-warm.
            if let Some(task) = self.shared.queues[self.id].try_pop() {
                self.execute(task);
                continue;
            }

            if let Some(task) = self.steal() {
                self.shared
                    .stats
                    .tasks_stolen
                    .fetch_add(1, Ordering::Relaxed);
                self.execute(task);
                continue;
            }

            // Overflow spillover comes after the sweep so hot tasks stay
            // close to their producer; a worker only reaches the global
            // queue when no peer had anything to offer.
            if let Some(task) = self.shared.global.try_steal() {
                self.execute(task);
                continue;
            }

            // SeqCst pairs with the submit path's increment-then-recheck:
            // a worker that observes the flag and a zero count cannot be
            // leaving an accepted task behind.
            if self.shared.shutdown.load(Ordering::SeqCst)
                && self.shared.active.load(Ordering::SeqCst) == 0
            {
                break;
            }

            // Submissions targeting this worker unpark it early; the
            // timeout keeps shutdown observable without an explicit
            // signal.
            self.shared.parkers[self.id].park_timeout(self.shared.config.idle_sleep);
        }
        trace!(worker_id = self.id, "worker exiting");
    }

    /// One sweep over victims chosen by the configured policy.
    fn steal(&mut self) -> Option<Task> {
        let workers = self.shared.queues.len();
        for attempt in 1..=self.shared.config.steal_attempts {
            let victim =
                self.shared
                    .config
                    .steal_policy
                    .victim(self.id, attempt, workers, &mut self.rng);
            self.shared
                .stats
                .steal_attempts
                .fetch_add(1, Ordering::Relaxed);
            if let Some(task) = self.shared.queues[victim].try_steal() {
                return Some(task);
            }
            self.shared
                .stats
                .failed_steals
                .fetch_add(1, Ordering::Relaxed);
        }
        None
    }

    /// Executes one task under the quiescence guard.
    ///
    /// The guard decrements the active count exactly once on every exit
    /// path, so a panicking task cannot strand `wait`.
    fn execute(&self, task: Task) {
        let _guard = QuiescenceGuard::new(&self.shared);
        trace!(worker_id = self.id, "executing task");
        if let Err(payload) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(task)) {
            error!(
                worker_id = self.id,
                "task failed: {}",
                crate::handle::panic_message(payload.as_ref())
            );
        }
        self.shared
            .stats
            .tasks_executed
            .fetch_add(1, Ordering::Relaxed);
    }
}

/// Decrements the active-task count when dropped, signalling quiescence
/// on the drop to zero. Armed the instant a task leaves its queue.
struct QuiescenceGuard<'a> {
    shared: &'a PoolShared,
}

impl<'a> QuiescenceGuard<'a> {
    fn new(shared: &'a PoolShared) -> Self {
        Self { shared }
    }
}

impl Drop for QuiescenceGuard<'_> {
    fn drop(&mut self) {
        self.shared.finish_task();
    }
}

/// A permit-based parking primitive for idle workers.
///
/// `unpark` leaves a permit when the worker is not parked, so a wakeup
/// that races ahead of `park_timeout` is never lost.
pub(crate) struct Parker {
    notified: AtomicBool,
    mutex: Mutex<()>,
    cvar: Condvar,
}

impl Parker {
    pub fn new() -> Self {
        Self {
            notified: AtomicBool::new(false),
            mutex: Mutex::new(()),
            cvar: Condvar::new(),
        }
    }

    #[inline]
    fn consume_permit(&self) -> bool {
        self.notified
            .compare_exchange(true, false, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Parks the calling worker for at most `timeout`, or until unparked.
    ///
    /// A permit left by an earlier `unpark` is consumed without blocking.
    pub fn park_timeout(&self, timeout: Duration) {
        if self.consume_permit() {
            return;
        }
        let guard = self.mutex.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _timed_out) = self
            .cvar
            .wait_timeout_while(guard, timeout, |_: &mut ()| !self.consume_permit())
            .unwrap_or_else(PoisonError::into_inner);
        drop(guard);
    }

    /// Wakes the worker, or leaves a permit for its next park.
    pub fn unpark(&self) {
        if self
            .notified
            .compare_exchange(false, true, Ordering::Release, Ordering::Relaxed)
            .is_err()
        {
            // Already notified; the permit will be consumed on the next
            // park fast path.
            return;
        }
        // Acquire the mutex before notifying: a parker between its permit
        // check and its sleep must not miss the signal.
        let guard = self.mutex.lock().unwrap_or_else(PoisonError::into_inner);
        drop(guard);
        self.cvar.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn unpark_before_park_returns_immediately() {
        let parker = Parker::new();
        parker.unpark();

        let start = Instant::now();
        parker.park_timeout(Duration::from_secs(5));
        assert!(
            start.elapsed() < Duration::from_millis(100),
            "park after unpark should consume the permit immediately"
        );
    }

    #[test]
    fn park_timeout_expires_without_signal() {
        let parker = Parker::new();
        let start = Instant::now();
        parker.park_timeout(Duration::from_millis(30));
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_millis(20),
            "park should wait out the timeout, waited {elapsed:?}"
        );
    }

    #[test]
    fn unpark_interrupts_long_park() {
        let parker = Arc::new(Parker::new());
        let remote = Arc::clone(&parker);
        let handle = thread::spawn(move || {
            let start = Instant::now();
            remote.park_timeout(Duration::from_secs(10));
            start.elapsed()
        });

        thread::sleep(Duration::from_millis(20));
        parker.unpark();
        let elapsed = handle.join().expect("parked thread join");
        assert!(
            elapsed < Duration::from_secs(2),
            "unpark should interrupt the park, waited {elapsed:?}"
        );
    }

    #[test]
    fn permits_coalesce() {
        let parker = Parker::new();
        parker.unpark();
        parker.unpark();
        parker.unpark();

        parker.park_timeout(Duration::from_secs(1));

        // The coalesced permit is spent; the next park must wait.
        let start = Instant::now();
        parker.park_timeout(Duration::from_millis(30));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
