//! The thread pool façade.
//!
//! A [`ThreadPool`] owns a fixed set of worker threads, one bounded deque
//! per worker, and one unbounded global overflow queue. Submissions are
//! routed to a randomly chosen worker's deque and spill into the global
//! queue when that deque is full. Workers balance load by stealing from
//! each other's deques.

use crate::config::PoolConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::handle::{task_slot, TaskHandle};
use crate::queue::{GlobalQueue, WorkQueue};
use crate::rng::XorShiftRng;
use crate::stats::{PoolStats, StatsSnapshot};
use crate::task::Task;
use crate::worker::{Parker, Worker};
use std::cell::RefCell;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use tracing::error;

thread_local! {
    /// Submission-target RNG, one stream per submitting thread.
    static SUBMIT_RNG: RefCell<XorShiftRng> = RefCell::new(XorShiftRng::from_entropy());
}

/// State shared between the façade and every worker thread.
pub(crate) struct PoolShared {
    pub config: PoolConfig,
    pub queues: Vec<WorkQueue>,
    pub global: GlobalQueue,
    pub parkers: Vec<Parker>,
    /// Tasks accepted but not yet fully finished. Incremented before a
    /// task becomes visible in any queue, decremented exactly once when
    /// its execution returns.
    pub active: AtomicUsize,
    /// False until shutdown begins; never transitions back.
    pub shutdown: AtomicBool,
    pub stats: PoolStats,
    completion_mutex: Mutex<()>,
    completion_cvar: Condvar,
}

impl PoolShared {
    /// Decrements the active-task count, signalling waiters on the drop
    /// to zero.
    pub fn finish_task(&self) {
        let prev = self.active.fetch_sub(1, Ordering::Release);
        if prev == 1 {
            // Take and release the completion mutex before notifying so a
            // waiter between its predicate check and its sleep cannot
            // miss the wakeup.
            drop(
                self.completion_mutex
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            );
            self.completion_cvar.notify_all();
        }
    }

    /// Blocks until the active-task count is observed at zero.
    pub fn wait_quiescent(&self) {
        let mut guard = self
            .completion_mutex
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while self.active.load(Ordering::SeqCst) != 0 {
            guard = self
                .completion_cvar
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
        drop(guard);
    }

    /// Sets the shutdown flag and wakes every worker. Idempotent.
    pub fn begin_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        for parker in &self.parkers {
            parker.unpark();
        }
    }
}

/// Rolls back the quiescence increment if enqueueing does not complete.
struct UncommittedGuard<'a> {
    shared: &'a PoolShared,
    committed: bool,
}

impl<'a> UncommittedGuard<'a> {
    fn new(shared: &'a PoolShared) -> Self {
        Self {
            shared,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for UncommittedGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.shared.finish_task();
        }
    }
}

/// A fixed-size work-stealing thread pool.
///
/// Workers prefer their own deque (LIFO), then steal from peers (FIFO,
/// victims chosen by the configured [`StealPolicy`](crate::StealPolicy)),
/// then drain the global overflow queue. Dropping the pool shuts it down
/// and completes every task accepted beforehand.
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    threads: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Creates a pool with the default configuration.
    ///
    /// # Errors
    ///
    /// Fails if a worker thread cannot be spawned.
    pub fn new() -> Result<Self> {
        Self::with_config(PoolConfig::default())
    }

    /// Creates a pool from `config`, spawning `config.threads` workers.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::InvalidConfig`] when the configuration is
    /// rejected, or [`ErrorKind::ThreadSpawn`] when a worker thread
    /// cannot be started.
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let thread_count = config.threads;
        let shared = Arc::new(PoolShared {
            queues: (0..thread_count).map(|_| WorkQueue::new()).collect(),
            global: GlobalQueue::new(),
            parkers: (0..thread_count).map(|_| Parker::new()).collect(),
            active: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            stats: PoolStats::default(),
            completion_mutex: Mutex::new(()),
            completion_cvar: Condvar::new(),
            config,
        });

        let mut threads = Vec::with_capacity(thread_count);
        for id in 0..thread_count {
            let worker_shared = Arc::clone(&shared);
            let spawned = std::thread::Builder::new()
                .name(format!("{}-{id}", shared.config.thread_name_prefix))
                .spawn(move || {
                    let mut worker = Worker::new(id, worker_shared);
                    worker.run_loop();
                });
            match spawned {
                Ok(handle) => threads.push(handle),
                Err(err) => {
                    // Tear down the workers spawned so far; they exit
                    // promptly because nothing was accepted yet.
                    shared.begin_shutdown();
                    for handle in threads {
                        let _ = handle.join();
                    }
                    return Err(Error::new(ErrorKind::ThreadSpawn)
                        .with_message(format!("failed to spawn worker {id}: {err}")));
                }
            }
        }

        Ok(Self { shared, threads })
    }

    /// Submits a fire-and-forget task.
    ///
    /// The task lands on a randomly chosen worker's deque and spills into
    /// the global overflow queue when that deque is at capacity. A panic
    /// inside the task is logged and swallowed; it never affects sibling
    /// tasks or worker liveness.
    ///
    /// Tasks may themselves call `submit` on the owning pool. They must
    /// not call [`wait`](Self::wait); see there.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::ShuttingDown`] once shutdown has begun;
    /// the task is then never executed.
    pub fn submit<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_boxed(Box::new(f))
    }

    fn submit_boxed(&self, task: Task) -> Result<()> {
        let shared = &*self.shared;
        if shared.shutdown.load(Ordering::Acquire) {
            return Err(Error::new(ErrorKind::ShuttingDown).with_message("submit rejected"));
        }

        // Count the task before it becomes visible in any queue; roll the
        // increment back if enqueueing unwinds or the shutdown re-check
        // rejects.
        shared.active.fetch_add(1, Ordering::SeqCst);
        let uncommitted = UncommittedGuard::new(shared);

        // A racing shutdown() may have set the flag between the check
        // above and the increment. SeqCst on both sides guarantees that
        // either this load observes the flag, or the shutdown side
        // observes the incremented count and keeps the workers alive
        // until the task has run.
        if shared.shutdown.load(Ordering::SeqCst) {
            drop(uncommitted);
            return Err(Error::new(ErrorKind::ShuttingDown).with_message("submit rejected"));
        }

        let target = SUBMIT_RNG.with(|rng| rng.borrow_mut().next_usize(shared.queues.len()));
        if let Err(task) = shared.queues[target].try_push(task, shared.config.max_queue_tasks) {
            shared.global.push(task);
        }

        uncommitted.commit();
        shared.stats.tasks_submitted.fetch_add(1, Ordering::Relaxed);
        shared.parkers[target].unpark();
        Ok(())
    }

    /// Submits a task and returns a handle to its result.
    ///
    /// The callable's return value, or the panic it raises, is delivered
    /// through the [`TaskHandle`] exactly once.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::ShuttingDown`] once shutdown has begun.
    pub fn submit_task<F, T>(&self, f: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (handle, slot) = task_slot();
        self.submit(move || {
            let result = std::panic::catch_unwind(AssertUnwindSafe(f));
            slot.complete(result);
        })?;
        Ok(handle)
    }

    /// Blocks until every accepted task has finished.
    ///
    /// Re-callable; immediately returns when the pool is already
    /// quiescent. Must not be called from inside a task: the running task
    /// holds one count that cannot drop until the task returns, so the
    /// call would deadlock.
    pub fn wait(&self) {
        self.shared.wait_quiescent();
    }

    /// Initiates shutdown and waits for in-flight work to finish.
    ///
    /// Idempotent; calling it twice has no additional effect. After this
    /// returns, every task accepted beforehand has finished and new
    /// submissions fail with [`ErrorKind::ShuttingDown`]. Like
    /// [`wait`](Self::wait), must not be called from inside a task.
    pub fn shutdown(&self) {
        self.shared.begin_shutdown();
        self.shared.wait_quiescent();
    }

    /// Returns a snapshot of the monotonic pool counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Returns the number of worker threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.shared.config.threads
    }
}

impl Drop for ThreadPool {
    /// Initiates shutdown and joins every worker.
    ///
    /// Workers leave their loops only once the pool is quiescent, so
    /// destruction completes every task accepted before it.
    fn drop(&mut self) {
        self.shared.begin_shutdown();
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let local_queued: usize = self.shared.queues.iter().map(WorkQueue::len).sum();
        f.debug_struct("ThreadPool")
            .field("threads", &self.shared.config.threads)
            .field("steal_policy", &self.shared.config.steal_policy)
            .field("active", &self.shared.active.load(Ordering::Relaxed))
            .field("local_queued", &local_queued)
            .field("overflow_empty", &self.shared.global.is_empty())
            .field("shutdown", &self.shared.shutdown.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
