//! An in-process work-stealing task scheduler.
//!
//! A fixed pool of worker threads executes user-submitted one-shot
//! closures. Each worker owns a bounded double-ended queue: the owner
//! pushes and pops at the back (LIFO), idle peers steal from the front
//! (FIFO). Submissions that find their target deque full spill into an
//! unbounded global overflow queue, drained FIFO by any worker.
//!
//! The pool tracks every accepted task in a quiescence counter, so
//! [`ThreadPool::wait`] returns exactly when all submitted work
//! (including work that panicked) has finished, and dropping the pool
//! completes everything accepted beforehand.
//!
//! # Example
//!
//! ```
//! use quarry::ThreadPool;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let pool = ThreadPool::new()?;
//!
//! let counter = Arc::new(AtomicUsize::new(0));
//! for _ in 0..10 {
//!     let counter = Arc::clone(&counter);
//!     pool.submit(move || {
//!         counter.fetch_add(1, Ordering::Relaxed);
//!     })?;
//! }
//! pool.wait();
//! assert_eq!(counter.load(Ordering::Relaxed), 10);
//!
//! let sum = pool.submit_task(|| 10 + 20)?.join()?;
//! assert_eq!(sum, 30);
//! # Ok::<(), quarry::Error>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handle;
pub mod parallel;
pub mod pool;
pub mod stats;
pub mod steal;

mod queue;
mod rng;
mod task;
mod worker;

pub use config::{default_thread_count, PoolConfig};
pub use error::{Error, ErrorKind, Result};
pub use handle::TaskHandle;
pub use parallel::{parallel_for, parallel_map_reduce, parallel_reduce, DEFAULT_CHUNK_SIZE};
pub use pool::ThreadPool;
pub use stats::StatsSnapshot;
pub use steal::StealPolicy;
