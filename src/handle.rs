//! Result handles for tasks submitted with
//! [`submit_task`](crate::ThreadPool::submit_task).

use crate::error::{Error, ErrorKind, Result};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// One-shot result slot shared between a handle and its task wrapper.
enum Slot<T> {
    /// The task has not finished yet.
    Pending,
    /// The task returned a value.
    Ready(T),
    /// The task panicked; the payload message is kept for the caller.
    Panicked(String),
    /// The result was taken by `join`.
    Taken,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    done: Condvar,
}

/// A handle to the eventual result of a submitted task.
///
/// The handle observes exactly one completion: the task's return value,
/// or the panic it raised. Dropping the handle discards the result but
/// never cancels the task.
#[must_use = "dropping a TaskHandle discards the task's result"]
pub struct TaskHandle<T> {
    shared: Arc<Shared<T>>,
}

/// The completing half, moved into the wrapper task.
pub(crate) struct TaskSlot<T> {
    shared: Arc<Shared<T>>,
}

/// Creates a connected handle/slot pair.
pub(crate) fn task_slot<T>() -> (TaskHandle<T>, TaskSlot<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot::Pending),
        done: Condvar::new(),
    });
    (
        TaskHandle {
            shared: Arc::clone(&shared),
        },
        TaskSlot { shared },
    )
}

impl<T> TaskSlot<T> {
    /// Stores the task's outcome and wakes every waiter.
    ///
    /// Consumes the slot; a result is delivered at most once.
    pub fn complete(self, result: std::thread::Result<T>) {
        let value = match result {
            Ok(value) => Slot::Ready(value),
            Err(payload) => Slot::Panicked(panic_message(payload.as_ref())),
        };
        let mut slot = self
            .shared
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = value;
        drop(slot);
        self.shared.done.notify_all();
    }
}

impl<T> TaskHandle<T> {
    /// Blocks until the task finishes and returns its value.
    ///
    /// # Errors
    ///
    /// A panic inside the task surfaces as [`ErrorKind::TaskPanicked`]
    /// carrying the panic message.
    pub fn join(self) -> Result<T> {
        let mut slot = self
            .shared
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while matches!(*slot, Slot::Pending) {
            slot = self
                .shared
                .done
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Ready(value) => Ok(value),
            Slot::Panicked(message) => {
                Err(Error::new(ErrorKind::TaskPanicked).with_message(message))
            }
            // join consumes the only handle, so the slot can be taken at
            // most once.
            Slot::Pending | Slot::Taken => unreachable!("task slot completed exactly once"),
        }
    }

    /// Waits up to `timeout` for the task to finish.
    ///
    /// Returns true once the result is available. Timing out does not
    /// cancel the task; it only times out this observation.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let slot = self
            .shared
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (slot, _timed_out) = self
            .shared
            .done
            .wait_timeout_while(slot, timeout, |slot| matches!(*slot, Slot::Pending))
            .unwrap_or_else(PoisonError::into_inner);
        !matches!(*slot, Slot::Pending)
    }

    /// Returns true if the task has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        let slot = self
            .shared
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        !matches!(*slot, Slot::Pending)
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}
