//! Task queues: per-worker bounded deques and the global overflow queue.
//!
//! Each worker owns one [`WorkQueue`]. The owner pushes and pops at the
//! back (LIFO, cache-warm re-execution of recent work); thieves remove
//! from the front (FIFO, older and typically coarser work, away from the
//! owner's hot end). A single mutex per deque is enough: stealing is
//! expected to be rare under load and every critical section is a few
//! pointer moves.

use crate::task::Task;
use crossbeam_queue::SegQueue;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// A bounded double-ended task queue with distinct owner and thief ends.
///
/// Any thread may call any operation; the deque's own lock serializes
/// them. The capacity bound is enforced by [`try_push`](Self::try_push);
/// a rejected task spills into the [`GlobalQueue`].
pub(crate) struct WorkQueue {
    deque: Mutex<VecDeque<Task>>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self {
            deque: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends at the owner end if the deque holds fewer than `cap`
    /// tasks.
    ///
    /// On rejection the task is handed back unchanged so the caller can
    /// deliver it elsewhere.
    pub fn try_push(&self, task: Task, cap: usize) -> Result<(), Task> {
        let mut deque = self.deque.lock();
        if deque.len() >= cap {
            return Err(task);
        }
        deque.push_back(task);
        Ok(())
    }

    /// Removes from the owner end (LIFO).
    pub fn try_pop(&self) -> Option<Task> {
        self.deque.lock().pop_back()
    }

    /// Removes from the thief end (FIFO).
    pub fn try_steal(&self) -> Option<Task> {
        self.deque.lock().pop_front()
    }

    /// Advisory length snapshot.
    pub fn len(&self) -> usize {
        self.deque.lock().len()
    }
}

/// The pool-wide unbounded overflow queue.
///
/// Takes submissions that a worker's local deque rejected. Any thread may
/// push; workers drain from the thief end, so spillover keeps approximate
/// submission order.
pub(crate) struct GlobalQueue {
    tasks: SegQueue<Task>,
}

impl GlobalQueue {
    pub fn new() -> Self {
        Self {
            tasks: SegQueue::new(),
        }
    }

    pub fn push(&self, task: Task) {
        self.tasks.push(task);
    }

    pub fn try_steal(&self) -> Option<Task> {
        self.tasks.pop()
    }

    /// Advisory emptiness snapshot.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
