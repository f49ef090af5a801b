//! Task representation.

/// A one-shot unit of work handed to the pool.
///
/// Tasks are type-erased, move-only closures with no parameters and no
/// return channel of their own. A task is owned by exactly one queue slot
/// until a worker moves it out for execution; the submitter retains no
/// reference to it.
pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;
