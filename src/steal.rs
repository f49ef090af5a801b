//! Victim selection for the steal sweep.

use crate::rng::XorShiftRng;

/// Policy used to pick which peer a worker steals from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StealPolicy {
    /// A uniformly random victim, drawn independently per attempt.
    ///
    /// A worker may draw its own index; the attempt then fails against
    /// its already-empty local deque at negligible cost.
    #[default]
    Random,
    /// A deterministic sweep starting at the next worker:
    /// `(self + attempt) mod N`. Visits each non-self peer once before
    /// repeating.
    RoundRobin,
}

impl StealPolicy {
    /// Returns the victim index for the 1-based `attempt` made by worker
    /// `own` out of `workers` total.
    pub(crate) fn victim(
        self,
        own: usize,
        attempt: usize,
        workers: usize,
        rng: &mut XorShiftRng,
    ) -> usize {
        match self {
            Self::Random => rng.next_usize(workers),
            Self::RoundRobin => (own + attempt) % workers,
        }
    }
}
