//! Pseudo-random number generation for scheduling decisions.
//!
//! Victim and submission-target selection only need a fast generator with
//! decent distribution over a handful of worker indices; xorshift64 fits
//! with no external dependencies. It is NOT cryptographically secure.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

/// A xorshift64 pseudo-random generator.
///
/// Each worker (and each submitting thread) owns its own instance, so the
/// streams are independent and never contended.
#[derive(Debug, Clone)]
pub(crate) struct XorShiftRng {
    state: u64,
}

impl XorShiftRng {
    /// Creates a generator with the given seed.
    ///
    /// A zero seed is remapped; xorshift64 would otherwise be stuck at
    /// zero forever.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    /// Creates a generator seeded from ambient entropy.
    pub fn from_entropy() -> Self {
        let mut hasher = RandomState::new().build_hasher();
        hasher.write_u64(0x5157_4B52);
        Self::new(hasher.finish())
    }

    /// Generates the next pseudo-random u64 value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        // Marsaglia's xorshift64 shift triple.
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generates a pseudo-random usize in `[0, bound)`.
    ///
    /// Uses rejection sampling to avoid modulo bias.
    ///
    /// # Panics
    ///
    /// Panics if `bound` is zero.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub fn next_usize(&mut self, bound: usize) -> usize {
        assert!(bound > 0, "bound must be non-zero");
        let bound_u64 = bound as u64;
        let threshold = u64::MAX - (u64::MAX % bound_u64);
        loop {
            let value = self.next_u64();
            if value < threshold {
                return (value % bound_u64) as usize;
            }
        }
    }
}
