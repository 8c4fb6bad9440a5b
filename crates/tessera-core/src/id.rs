//! Arena identity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`ArenaId`] allocation.
static ARENA_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for an arena.
///
/// Tensor handles carry the id of the arena that created them, so a handle
/// presented to any other arena is rejected instead of being resolved
/// against whatever happens to sit at the same offset there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaId(u64);

impl ArenaId {
    /// Allocate a fresh id. Never returns the same value twice within a
    /// process. Thread-safe.
    pub fn next() -> Self {
        Self(ARENA_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = ArenaId::next();
        let b = ArenaId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }
}
