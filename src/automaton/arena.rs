//! Index-based state identities.
//!
//! Every automaton state that is not a product or a set of other states is a
//! `StateId`: a plain index minted by a `StateArena`. Because the id is just an
//! integer, transitions can point back to earlier states and form cycles
//! without any ownership gymnastics.
//!
//! An arena belongs to one compilation (or one reversal, or one rewrite), so
//! unrelated compilations never share a counter. Ids are only unique within the
//! arena that minted them; whenever states coming from two arenas must live in
//! one automaton they are renumbered into a single arena first.
//!
//! ```text
//!   a* between `from` and `to`
//!
//!   from ──ε──▶ s1 ──a──▶ s2 ──ε──▶ to
//!     │          ▲        │          ▲
//!     │          └───ε────┘          │
//!     └────────────────ε─────────────┘
//! ```

use std::fmt;

/// A state identifier - just an index into the arena that minted it.
///
/// This can be freely copied and allows cyclic references.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(u32);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        StateId(u32::try_from(index).expect("state identifiers are limited to u32::MAX states"))
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Mints fresh, dense `StateId`s.
#[derive(Clone, Debug, Default)]
pub struct StateArena {
    next: u32,
}

impl StateArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// An arena whose first id is `first`, used to extend an existing id space.
    pub fn starting_at(first: usize) -> Self {
        Self {
            next: StateId::from_index(first).0,
        }
    }

    /// Allocate a new state, returning its ID.
    #[inline]
    pub fn alloc(&mut self) -> StateId {
        let id = StateId(self.next);
        self.next = self
            .next
            .checked_add(1)
            .expect("state arena exhausted the u32 id space");
        id
    }

    /// Number of ids handed out so far (including any skipped by `starting_at`).
    pub fn len(&self) -> usize {
        self.next as usize
    }

    pub fn is_empty(&self) -> bool {
        self.next == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_is_dense() {
        let mut arena = StateArena::new();
        assert!(arena.is_empty());
        let a = arena.alloc();
        let b = arena.alloc();
        let c = arena.alloc();
        assert_eq!((a.index(), b.index(), c.index()), (0, 1, 2));
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_starting_at_continues_id_space() {
        let mut arena = StateArena::starting_at(7);
        assert_eq!(arena.alloc().index(), 7);
        assert_eq!(arena.alloc().index(), 8);
        assert_eq!(arena.len(), 9);
    }

    #[test]
    fn test_separate_arenas_do_not_share_a_counter() {
        let mut left = StateArena::new();
        let mut right = StateArena::new();
        left.alloc();
        left.alloc();
        // A second compilation starts from zero again
        assert_eq!(right.alloc().index(), 0);
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", StateId::from_index(12)), "s12");
    }
}
