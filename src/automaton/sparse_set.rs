//! Sparse set of NFA states, the scratch space for epsilon closures.
//!
//! Based on: https://research.swtch.com/sparse
//!
//! Properties:
//! - O(1) membership testing and insertion
//! - O(1) clearing (just reset the length counter), so one set is reused for
//!   every closure computed during a determinization
//! - Members can be read back in sorted order, which is the canonical form of
//!   a powerset state
//!
//! Tradeoff: requires the largest state index upfront and uses 2*capacity memory.

use super::arena::StateId;

#[derive(Clone, Debug)]
pub struct StateSet {
    /// Number of states currently in the set.
    len: usize,
    /// Members in insertion order.
    dense: Vec<StateId>,
    /// Maps a state index to its position in `dense`.
    /// A state is in the set iff sparse[id] < len && dense[sparse[id]] == id.
    sparse: Vec<usize>,
}

impl StateSet {
    /// Members must have an index in `[0, capacity)`.
    #[inline]
    pub fn new(capacity: usize) -> Self {
        StateSet {
            len: 0,
            dense: vec![StateId::from_index(0); capacity],
            sparse: vec![0; capacity],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.dense.len()
    }

    /// Returns true if the state was not already present.
    ///
    /// Panics if the state index is not below the capacity.
    #[inline]
    pub fn insert(&mut self, state: StateId) -> bool {
        if self.contains(state) {
            return false;
        }
        debug_assert!(
            self.len < self.capacity(),
            "StateSet overflow: len={}, capacity={}",
            self.len,
            self.capacity()
        );
        self.dense[self.len] = state;
        self.sparse[state.index()] = self.len;
        self.len += 1;
        true
    }

    #[inline]
    pub fn contains(&self, state: StateId) -> bool {
        let idx = self.sparse[state.index()];
        idx < self.len && self.dense[idx] == state
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Members in ascending order.
    pub fn to_sorted_vec(&self) -> Vec<StateId> {
        let mut members = self.dense[..self.len].to_vec();
        members.sort_unstable();
        members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(i: usize) -> StateId {
        StateId::from_index(i)
    }

    #[test]
    fn test_state_set_basic() {
        let mut set = StateSet::new(10);
        assert!(set.to_sorted_vec().is_empty());
        assert_eq!(set.capacity(), 10);

        assert!(set.insert(id(3)));
        assert!(set.insert(id(7)));
        assert!(set.insert(id(1)));

        assert!(set.contains(id(3)));
        assert!(set.contains(id(7)));
        assert!(!set.contains(id(0)));

        // Duplicate insert returns false
        assert!(!set.insert(id(3)));
        assert_eq!(set.to_sorted_vec(), vec![id(1), id(3), id(7)]);
    }

    #[test]
    fn test_state_set_sorted() {
        let mut set = StateSet::new(10);
        for i in [5, 2, 8, 1] {
            set.insert(id(i));
        }
        assert_eq!(set.to_sorted_vec(), vec![id(1), id(2), id(5), id(8)]);
    }

    #[test]
    fn test_state_set_clear_and_reuse() {
        let mut set = StateSet::new(4);
        set.insert(id(1));
        set.insert(id(2));
        set.clear();
        assert!(set.to_sorted_vec().is_empty());
        assert!(!set.contains(id(1)));

        set.insert(id(3));
        assert_eq!(set.to_sorted_vec(), vec![id(3)]);
    }
}
