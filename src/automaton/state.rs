//! Composite state identities.
//!
//! A `Dfa` is generic over its state type. Compiled automata use plain
//! `StateId`s; the two composite kinds below only exist while an algorithm is
//! running and are rewritten to `StateId`s before the result is handed out.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::arena::StateId;

/// Anything usable as an automaton state: an opaque, hashable identity.
pub trait State: Clone + Eq + Hash + fmt::Debug {}

impl<T: Clone + Eq + Hash + fmt::Debug> State for T {}

/// A state of a product automaton.
///
/// `None` on one side means that operand has no transition for the symbol that
/// led here. DFAs need not be total, so "absent" is an ordinary component.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairState {
    pub left: Option<StateId>,
    pub right: Option<StateId>,
}

impl PairState {
    pub fn new(left: Option<StateId>, right: Option<StateId>) -> Self {
        Self { left, right }
    }
}

impl fmt::Debug for PairState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |s: Option<StateId>| s.map_or_else(|| "-".to_string(), |s| s.to_string());
        write!(f, "({},{})", side(self.left), side(self.right))
    }
}

/// A set of NFA states, the states of a DFA built by powerset construction.
///
/// Members are kept sorted and deduplicated so that equal sets hash equally.
/// Cloning is cheap: the member list is shared.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MultiState(Arc<[StateId]>);

impl MultiState {
    pub(crate) fn from_sorted(members: Vec<StateId>) -> Self {
        debug_assert!(members.windows(2).all(|w| w[0] < w[1]));
        MultiState(members.into())
    }

    pub fn states(&self) -> &[StateId] {
        &self.0
    }

    pub fn contains(&self, state: StateId) -> bool {
        self.0.binary_search(&state).is_ok()
    }

    pub fn intersects(&self, other: &FxHashSet<StateId>) -> bool {
        self.0.iter().any(|s| other.contains(s))
    }
}

impl fmt::Debug for MultiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}
