//! Powerset construction: NFA to DFA.
//!
//! Each DFA state is the epsilon closure of a set of NFA states. Closures are
//! cached by the exact set they were computed from, because the same target
//! sets come up over and over while exploring (every state of a loop body
//! reaches the loop head, for example).
//!
//! All intervals of the input NFA must come from one partitioned alphabet, so
//! that two transitions either carry the same interval or disjoint ones. That
//! lets the construction merge transitions by interval equality alone.

use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

use log::trace;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use super::arena::StateId;
use super::dfa::{Dfa, Row};
use super::interval::CharInterval;
use super::nfa::{Nfa, Symbol};
use super::sparse_set::StateSet;
use super::state::MultiState;

type Targets = SmallVec<[StateId; 2]>;

/// Epsilon closures over one NFA, memoized by input set.
struct Closures {
    epsilons: FxHashMap<StateId, Targets>,
    cache: FxHashMap<Box<[StateId]>, MultiState>,
    seen: StateSet,
    stack: Vec<StateId>,
}

impl Closures {
    fn new(epsilons: FxHashMap<StateId, Targets>, capacity: usize) -> Self {
        Self {
            epsilons,
            cache: FxHashMap::default(),
            seen: StateSet::new(capacity),
            stack: Vec::new(),
        }
    }

    /// `set` must be sorted and deduplicated.
    fn close(&mut self, set: &[StateId]) -> MultiState {
        if let Some(closure) = self.cache.get(set) {
            return closure.clone();
        }

        self.seen.clear();
        self.stack.clear();
        for &state in set {
            if self.seen.insert(state) {
                self.stack.push(state);
            }
        }
        while let Some(state) = self.stack.pop() {
            if let Some(targets) = self.epsilons.get(&state) {
                for &target in targets {
                    if self.seen.insert(target) {
                        self.stack.push(target);
                    }
                }
            }
        }

        let closure = MultiState::from_sorted(self.seen.to_sorted_vec());
        self.cache.insert(set.into(), closure.clone());
        closure
    }
}

/// Determinize `nfa` by the subset construction.
///
/// Only sets reachable from the closure of the initial state are built. A set
/// gets a row in the transition table only if it has at least one outgoing
/// interval, and it is accepting iff it contains an accepting NFA state.
pub fn determinize(nfa: &Nfa) -> Dfa<MultiState> {
    let start = Instant::now();

    let mut epsilons: FxHashMap<StateId, Targets> = FxHashMap::default();
    let mut moves: FxHashMap<StateId, BTreeMap<CharInterval, Targets>> = FxHashMap::default();
    for t in &nfa.transitions {
        match t.symbol {
            Symbol::Epsilon => epsilons.entry(t.from).or_default().push(t.to),
            Symbol::Interval(interval) => moves
                .entry(t.from)
                .or_default()
                .entry(interval)
                .or_default()
                .push(t.to),
        }
    }

    let mut closures = Closures::new(epsilons, nfa.state_bound());
    let initial = closures.close(&[nfa.initial]);

    let mut transitions: FxHashMap<MultiState, Row<MultiState>> = FxHashMap::default();
    let mut seen: FxHashSet<MultiState> = FxHashSet::default();
    let mut pending = VecDeque::new();
    seen.insert(initial.clone());
    pending.push_back(initial.clone());

    while let Some(current) = pending.pop_front() {
        let mut merged: BTreeMap<CharInterval, Vec<StateId>> = BTreeMap::new();
        for state in current.states() {
            if let Some(row) = moves.get(state) {
                for (interval, targets) in row {
                    merged.entry(*interval).or_default().extend(targets.iter().copied());
                }
            }
        }
        if merged.is_empty() {
            continue;
        }

        let mut row = Row::new();
        for (interval, mut targets) in merged {
            targets.sort_unstable();
            targets.dedup();
            let destination = closures.close(&targets);
            if seen.insert(destination.clone()) {
                pending.push_back(destination.clone());
            }
            row.insert(interval, destination);
        }
        transitions.insert(current, row);
    }

    let accepting: Vec<MultiState> = seen
        .into_iter()
        .filter(|set| set.intersects(&nfa.accepting))
        .collect();

    trace!(
        "determinized {} NFA transitions into {} DFA rows in {:?}",
        nfa.transitions.len(),
        transitions.len(),
        start.elapsed()
    );
    Dfa::new(initial, transitions, accepting, false)
}
