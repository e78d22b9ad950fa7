//! Boolean algebra over DFAs, by product construction.
//!
//! Operands must have been compiled over the same alphabet partition, so every
//! interval of one is either equal to or disjoint from every interval of the
//! other. The product then only needs the union of both interval sets.
//!
//! The product is built over *every* pair of states, including pairs where one
//! side is absent (`None`): DFAs here are partial, and a union must keep going
//! on the left after the right one has rejected. Unreachable pairs are pruned
//! afterwards.

use std::collections::VecDeque;
use std::time::Instant;

use log::trace;
use rustc_hash::{FxHashMap, FxHashSet};

use super::arena::StateId;
use super::dfa::{Dfa, Row};
use super::state::{PairState, State};

/// How a product state's acceptance follows from its two components.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combine {
    Intersection,
    Union,
    Difference,
}

impl Combine {
    #[inline]
    pub fn accepts(self, left: bool, right: bool) -> bool {
        match self {
            Combine::Intersection => left && right,
            Combine::Union => left || right,
            Combine::Difference => left && !right,
        }
    }
}

fn with_absent(dfa: &Dfa) -> Vec<Option<StateId>> {
    dfa.all_states()
        .into_iter()
        .map(Some)
        .chain(std::iter::once(None))
        .collect()
}

/// The full product automaton of `left` and `right`.
pub fn product(left: &Dfa, right: &Dfa, op: Combine) -> Dfa<PairState> {
    let start = Instant::now();
    let mut alphabet = left.all_chars();
    alphabet.extend(right.all_chars());

    let left_states = with_absent(left);
    let right_states = with_absent(right);

    let mut transitions: FxHashMap<PairState, Row<PairState>> = FxHashMap::with_capacity_and_hasher(
        left_states.len() * right_states.len(),
        Default::default(),
    );
    let mut accepting = Vec::new();

    for &l in &left_states {
        let left_row = l.and_then(|s| left.row(&s));
        let left_accepts = l.is_some_and(|s| left.is_accepting(&s));
        for &r in &right_states {
            let right_row = r.and_then(|s| right.row(&s));
            let right_accepts = r.is_some_and(|s| right.is_accepting(&s));
            let pair = PairState::new(l, r);

            if left_row.is_some() || right_row.is_some() {
                let row: Row<PairState> = alphabet
                    .iter()
                    .map(|interval| {
                        let next_left = left_row.and_then(|row| row.get(interval)).copied();
                        let next_right = right_row.and_then(|row| row.get(interval)).copied();
                        (*interval, PairState::new(next_left, next_right))
                    })
                    .collect();
                transitions.insert(pair, row);
            }
            if op.accepts(left_accepts, right_accepts) {
                accepting.push(pair);
            }
        }
    }

    trace!(
        "{:?} product of {}x{} states built in {:?}",
        op,
        left_states.len(),
        right_states.len(),
        start.elapsed()
    );
    let initial = PairState::new(Some(*left.initial()), Some(*right.initial()));
    Dfa::new(initial, transitions, accepting, false)
}

/// Drop every state not reachable from the initial state.
pub fn remove_unreachable<S: State>(dfa: &Dfa<S>) -> Dfa<S> {
    let mut reachable: FxHashSet<S> = FxHashSet::default();
    let mut queue = VecDeque::new();
    reachable.insert(dfa.initial().clone());
    queue.push_back(dfa.initial().clone());
    while let Some(state) = queue.pop_front() {
        if let Some(row) = dfa.row(&state) {
            for target in row.values() {
                if reachable.insert(target.clone()) {
                    queue.push_back(target.clone());
                }
            }
        }
    }

    let transitions = dfa
        .transitions()
        .filter(|(from, _)| reachable.contains(*from))
        .map(|(from, row)| (from.clone(), row.clone()))
        .collect();
    let accepting: Vec<S> = dfa
        .accepting()
        .iter()
        .filter(|s| reachable.contains(*s))
        .cloned()
        .collect();
    Dfa::new(dfa.initial().clone(), transitions, accepting, false)
}

/// Product, pruned and relabelled with dense ids.
pub fn combine(left: &Dfa, right: &Dfa, op: Combine) -> Dfa {
    remove_unreachable(&product(left, right, op)).rewrite()
}

pub fn intersect(left: &Dfa, right: &Dfa) -> Dfa {
    combine(left, right, Combine::Intersection)
}

pub fn union(left: &Dfa, right: &Dfa) -> Dfa {
    combine(left, right, Combine::Union)
}

pub fn diff(left: &Dfa, right: &Dfa) -> Dfa {
    combine(left, right, Combine::Difference)
}

/// True iff some accepting state is reachable from the initial state.
pub fn matches_at_least_one<S: State>(dfa: &Dfa<S>) -> bool {
    let mut visited: FxHashSet<&S> = FxHashSet::default();
    let mut stack = vec![dfa.initial()];
    while let Some(state) = stack.pop() {
        if !visited.insert(state) {
            continue;
        }
        if dfa.is_accepting(state) {
            return true;
        }
        if let Some(row) = dfa.row(state) {
            stack.extend(row.values());
        }
    }
    false
}

pub fn do_intersect(left: &Dfa, right: &Dfa) -> bool {
    matches_at_least_one(&product(left, right, Combine::Intersection))
}

pub fn is_subset_of(left: &Dfa, right: &Dfa) -> bool {
    !matches_at_least_one(&product(left, right, Combine::Difference))
}

pub fn is_proper_subset_of(left: &Dfa, right: &Dfa) -> bool {
    is_subset_of(left, right) && matches_at_least_one(&product(right, left, Combine::Difference))
}

pub fn equivalent(left: &Dfa, right: &Dfa) -> bool {
    is_subset_of(left, right) && is_subset_of(right, left)
}
