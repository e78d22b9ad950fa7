//! Deterministic automata.
//!
//! A `Dfa` is generic over its state type so that the intermediate results of
//! the algorithms (`PairState` products, `MultiState` powersets) share one
//! representation with the compiled automata. The transition table is *partial*:
//! a missing row or a missing interval means "reject".
//!
//! Rows are `BTreeMap`s keyed by interval. The intervals of a row never overlap,
//! so the greatest key whose start is at most a code point is the only
//! candidate that can contain it (see `Dfa::next_state`).

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use super::arena::{StateArena, StateId};
use super::interval::CharInterval;
use super::nfa::{Nfa, Transition};
use super::state::State;

/// Outgoing transitions of one state.
pub type Row<S> = BTreeMap<CharInterval, S>;

#[derive(Clone)]
pub struct Dfa<S: State = StateId> {
    initial: S,
    transitions: FxHashMap<S, Row<S>>,
    accepting: FxHashSet<S>,
    minimal: bool,
}

impl<S: State> Dfa<S> {
    pub fn new<A>(initial: S, transitions: FxHashMap<S, Row<S>>, accepting: A, minimal: bool) -> Self
    where
        A: IntoIterator<Item = S>,
    {
        Self {
            initial,
            transitions,
            accepting: accepting.into_iter().collect(),
            minimal,
        }
    }

    #[inline]
    pub fn initial(&self) -> &S {
        &self.initial
    }

    pub fn accepting(&self) -> &FxHashSet<S> {
        &self.accepting
    }

    #[inline]
    pub fn is_accepting(&self, state: &S) -> bool {
        self.accepting.contains(state)
    }

    /// True when this automaton is known to be the minimal one for its language.
    pub fn is_minimal(&self) -> bool {
        self.minimal
    }

    /// Outgoing transitions of `state`, if it has any.
    #[inline]
    pub fn row(&self, state: &S) -> Option<&Row<S>> {
        self.transitions.get(state)
    }

    pub fn transitions(&self) -> impl Iterator<Item = (&S, &Row<S>)> + '_ {
        self.transitions.iter()
    }

    /// The state reached from `current` by consuming `code_point`.
    #[inline]
    pub fn next_state(&self, current: &S, code_point: u32) -> Option<&S> {
        let row = self.transitions.get(current)?;
        let (interval, target) = row
            .range(..=CharInterval::floor_key(code_point))
            .next_back()?;
        interval.contains(code_point).then_some(target)
    }

    /// Every state mentioned anywhere: initial, row owners, targets, accepting.
    pub fn all_states(&self) -> FxHashSet<S> {
        let mut states = FxHashSet::default();
        states.insert(self.initial.clone());
        for (from, row) in &self.transitions {
            states.insert(from.clone());
            states.extend(row.values().cloned());
        }
        states.extend(self.accepting.iter().cloned());
        states
    }

    /// Every interval used on any transition.
    pub fn all_chars(&self) -> BTreeSet<CharInterval> {
        self.transitions
            .values()
            .flat_map(|row| row.keys().copied())
            .collect()
    }

    pub fn state_count(&self) -> usize {
        self.all_states().len()
    }

    /// Relabel every state with a dense `StateId`.
    ///
    /// Ids are assigned in breadth-first order from the initial state (which
    /// always becomes `s0`), then to any state not reachable from it.
    pub fn rewrite(&self) -> Dfa {
        let mut arena = StateArena::new();
        let mut ids: FxHashMap<&S, StateId> = FxHashMap::default();
        let mut queue = VecDeque::new();

        ids.insert(&self.initial, arena.alloc());
        queue.push_back(&self.initial);
        while let Some(state) = queue.pop_front() {
            if let Some(row) = self.transitions.get(state) {
                for target in row.values() {
                    if !ids.contains_key(target) {
                        ids.insert(target, arena.alloc());
                        queue.push_back(target);
                    }
                }
            }
        }
        for (from, row) in &self.transitions {
            ids.entry(from).or_insert_with(|| arena.alloc());
            for target in row.values() {
                ids.entry(target).or_insert_with(|| arena.alloc());
            }
        }
        for state in &self.accepting {
            ids.entry(state).or_insert_with(|| arena.alloc());
        }

        let transitions = self
            .transitions
            .iter()
            .map(|(from, row)| {
                let row = row
                    .iter()
                    .map(|(interval, target)| (*interval, ids[target]))
                    .collect();
                (ids[from], row)
            })
            .collect();
        let accepting: Vec<StateId> = self.accepting.iter().map(|s| ids[s]).collect();
        Dfa::new(ids[&self.initial], transitions, accepting, self.minimal)
    }
}

impl Dfa {
    /// The automaton accepting no string at all.
    pub fn nothing() -> Dfa {
        let initial = StateArena::new().alloc();
        Dfa::new(initial, FxHashMap::default(), [], true)
    }

    pub(crate) fn into_minimal(mut self) -> Dfa {
        self.minimal = true;
        self
    }

    /// Copy this automaton into `arena` as an NFA fragment with fresh ids, so it
    /// can be spliced into an automaton under construction.
    pub fn to_nfa_in(&self, arena: &mut StateArena) -> Nfa {
        let mut ids: FxHashMap<StateId, StateId> = FxHashMap::default();
        let mut fresh = |state: StateId, arena: &mut StateArena| {
            *ids.entry(state).or_insert_with(|| arena.alloc())
        };

        let initial = fresh(self.initial, arena);
        let mut transitions = Vec::new();
        for (from, row) in &self.transitions {
            let from = fresh(*from, arena);
            for (interval, to) in row {
                let to = fresh(*to, arena);
                transitions.push(Transition::on(from, *interval, to));
            }
        }
        let accepting: Vec<StateId> = self
            .accepting
            .iter()
            .map(|s| fresh(*s, arena))
            .collect();
        Nfa::new(initial, transitions, accepting)
    }
}

impl<S: State> fmt::Debug for Dfa<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "initial: {:?}", self.initial)?;
        let mut rows: Vec<String> = self
            .transitions
            .iter()
            .map(|(from, row)| {
                let edges: Vec<String> = row
                    .iter()
                    .map(|(interval, to)| format!("{:?} -> {:?}", interval, to))
                    .collect();
                format!("{:?}: {}", from, edges.join(", "))
            })
            .collect();
        rows.sort();
        for row in rows {
            writeln!(f, "  {}", row)?;
        }
        let mut accepting: Vec<String> = self.accepting.iter().map(|s| format!("{:?}", s)).collect();
        accepting.sort();
        write!(f, "accepting: [{}]", accepting.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::state::PairState;

    fn interval(c: char) -> CharInterval {
        CharInterval::single(c as u32)
    }

    /// s0 --a--> s1 --[b-d]--> s1, s1 accepting
    fn ab_star() -> Dfa {
        let mut arena = StateArena::new();
        let s0 = arena.alloc();
        let s1 = arena.alloc();
        let mut transitions = FxHashMap::default();
        transitions.insert(s0, BTreeMap::from([(interval('a'), s1)]));
        transitions.insert(
            s1,
            BTreeMap::from([(CharInterval::new('b' as u32, 'd' as u32), s1)]),
        );
        Dfa::new(s0, transitions, [s1], false)
    }

    #[test]
    fn test_next_state_uses_floor_interval() {
        let dfa = ab_star();
        let s1 = *dfa.next_state(dfa.initial(), 'a' as u32).unwrap();
        assert_eq!(dfa.next_state(&s1, 'c' as u32), Some(&s1));
        assert_eq!(dfa.next_state(&s1, 'd' as u32), Some(&s1));
        assert_eq!(dfa.next_state(&s1, 'e' as u32), None);
        assert_eq!(dfa.next_state(&s1, 'a' as u32), None);
        assert_eq!(dfa.next_state(dfa.initial(), 'b' as u32), None);
    }

    #[test]
    fn test_all_states_and_chars() {
        let dfa = ab_star();
        assert_eq!(dfa.state_count(), 2);
        assert_eq!(dfa.all_chars().len(), 2);
        assert_eq!(Dfa::nothing().state_count(), 1);
        assert!(Dfa::nothing().all_chars().is_empty());
    }

    #[test]
    fn test_rewrite_pair_states() {
        let a = StateArena::new().alloc();
        let start = PairState::new(Some(a), Some(a));
        let dead = PairState::new(None, Some(a));
        let mut transitions = FxHashMap::default();
        transitions.insert(start, BTreeMap::from([(interval('x'), dead)]));
        let dfa = Dfa::new(start, transitions, [dead], false);

        let rewritten = dfa.rewrite();
        assert_eq!(rewritten.initial().index(), 0);
        assert_eq!(rewritten.state_count(), 2);
        let next = rewritten.next_state(rewritten.initial(), 'x' as u32).unwrap();
        assert!(rewritten.is_accepting(next));
        assert!(!rewritten.is_accepting(rewritten.initial()));
    }

    #[test]
    fn test_rewrite_keeps_unreachable_states() {
        let mut arena = StateArena::new();
        let s0 = arena.alloc();
        let orphan = arena.alloc();
        let dfa = Dfa::new(s0, FxHashMap::default(), [orphan], false);
        let rewritten = dfa.rewrite();
        assert_eq!(rewritten.state_count(), 2);
        assert_eq!(rewritten.accepting().len(), 1);
    }

    #[test]
    fn test_to_nfa_in_uses_fresh_ids() {
        let dfa = ab_star();
        let mut arena = StateArena::new();
        arena.alloc();
        arena.alloc();
        let nfa = dfa.to_nfa_in(&mut arena);
        assert!(nfa.initial.index() >= 2);
        assert_eq!(nfa.transitions.len(), 2);
        assert_eq!(arena.len(), 4);
    }
}
