//! Nondeterministic automata.
//!
//! An `Nfa` is a plain list of transitions, which is how the compiler emits it
//! (Thompson construction) and how reversal produces it. Nothing ever steps an
//! NFA directly; it is always determinized first.

use rustc_hash::FxHashSet;

use super::arena::{StateArena, StateId};
use super::dfa::Dfa;
use super::interval::CharInterval;

/// Label of an NFA transition.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Symbol {
    /// Taken without consuming input.
    Epsilon,
    /// Consumes one code point inside the interval.
    Interval(CharInterval),
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
    pub symbol: Symbol,
}

impl Transition {
    pub fn epsilon(from: StateId, to: StateId) -> Self {
        Self {
            from,
            to,
            symbol: Symbol::Epsilon,
        }
    }

    pub fn on(from: StateId, interval: CharInterval, to: StateId) -> Self {
        Self {
            from,
            to,
            symbol: Symbol::Interval(interval),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Nfa {
    pub initial: StateId,
    pub transitions: Vec<Transition>,
    pub accepting: FxHashSet<StateId>,
}

impl Nfa {
    pub fn new<A>(initial: StateId, transitions: Vec<Transition>, accepting: A) -> Self
    where
        A: IntoIterator<Item = StateId>,
    {
        Self {
            initial,
            transitions,
            accepting: accepting.into_iter().collect(),
        }
    }

    /// One past the largest state index mentioned anywhere in the automaton.
    pub fn state_bound(&self) -> usize {
        let from_transitions = self
            .transitions
            .iter()
            .map(|t| t.from.index().max(t.to.index()));
        let from_accepting = self.accepting.iter().map(|s| s.index());
        from_transitions
            .chain(from_accepting)
            .fold(self.initial.index(), usize::max)
            + 1
    }

    /// The automaton of the reversed language of `dfa`.
    ///
    /// Every DFA transition is flipped, a fresh initial state gets an epsilon
    /// edge to each old accepting state, and the only accepting state is the
    /// old initial state.
    pub fn reverse(dfa: &Dfa) -> Nfa {
        // dfa states are dense after `Dfa::rewrite`, but don't rely on it
        let mut bound = dfa.initial().index() + 1;
        let mut transitions = Vec::new();
        for (from, row) in dfa.transitions() {
            for (interval, to) in row {
                bound = bound.max(from.index() + 1).max(to.index() + 1);
                transitions.push(Transition::on(*to, *interval, *from));
            }
        }
        for accepting in dfa.accepting() {
            bound = bound.max(accepting.index() + 1);
        }

        let initial = StateArena::starting_at(bound).alloc();
        transitions.extend(
            dfa.accepting()
                .iter()
                .map(|accepting| Transition::epsilon(initial, *accepting)),
        );
        Nfa::new(initial, transitions, [*dfa.initial()])
    }
}
