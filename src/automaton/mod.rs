//! Finite automata over code point intervals.
//!
//! The key components are:
//!
//! - `CharInterval`: a closed code point range, the transition label
//! - `Nfa`: a list of (possibly epsilon) transitions, produced by the compiler
//! - `Dfa`: a partial deterministic automaton, generic over its state type
//!
//! # Module Organization
//!
//! - `arena`: `StateId` and the per-compilation `StateArena`
//! - `interval`: intervals and the alphabet partitioner
//! - `state`: composite states (`PairState`, `MultiState`)
//! - `nfa`, `dfa`: the two automaton kinds
//! - `powerset`: NFA to DFA by subset construction
//! - `algebra`: product construction and language predicates
//! - `minimize`: Brzozowski minimization
//! - `matcher`: running a DFA over decoded input

mod algebra;
mod arena;
mod dfa;
mod interval;
mod matcher;
mod minimize;
mod nfa;
mod powerset;
mod sparse_set;
mod state;

pub use algebra::{
    combine, diff, do_intersect, equivalent, intersect, is_proper_subset_of, is_subset_of,
    matches_at_least_one, product, remove_unreachable, union, Combine,
};
pub use arena::{StateArena, StateId};
pub use dfa::{Dfa, Row};
pub use interval::{partition, CharInterval, MAX_CODE_POINT, MIN_CODE_POINT};
pub use matcher::{utf16_code_points, MatchResult, Utf8Chars};
pub use minimize::minimize;
pub use nfa::{Nfa, Symbol, Transition};
pub use powerset::determinize;
pub use state::{MultiState, PairState, State};
