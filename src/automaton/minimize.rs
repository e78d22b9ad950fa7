//! Brzozowski minimization: determinize(reverse(determinize(reverse(dfa)))).
//!
//! Determinizing a reversed automaton yields a DFA in which no two states
//! accept the same set of suffixes, so doing it twice gives the minimal DFA of
//! the original language (minimal among *partial* DFAs: no dead state is added).

use std::time::Instant;

use log::debug;

use super::dfa::Dfa;
use super::nfa::Nfa;
use super::powerset::determinize;

pub fn minimize(dfa: &Dfa) -> Dfa {
    if dfa.is_minimal() {
        return dfa.clone();
    }
    let start = Instant::now();
    let reversed = determinize(&Nfa::reverse(dfa)).rewrite();
    let minimal = determinize(&Nfa::reverse(&reversed)).rewrite().into_minimal();
    debug!(
        "minimized DFA from {} to {} states in {:?}",
        dfa.state_count(),
        minimal.state_count(),
        start.elapsed()
    );
    minimal
}
