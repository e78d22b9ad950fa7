//! Tree to automaton compilation.
//!
//! The tree is compiled into an NFA by Thompson construction between two
//! designated states, `from` and `to`; the NFA is then determinized. Every
//! transition is labelled with the partition pieces the universe assigned to
//! the node's span, which keeps all automata of one universe comparable.
//!
//! ## Set operations inside a tree
//!
//! `Intersection`, `Union` and `Difference` nodes compile both operands to DFAs
//! on their own, combine those by product construction, and splice the result
//! back into the NFA under construction (renumbered into its arena).
//!
//! ## Lookarounds
//!
//! There is no lookaround at match time. Inside a concatenation, the first
//! lookaround is rewritten into a set operation with its neighbours:
//!
//! ```text
//!   P (?=B) C   =>  P (C ∩ B·Σ*)
//!   P (?!B) C   =>  P (C − B·Σ*)
//!   P (?<=B) C  =>  (P ∩ Σ*·B) C
//!   P (?<!B) C  =>  (P − Σ*·B) C
//! ```
//!
//! and the result is compiled again, which handles any further lookarounds.
//! Adjacent negative lookaheads are merged first: `(?!X)(?!Y)` is `(?!X|Y)`.

use std::borrow::Cow;
use std::time::Instant;

use log::trace;

use crate::automaton::{
    combine, determinize, CharInterval, Combine, Dfa, Nfa, StateArena, StateId, Transition,
};
use crate::universe::Universe;
use crate::{Error, PatternError, Result};

use super::tree::{Condition, Direction, Node};

/// Compile `tree` into a DFA over the alphabet of `universe`.
pub fn compile_dfa(tree: &Node, universe: &Universe) -> Result<Dfa> {
    let start = Instant::now();
    let mut compiler = Compiler::new(universe);
    let initial = compiler.arena.alloc();
    let accepting = compiler.arena.alloc();
    compiler.add_node(tree, initial, accepting)?;

    let nfa = Nfa::new(initial, compiler.transitions, [accepting]);
    let dfa = determinize(&nfa).rewrite();
    trace!(
        "compiled tree into {} NFA states and {} DFA states in {:?}",
        compiler.arena.len(),
        dfa.state_count(),
        start.elapsed()
    );
    Ok(dfa)
}

struct Compiler<'u> {
    universe: &'u Universe,
    arena: StateArena,
    transitions: Vec<Transition>,
}

impl<'u> Compiler<'u> {
    fn new(universe: &'u Universe) -> Self {
        Self {
            universe,
            arena: StateArena::new(),
            transitions: Vec::new(),
        }
    }

    fn epsilon(&mut self, from: StateId, to: StateId) {
        self.transitions.push(Transition::epsilon(from, to));
    }

    fn add_node(&mut self, node: &Node, from: StateId, to: StateId) -> Result<()> {
        match node {
            Node::Lit(cp) => self.add_span(CharInterval::single(*cp), from, to),
            Node::Range(range) => self.add_span(range.span(), from, to),
            Node::Wildcard => self.add_span(CharInterval::ALL, from, to),
            Node::CharSet(ranges) => {
                for range in ranges {
                    self.add_span(range.span(), from, to)?;
                }
                Ok(())
            }
            Node::Juxt(values) => self.add_juxt(values, from, to),
            Node::Lookaround { .. } => self.add_juxt(std::slice::from_ref(node), from, to),
            Node::Disj(values) => {
                for value in values {
                    self.add_node(value, from, to)?;
                }
                Ok(())
            }
            Node::Rep { min, max, value } => self.add_rep(*min, *max, value, from, to),
            Node::CaptureGroup(value) => {
                let inner_from = self.arena.alloc();
                let inner_to = self.arena.alloc();
                self.epsilon(from, inner_from);
                self.epsilon(inner_to, to);
                self.add_node(value, inner_from, inner_to)
            }
            Node::NamedCaptureGroup { name, .. } => Err(PatternError::new(format!(
                "named capture groups are not supported: `{}`",
                name
            ))
            .into()),
            Node::Intersection(left, right) => {
                self.add_operation(Combine::Intersection, left, right, from, to)
            }
            Node::Union(left, right) => self.add_operation(Combine::Union, left, right, from, to),
            Node::Difference(left, right) => {
                self.add_operation(Combine::Difference, left, right, from, to)
            }
        }
    }

    /// One transition per partition piece of `span`.
    fn add_span(&mut self, span: CharInterval, from: StateId, to: StateId) -> Result<()> {
        let pieces = self.universe.intervals(span).ok_or(Error::OutsideUniverse {
            from: span.from(),
            to: span.to(),
        })?;
        self.transitions
            .extend(pieces.iter().map(|piece| Transition::on(from, *piece, to)));
        Ok(())
    }

    fn add_juxt(&mut self, values: &[Node], from: StateId, to: StateId) -> Result<()> {
        let values = merge_negative_lookaheads(values);
        let Some(index) = values.iter().position(Node::is_lookaround) else {
            return self.add_sequence(&values, from, to);
        };
        let (prefix, rest) = values.split_at(index);
        let Node::Lookaround { dir, cond, value } = &rest[0] else {
            unreachable!("position() returned a node that is not a lookaround");
        };
        let suffix = &rest[1..];
        let op: fn(Node, Node) -> Node = match cond {
            Condition::Positive => Node::intersection,
            Condition::Negative => Node::difference,
        };
        let any = Node::star(Node::Wildcard);

        match dir {
            Direction::Ahead => {
                let condition = Node::Juxt(vec![(**value).clone(), any]);
                let constrained = op(Node::Juxt(suffix.to_vec()), condition);
                if prefix.is_empty() {
                    return self.add_node(&constrained, from, to);
                }
                let middle = self.arena.alloc();
                self.add_sequence(prefix, from, middle)?;
                self.add_node(&constrained, middle, to)
            }
            Direction::Behind => {
                let condition = Node::Juxt(vec![any, (**value).clone()]);
                let constrained = op(Node::Juxt(prefix.to_vec()), condition);
                if suffix.is_empty() {
                    return self.add_node(&constrained, from, to);
                }
                // the suffix may hold more lookarounds, which must see this
                // constrained prefix as part of their own prefix
                let mut rewritten = Vec::with_capacity(suffix.len() + 1);
                rewritten.push(constrained);
                rewritten.extend_from_slice(suffix);
                self.add_juxt(&rewritten, from, to)
            }
        }
    }

    /// Plain concatenation, chained through fresh intermediate states.
    fn add_sequence(&mut self, values: &[Node], from: StateId, to: StateId) -> Result<()> {
        match values {
            [] => {
                self.epsilon(from, to);
                Ok(())
            }
            [single] => self.add_node(single, from, to),
            [init @ .., last] => {
                let mut current = from;
                for value in init {
                    let next = self.arena.alloc();
                    self.add_node(value, current, next)?;
                    current = next;
                }
                self.add_node(last, current, to)
            }
        }
    }

    /// `count` copies of `value` in a row, starting at `from`; returns the end.
    fn add_copies(&mut self, value: &Node, count: u32, from: StateId) -> Result<StateId> {
        let mut current = from;
        for _ in 0..count {
            let next = self.arena.alloc();
            self.add_node(value, current, next)?;
            current = next;
        }
        Ok(current)
    }

    fn add_rep(
        &mut self,
        min: u32,
        max: Option<u32>,
        value: &Node,
        from: StateId,
        to: StateId,
    ) -> Result<()> {
        match (min, max) {
            (min, Some(max)) if max < min => Err(PatternError::new(format!(
                "illegal repetition range {{{},{}}}",
                min, max
            ))
            .into()),
            (1, Some(1)) => self.add_node(value, from, to),
            (0, Some(0)) => {
                self.epsilon(from, to);
                Ok(())
            }
            // v{n,} is n copies followed by v*
            (min, None) if min > 1 => {
                let end = self.add_copies(value, min, from)?;
                self.add_rep(0, None, value, end, to)
            }
            (min @ (0 | 1), None) => {
                let loop_start = self.arena.alloc();
                let loop_end = self.arena.alloc();
                self.epsilon(from, loop_start);
                self.epsilon(loop_end, to);
                self.epsilon(loop_end, loop_start);
                if min == 0 {
                    self.epsilon(from, to);
                }
                self.add_node(value, loop_start, loop_end)
            }
            // v{n,m} is n-1 copies followed by v{1,m-n+1}
            (min, Some(max)) if min > 1 => {
                let copies = min - 1;
                let end = self.add_copies(value, copies, from)?;
                self.add_rep(1, Some(max - copies), value, end, to)
            }
            (1, Some(max)) => {
                let mut current = self.arena.alloc();
                self.add_node(value, from, current)?;
                for _ in 1..max - 1 {
                    let next = self.arena.alloc();
                    self.epsilon(current, to);
                    self.add_node(value, current, next)?;
                    current = next;
                }
                self.epsilon(current, to);
                self.add_node(value, current, to)
            }
            (0, Some(max)) => {
                let mut current = from;
                for _ in 0..max - 1 {
                    let next = self.arena.alloc();
                    self.epsilon(current, to);
                    self.add_node(value, current, next)?;
                    current = next;
                }
                self.epsilon(current, to);
                self.add_node(value, current, to)
            }
            (min, max) => unreachable!("repetition bounds {} {:?} are not covered", min, max),
        }
    }

    fn add_operation(
        &mut self,
        op: Combine,
        left: &Node,
        right: &Node,
        from: StateId,
        to: StateId,
    ) -> Result<()> {
        let left = compile_dfa(left, self.universe)?;
        let right = compile_dfa(right, self.universe)?;
        let result = combine(&left, &right, op);

        let fragment = result.to_nfa_in(&mut self.arena);
        self.epsilon(from, fragment.initial);
        for accepting in &fragment.accepting {
            self.epsilon(*accepting, to);
        }
        self.transitions.extend(fragment.transitions);
        Ok(())
    }
}

/// `(?!X)(?!Y)` becomes `(?!X|Y)`, repeatedly.
fn merge_negative_lookaheads(values: &[Node]) -> Cow<'_, [Node]> {
    let is_negative_lookahead = |node: &Node| {
        matches!(
            node,
            Node::Lookaround {
                dir: Direction::Ahead,
                cond: Condition::Negative,
                ..
            }
        )
    };
    if !values
        .windows(2)
        .any(|pair| is_negative_lookahead(&pair[0]) && is_negative_lookahead(&pair[1]))
    {
        return Cow::Borrowed(values);
    }

    let mut merged: Vec<Node> = Vec::with_capacity(values.len());
    for node in values {
        match (merged.last_mut(), node) {
            (
                Some(Node::Lookaround {
                    dir: Direction::Ahead,
                    cond: Condition::Negative,
                    value: previous,
                }),
                Node::Lookaround {
                    dir: Direction::Ahead,
                    cond: Condition::Negative,
                    value,
                },
            ) => {
                let first = std::mem::replace(previous.as_mut(), Node::Juxt(Vec::new()));
                **previous = match first {
                    Node::Disj(mut alternatives) => {
                        alternatives.push((**value).clone());
                        Node::Disj(alternatives)
                    }
                    first => Node::Disj(vec![first, (**value).clone()]),
                };
            }
            _ => merged.push(node.clone()),
        }
    }
    Cow::Owned(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regexp::Normalizer;

    fn compile(tree: &Node) -> Dfa {
        let universe = Universe::new([tree], Normalizer::None, false);
        compile_dfa(tree, &universe).unwrap()
    }

    fn accepts(dfa: &Dfa, s: &str) -> bool {
        dfa.match_code_points(s.chars().map(u32::from)).matched
    }

    #[test]
    fn test_literal_sequence() {
        let dfa = compile(&Node::literal_str("abc"));
        assert!(accepts(&dfa, "abc"));
        assert!(!accepts(&dfa, "ab"));
        assert!(!accepts(&dfa, "abcd"));
    }

    #[test]
    fn test_bounded_repetitions() {
        let cases: &[(u32, Option<u32>, &[usize], &[usize])] = &[
            (0, Some(0), &[0], &[1]),
            (1, Some(1), &[1], &[0, 2]),
            (0, Some(3), &[0, 1, 2, 3], &[4]),
            (1, Some(3), &[1, 2, 3], &[0, 4]),
            (2, Some(4), &[2, 3, 4], &[0, 1, 5]),
            (3, Some(3), &[3], &[2, 4]),
            (0, None, &[0, 1, 7], &[]),
            (1, None, &[1, 2, 7], &[0]),
            (3, None, &[3, 4, 9], &[0, 2]),
        ];
        for (min, max, good, bad) in cases {
            let dfa = compile(&Node::rep(*min, *max, Node::lit('a')));
            for n in *good {
                assert!(accepts(&dfa, &"a".repeat(*n)), "a{{{},{:?}}} should accept {} a's", min, max, n);
            }
            for n in *bad {
                assert!(!accepts(&dfa, &"a".repeat(*n)), "a{{{},{:?}}} should reject {} a's", min, max, n);
            }
        }
    }

    #[test]
    fn test_inverted_repetition_is_rejected() {
        let tree = Node::rep(3, Some(2), Node::lit('a'));
        let universe = Universe::new([&tree], Normalizer::None, false);
        let err = compile_dfa(&tree, &universe).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern(_)), "{:?}", err);
    }

    #[test]
    fn test_named_group_is_rejected() {
        let tree = Node::NamedCaptureGroup {
            name: "x".into(),
            value: Box::new(Node::lit('a')),
        };
        let universe = Universe::new([&tree], Normalizer::None, false);
        let err = compile_dfa(&tree, &universe).unwrap_err();
        assert!(err.to_string().contains("named capture groups"));
    }

    #[test]
    fn test_span_outside_universe() {
        let universe = Universe::new([&Node::lit('a')], Normalizer::None, false);
        let err = compile_dfa(&Node::lit('b'), &universe).unwrap_err();
        assert_eq!(err, Error::OutsideUniverse { from: 98, to: 98 });
    }

    #[test]
    fn test_lookahead() {
        // (?=ab).*
        let tree = Node::Juxt(vec![
            Node::lookaround(Direction::Ahead, Condition::Positive, Node::literal_str("ab")),
            Node::star(Node::Wildcard),
        ]);
        let dfa = compile(&tree);
        assert!(accepts(&dfa, "ab"));
        assert!(accepts(&dfa, "abc"));
        assert!(!accepts(&dfa, "a"));
        assert!(!accepts(&dfa, "ba"));
    }

    #[test]
    fn test_negative_lookbehind() {
        // .*(?<!x)y
        let tree = Node::Juxt(vec![
            Node::star(Node::Wildcard),
            Node::lookaround(Direction::Behind, Condition::Negative, Node::lit('x')),
            Node::lit('y'),
        ]);
        let dfa = compile(&tree);
        assert!(accepts(&dfa, "y"));
        assert!(accepts(&dfa, "aay"));
        assert!(!accepts(&dfa, "xy"));
        assert!(!accepts(&dfa, "axy"));
    }

    #[test]
    fn test_merge_negative_lookaheads() {
        let neg = |c| Node::lookaround(Direction::Ahead, Condition::Negative, Node::lit(c));
        let values = vec![neg('a'), neg('b'), neg('c'), Node::lit('d')];
        let merged = merge_negative_lookaheads(&values);
        assert_eq!(
            merged.as_ref(),
            &[
                Node::lookaround(
                    Direction::Ahead,
                    Condition::Negative,
                    Node::Disj(vec![Node::lit('a'), Node::lit('b'), Node::lit('c')])
                ),
                Node::lit('d')
            ]
        );
        let untouched = vec![neg('a'), Node::lit('x'), neg('b')];
        assert!(matches!(merge_negative_lookaheads(&untouched), Cow::Borrowed(_)));
    }

    #[test]
    fn test_operation_nodes() {
        let letters = Node::star(Node::range('a', 'z'));
        let vowels = Node::star(Node::CharSet(vec![
            crate::regexp::CharRange::chars('a', 'a'),
            crate::regexp::CharRange::chars('e', 'e'),
        ]));
        let tree = Node::difference(letters, vowels);
        let dfa = compile(&tree);
        assert!(accepts(&dfa, "abc"));
        assert!(!accepts(&dfa, "aea"));
        assert!(!accepts(&dfa, ""));
    }
}
