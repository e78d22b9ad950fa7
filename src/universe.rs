//! The shared alphabet of a group of patterns.
//!
//! Set operations between two compiled regexes are only meaningful when both
//! were compiled over the same partition of the code point space. A `Universe`
//! fixes that partition (plus the input normalization) once for a group of
//! trees; every regex compiled against it holds an `Arc` to it, and two regexes
//! are compatible exactly when they point to the same one.

use std::fmt;
use std::sync::Arc;

use log::debug;
use rustc_hash::FxHashMap;

use crate::automaton::{partition, CharInterval};
use crate::regexp::{Node, Normalization, Normalizer};

pub struct Universe {
    alphabet: FxHashMap<CharInterval, Vec<CharInterval>>,
    normalizer: Normalizer,
    canonical_eq: bool,
}

impl Universe {
    /// Partition the code points used by `trees`.
    pub fn new<'a, I>(trees: I, normalizer: Normalizer, canonical_eq: bool) -> Arc<Universe>
    where
        I: IntoIterator<Item = &'a Node>,
    {
        let mut spans = Vec::new();
        let mut count = 0;
        for tree in trees {
            collect_spans(tree, &mut spans);
            count += 1;
        }
        let alphabet = partition(spans);
        debug!(
            "universe of {} trees: {} distinct spans, {} intervals",
            count,
            alphabet.len(),
            alphabet.values().map(Vec::len).sum::<usize>()
        );
        Arc::new(Universe {
            alphabet,
            normalizer,
            canonical_eq,
        })
    }

    /// The partition pieces of `span`, if the span was collected.
    pub fn intervals(&self, span: CharInterval) -> Option<&[CharInterval]> {
        self.alphabet.get(&span).map(Vec::as_slice)
    }

    pub fn normalizer(&self) -> Normalizer {
        self.normalizer
    }

    pub fn canonical_eq(&self) -> bool {
        self.canonical_eq
    }

    pub fn normalization(&self) -> Normalization {
        Normalization::new(self.normalizer, self.canonical_eq)
    }
}

impl fmt::Debug for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Universe")
            .field("spans", &self.alphabet.len())
            .field("normalizer", &self.normalizer)
            .field("canonical_eq", &self.canonical_eq)
            .finish()
    }
}

/// Every span the compiler will look up for `node`.
fn collect_spans(node: &Node, out: &mut Vec<CharInterval>) {
    match node {
        Node::Lit(_) | Node::Range(_) | Node::Wildcard => out.extend(node.range_span()),
        Node::CharSet(ranges) => out.extend(ranges.iter().map(|r| r.span())),
        Node::Juxt(values) | Node::Disj(values) => {
            for value in values {
                collect_spans(value, out);
            }
        }
        // the rewrite pads the condition with Σ*
        Node::Lookaround { value, .. } => {
            collect_spans(value, out);
            out.push(CharInterval::ALL);
        }
        Node::Rep { value, .. }
        | Node::CaptureGroup(value)
        | Node::NamedCaptureGroup { value, .. } => collect_spans(value, out),
        Node::Intersection(left, right) | Node::Union(left, right) | Node::Difference(left, right) => {
            collect_spans(left, out);
            collect_spans(right, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regexp::{CharRange, Condition, Direction};

    #[test]
    fn test_collects_every_span() {
        let tree = Node::Juxt(vec![
            Node::lit('m'),
            Node::range('a', 'z'),
            Node::CharSet(vec![CharRange::chars('0', '9'), CharRange::chars('A', 'F')]),
        ]);
        let universe = Universe::new([&tree], Normalizer::None, false);
        assert_eq!(
            universe.intervals(CharInterval::single('m' as u32)),
            Some(&[CharInterval::single('m' as u32)][..])
        );
        let letters = universe.intervals(CharInterval::new('a' as u32, 'z' as u32)).unwrap();
        assert_eq!(letters.len(), 3);
        assert!(universe.intervals(CharInterval::ALL).is_none());
    }

    #[test]
    fn test_lookaround_adds_wildcard() {
        let tree = Node::lookaround(Direction::Ahead, Condition::Positive, Node::lit('x'));
        let universe = Universe::new([&tree], Normalizer::None, false);
        assert_eq!(universe.intervals(CharInterval::ALL).map(<[_]>::len), Some(3));
    }

    #[test]
    fn test_shared_across_trees() {
        let a = Node::range('a', 'c');
        let b = Node::range('b', 'd');
        let universe = Universe::new([&a, &b], Normalizer::None, false);
        let left = universe.intervals(CharInterval::new('a' as u32, 'c' as u32)).unwrap();
        let right = universe.intervals(CharInterval::new('b' as u32, 'd' as u32)).unwrap();
        assert_eq!(left[1], right[0]);
    }
}
