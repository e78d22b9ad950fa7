//! Case folding and canonical decomposition.
//!
//! Case-insensitive and canonical-equivalence matching are both implemented by
//! normalizing twice: once when building the tree (every literal and set is
//! replaced by its normalized image) and once on the input. Both sides apply
//! the same mapping, so a pattern never has to know about the other case or
//! the other composition form.
//!
//! Only single code point case mappings are used: a character whose lowercase
//! form is longer than one code point is left unchanged.

use std::sync::LazyLock;

use unicode_normalization::char::{canonical_combining_class, decompose_canonical};

use super::tree::{complement_ranges, union_ranges, CharRange, Node};
use crate::automaton::MAX_CODE_POINT;

/// Per code point case mapping applied to patterns and inputs alike.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Normalizer {
    #[default]
    None,
    AsciiLowercase,
    UnicodeLowercase,
}

/// Code points whose lowercase form is another single code point, sorted.
static UNICODE_LOWERCASE_CHANGES: LazyLock<Vec<(u32, u32)>> = LazyLock::new(|| {
    (0..=MAX_CODE_POINT)
        .filter_map(char::from_u32)
        .filter_map(|c| {
            let mut lower = c.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(l), None) if l != c => Some((c as u32, l as u32)),
                _ => None,
            }
        })
        .collect()
});

static ASCII_LOWERCASE_CHANGES: LazyLock<Vec<(u32, u32)>> =
    LazyLock::new(|| ('A'..='Z').map(|c| (c as u32, c.to_ascii_lowercase() as u32)).collect());

/// Code points with a canonical decomposition, sorted.
static DECOMPOSABLE: LazyLock<Vec<u32>> = LazyLock::new(|| {
    (0..=MAX_CODE_POINT)
        .filter(|&cp| decompose(cp) != [cp])
        .collect()
});

fn decompose(code_point: u32) -> Vec<u32> {
    match char::from_u32(code_point) {
        Some(c) => {
            let mut parts = Vec::with_capacity(2);
            decompose_canonical(c, |part| parts.push(part as u32));
            parts
        }
        None => vec![code_point],
    }
}

impl Normalizer {
    #[inline]
    pub fn normalize_code_point(self, code_point: u32) -> u32 {
        match self {
            Normalizer::None => code_point,
            Normalizer::AsciiLowercase => match code_point {
                0x41..=0x5A => code_point + 0x20,
                _ => code_point,
            },
            Normalizer::UnicodeLowercase => match char::from_u32(code_point) {
                Some(c) => {
                    let mut lower = c.to_lowercase();
                    match (lower.next(), lower.next()) {
                        (Some(l), None) => l as u32,
                        _ => code_point,
                    }
                }
                None => code_point,
            },
        }
    }

    fn changes(self) -> &'static [(u32, u32)] {
        match self {
            Normalizer::None => &[],
            Normalizer::AsciiLowercase => &ASCII_LOWERCASE_CHANGES,
            Normalizer::UnicodeLowercase => &UNICODE_LOWERCASE_CHANGES,
        }
    }

    /// The image of a code point set under this mapping, sorted and merged.
    pub fn image(self, ranges: &[CharRange]) -> Vec<CharRange> {
        let changes = self.changes();
        if changes.is_empty() {
            return union_ranges(ranges.to_vec());
        }
        let mut result = Vec::with_capacity(ranges.len());
        for range in union_ranges(ranges.to_vec()) {
            let first = changes.partition_point(|(src, _)| *src < range.from);
            let last = changes.partition_point(|(src, _)| *src <= range.to);
            let mut next = range.from;
            for &(source, target) in &changes[first..last] {
                if source > next {
                    result.push(CharRange::new(next, source - 1));
                }
                result.push(CharRange::single(target));
                next = source + 1;
            }
            if next <= range.to {
                result.push(CharRange::new(next, range.to));
            }
        }
        union_ranges(result)
    }
}

/// The full normalization applied to one pattern: optional canonical
/// decomposition followed by case mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Normalization {
    pub normalizer: Normalizer,
    pub canonical_eq: bool,
}

impl Normalization {
    pub fn new(normalizer: Normalizer, canonical_eq: bool) -> Self {
        Self {
            normalizer,
            canonical_eq,
        }
    }

    fn code_points(&self, code_point: u32) -> Vec<u32> {
        let parts = if self.canonical_eq {
            decompose(code_point)
        } else {
            vec![code_point]
        };
        parts
            .into_iter()
            .map(|cp| self.normalizer.normalize_code_point(cp))
            .collect()
    }

    /// A literal code point as it must appear in the tree.
    pub fn literal(&self, code_point: u32) -> Node {
        match self.code_points(code_point).as_slice() {
            [single] => Node::Lit(*single),
            parts => Node::Juxt(parts.iter().map(|cp| Node::Lit(*cp)).collect()),
        }
    }

    /// Flattens runs of literals in a sequence and puts their combining marks
    /// in canonical order, the order NFD gives the input.
    pub fn reorder_marks(&self, values: Vec<Node>) -> Vec<Node> {
        if !self.canonical_eq {
            return values;
        }
        let mut result = Vec::with_capacity(values.len());
        let mut run = Vec::new();
        for value in values {
            if is_literal_run(&value) {
                push_literals(&value, &mut run);
                continue;
            }
            flush_run(&mut run, &mut result);
            result.push(value);
        }
        flush_run(&mut run, &mut result);
        result
    }

    /// A character class as it must appear in the tree.
    ///
    /// A negated class is complemented *after* case mapping, so `[^a]` does not
    /// match `A` when matching case-insensitively.
    pub fn set(&self, ranges: Vec<CharRange>, negated: bool) -> Node {
        let mut ranges = self.normalizer.image(&ranges);
        if negated {
            ranges = complement_ranges(&ranges);
        }
        if !self.canonical_eq {
            return Node::char_set(ranges);
        }

        // decomposable members become the sequence they decompose to
        let decomposable = &*DECOMPOSABLE;
        let mut sequences = Vec::new();
        let mut kept = Vec::with_capacity(ranges.len());
        for range in ranges {
            let first = decomposable.partition_point(|&cp| cp < range.from);
            let last = decomposable.partition_point(|&cp| cp <= range.to);
            let mut next = range.from;
            for &cp in &decomposable[first..last] {
                if cp > next {
                    kept.push(CharRange::new(next, cp - 1));
                }
                sequences.push(self.literal(cp));
                next = cp + 1;
            }
            if next <= range.to {
                kept.push(CharRange::new(next, range.to));
            }
        }
        if sequences.is_empty() {
            return Node::char_set(kept);
        }
        let mut alternatives = Vec::with_capacity(sequences.len() + 1);
        if !kept.is_empty() {
            alternatives.push(Node::char_set(kept));
        }
        alternatives.extend(sequences);
        Node::disj(alternatives)
    }

    /// Normalizes a whole tree built without regard to this normalization.
    pub fn apply(&self, node: &Node) -> Node {
        if self.normalizer == Normalizer::None && !self.canonical_eq {
            return node.clone();
        }
        match node {
            Node::Lit(cp) => self.literal(*cp),
            Node::Range(r) => self.set(vec![*r], false),
            // inputs are normalized too, so case mapping cannot narrow a wildcard
            Node::Wildcard if !self.canonical_eq => Node::Wildcard,
            Node::Wildcard => self.set(vec![CharRange::new(0, MAX_CODE_POINT)], false),
            Node::CharSet(ranges) => self.set(ranges.clone(), false),
            Node::Juxt(values) => {
                Node::Juxt(self.reorder_marks(values.iter().map(|v| self.apply(v)).collect()))
            }
            Node::Disj(values) => Node::Disj(values.iter().map(|v| self.apply(v)).collect()),
            Node::Rep { min, max, value } => Node::rep(*min, *max, self.apply(value)),
            Node::Lookaround { dir, cond, value } => Node::lookaround(*dir, *cond, self.apply(value)),
            Node::CaptureGroup(value) => Node::CaptureGroup(Box::new(self.apply(value))),
            Node::NamedCaptureGroup { name, value } => Node::NamedCaptureGroup {
                name: name.clone(),
                value: Box::new(self.apply(value)),
            },
            Node::Intersection(l, r) => Node::intersection(self.apply(l), self.apply(r)),
            Node::Union(l, r) => Node::union(self.apply(l), self.apply(r)),
            Node::Difference(l, r) => Node::difference(self.apply(l), self.apply(r)),
        }
    }
}

/// A literal or a sequence made only of literals.
fn is_literal_run(node: &Node) -> bool {
    match node {
        Node::Lit(_) => true,
        Node::Juxt(values) => values.iter().all(is_literal_run),
        _ => false,
    }
}

fn push_literals(node: &Node, out: &mut Vec<u32>) {
    match node {
        Node::Lit(cp) => out.push(*cp),
        Node::Juxt(values) => values.iter().for_each(|v| push_literals(v, out)),
        _ => unreachable!("not a literal run: {:?}", node),
    }
}

fn flush_run(run: &mut Vec<u32>, out: &mut Vec<Node>) {
    sort_marks(run);
    out.extend(run.drain(..).map(Node::Lit));
}

fn combining_class(code_point: u32) -> u8 {
    char::from_u32(code_point).map_or(0, canonical_combining_class)
}

/// Stable sort of every run of non-starters by combining class.
fn sort_marks(code_points: &mut [u32]) {
    let mut start = 0;
    while start < code_points.len() {
        if combining_class(code_points[start]) == 0 {
            start += 1;
            continue;
        }
        let end = code_points[start..]
            .iter()
            .position(|&cp| combining_class(cp) == 0)
            .map_or(code_points.len(), |n| start + n);
        code_points[start..end].sort_by_key(|&cp| combining_class(cp));
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(from: char, to: char) -> CharRange {
        CharRange::chars(from, to)
    }

    #[test]
    fn test_normalize_code_point() {
        assert_eq!(Normalizer::None.normalize_code_point('A' as u32), 'A' as u32);
        assert_eq!(Normalizer::AsciiLowercase.normalize_code_point('A' as u32), 'a' as u32);
        assert_eq!(Normalizer::AsciiLowercase.normalize_code_point('Ä' as u32), 'Ä' as u32);
        assert_eq!(Normalizer::UnicodeLowercase.normalize_code_point('Ä' as u32), 'ä' as u32);
        // multi code point lowercase forms are left alone
        assert_eq!(Normalizer::UnicodeLowercase.normalize_code_point(0x130), 0x130);
        assert_eq!(Normalizer::UnicodeLowercase.normalize_code_point(0xD800), 0xD800);
    }

    #[test]
    fn test_image_of_uppercase_range() {
        let image = Normalizer::AsciiLowercase.image(&[r('A', 'Z')]);
        assert_eq!(image, vec![r('a', 'z')]);

        let image = Normalizer::AsciiLowercase.image(&[r('0', 'C')]);
        // '0'..'@' stays, 'A'..'C' moves to 'a'..'c'
        assert_eq!(image, vec![r('0', '@'), r('a', 'c')]);
    }

    #[test]
    fn test_negated_set_complements_after_mapping() {
        let norm = Normalization::new(Normalizer::AsciiLowercase, false);
        let node = norm.set(vec![r('a', 'a')], true);
        let Node::CharSet(ranges) = node else {
            panic!("expected a set, got {:?}", node);
        };
        assert!(!ranges.iter().any(|range| range.contains('a' as u32)));
        assert!(ranges.iter().any(|range| range.contains('b' as u32)));
    }

    #[test]
    fn test_canonical_literal_decomposes() {
        let norm = Normalization::new(Normalizer::None, true);
        assert_eq!(
            norm.literal('ö' as u32),
            Node::Juxt(vec![Node::lit('o'), Node::Lit(0x308)])
        );
        assert_eq!(norm.literal('o' as u32), Node::lit('o'));
    }

    #[test]
    fn test_marks_sorted_by_combining_class() {
        let norm = Normalization::new(Normalizer::None, true);
        // U+0301 has class 230, U+0323 class 220
        let values = vec![norm.literal('a' as u32), Node::Lit(0x301), Node::Lit(0x323)];
        assert_eq!(
            norm.reorder_marks(values),
            vec![Node::lit('a'), Node::Lit(0x323), Node::Lit(0x301)]
        );
        // the decomposition of U+1E0B ends in U+0307 (230)
        let values = vec![norm.literal(0x1E0B), Node::Lit(0x323), Node::star(Node::lit('x'))];
        assert_eq!(
            norm.reorder_marks(values),
            vec![
                Node::lit('d'),
                Node::Lit(0x323),
                Node::Lit(0x307),
                Node::star(Node::lit('x'))
            ]
        );
        // a starter in between stops the run
        let values = vec![Node::Lit(0x301), Node::lit('b'), Node::Lit(0x323)];
        assert_eq!(norm.reorder_marks(values.clone()), values);
        let plain = Normalization::default();
        let values = vec![Node::lit('a'), Node::Lit(0x301), Node::Lit(0x323)];
        assert_eq!(plain.reorder_marks(values.clone()), values);
    }

    #[test]
    fn test_canonical_set_splits_decomposable_members() {
        let norm = Normalization::new(Normalizer::None, true);
        let node = norm.set(vec![r('ö', 'ö'), r('x', 'x')], false);
        assert_eq!(
            node,
            Node::Disj(vec![
                Node::lit('x'),
                Node::Juxt(vec![Node::lit('o'), Node::Lit(0x308)])
            ])
        );
    }

    #[test]
    fn test_apply_is_identity_without_normalization() {
        let tree = Node::Juxt(vec![Node::lit('A'), Node::Wildcard]);
        assert_eq!(Normalization::default().apply(&tree), tree);
        let lowered = Normalization::new(Normalizer::AsciiLowercase, false).apply(&tree);
        assert_eq!(lowered, Node::Juxt(vec![Node::lit('a'), Node::Wildcard]));
    }
}
