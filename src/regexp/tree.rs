//! The regex syntax tree.
//!
//! Trees are what the compiler consumes. They come out of the parser, but can
//! also be built by hand, which is how the generated tests drive the engine.
//! Code points are `u32` so that lone surrogates stay representable.

use std::fmt;

use crate::automaton::{CharInterval, MAX_CODE_POINT, MIN_CODE_POINT};

/// A closed range of code points inside a pattern.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CharRange {
    pub from: u32,
    pub to: u32,
}

impl CharRange {
    /// Panics if `from > to`.
    pub fn new(from: u32, to: u32) -> Self {
        assert!(from <= to, "range start {:#x} is greater than its end {:#x}", from, to);
        Self { from, to }
    }

    pub fn single(code_point: u32) -> Self {
        Self {
            from: code_point,
            to: code_point,
        }
    }

    pub fn chars(from: char, to: char) -> Self {
        Self::new(from as u32, to as u32)
    }

    pub fn span(&self) -> CharInterval {
        CharInterval::new(self.from, self.to)
    }

    pub fn contains(&self, code_point: u32) -> bool {
        self.from <= code_point && code_point <= self.to
    }
}

/// Sort and merge overlapping or adjacent ranges.
pub fn union_ranges(mut ranges: Vec<CharRange>) -> Vec<CharRange> {
    ranges.sort_unstable();
    let mut merged: Vec<CharRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.from <= last.to.saturating_add(1) => {
                last.to = last.to.max(range.to);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Every code point not covered by `ranges`.
pub fn complement_ranges(ranges: &[CharRange]) -> Vec<CharRange> {
    let mut result = Vec::new();
    let mut next = MIN_CODE_POINT;
    for range in union_ranges(ranges.to_vec()) {
        if range.from > next {
            result.push(CharRange::new(next, range.from - 1));
        }
        if range.to >= MAX_CODE_POINT {
            return result;
        }
        next = range.to + 1;
    }
    result.push(CharRange::new(next, MAX_CODE_POINT));
    result
}

/// Code points covered by `left` but not by `right`.
pub fn difference_ranges(left: &[CharRange], right: &[CharRange]) -> Vec<CharRange> {
    let excluded = complement_ranges(right);
    let mut result = Vec::new();
    for a in union_ranges(left.to_vec()) {
        for b in &excluded {
            let from = a.from.max(b.from);
            let to = a.to.min(b.to);
            if from <= to {
                result.push(CharRange::new(from, to));
            }
        }
    }
    result
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Ahead,
    Behind,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Condition {
    Positive,
    Negative,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Node {
    /// One code point.
    Lit(u32),
    Range(CharRange),
    /// Any code point.
    Wildcard,
    /// Any code point in one of the ranges. An empty set matches nothing.
    CharSet(Vec<CharRange>),
    /// Concatenation. Empty matches the empty string.
    Juxt(Vec<Node>),
    /// Alternation. Empty matches nothing.
    Disj(Vec<Node>),
    /// `max: None` means unbounded.
    Rep {
        min: u32,
        max: Option<u32>,
        value: Box<Node>,
    },
    Lookaround {
        dir: Direction,
        cond: Condition,
        value: Box<Node>,
    },
    CaptureGroup(Box<Node>),
    NamedCaptureGroup {
        name: String,
        value: Box<Node>,
    },
    Intersection(Box<Node>, Box<Node>),
    Union(Box<Node>, Box<Node>),
    Difference(Box<Node>, Box<Node>),
}

impl Node {
    pub fn lit(c: char) -> Node {
        Node::Lit(c as u32)
    }

    pub fn range(from: char, to: char) -> Node {
        Node::Range(CharRange::chars(from, to))
    }

    /// The simplest node matching one code point from `ranges`.
    pub fn char_set(ranges: Vec<CharRange>) -> Node {
        let ranges = union_ranges(ranges);
        match ranges.as_slice() {
            [r] if r.from == r.to => Node::Lit(r.from),
            [r] if r.from == MIN_CODE_POINT && r.to == MAX_CODE_POINT => Node::Wildcard,
            [r] => Node::Range(*r),
            _ => Node::CharSet(ranges),
        }
    }

    pub fn literal_str(s: &str) -> Node {
        Node::juxt(s.chars().map(Node::lit).collect())
    }

    /// Concatenation, collapsing a single element to itself.
    pub fn juxt(mut values: Vec<Node>) -> Node {
        if values.len() == 1 {
            values.swap_remove(0)
        } else {
            Node::Juxt(values)
        }
    }

    /// Alternation, collapsing a single element to itself.
    pub fn disj(mut values: Vec<Node>) -> Node {
        if values.len() == 1 {
            values.swap_remove(0)
        } else {
            Node::Disj(values)
        }
    }

    pub fn rep(min: u32, max: Option<u32>, value: Node) -> Node {
        Node::Rep {
            min,
            max,
            value: Box::new(value),
        }
    }

    pub fn star(value: Node) -> Node {
        Node::rep(0, None, value)
    }

    pub fn lookaround(dir: Direction, cond: Condition, value: Node) -> Node {
        Node::Lookaround {
            dir,
            cond,
            value: Box::new(value),
        }
    }

    pub fn intersection(left: Node, right: Node) -> Node {
        Node::Intersection(Box::new(left), Box::new(right))
    }

    pub fn union(left: Node, right: Node) -> Node {
        Node::Union(Box::new(left), Box::new(right))
    }

    pub fn difference(left: Node, right: Node) -> Node {
        Node::Difference(Box::new(left), Box::new(right))
    }

    pub fn is_lookaround(&self) -> bool {
        matches!(self, Node::Lookaround { .. })
    }

    /// The interval covered by a single-range node (literal, range, wildcard).
    pub fn range_span(&self) -> Option<CharInterval> {
        match self {
            Node::Lit(c) => Some(CharInterval::single(*c)),
            Node::Range(r) => Some(r.span()),
            Node::Wildcard => Some(CharInterval::ALL),
            _ => None,
        }
    }

    /// Nesting depth; leaves have depth 1.
    pub fn depth(&self) -> usize {
        let children = match self {
            Node::Lit(_) | Node::Range(_) | Node::Wildcard | Node::CharSet(_) => return 1,
            Node::Juxt(values) | Node::Disj(values) => {
                return 1 + values.iter().map(Node::depth).max().unwrap_or(0)
            }
            Node::Rep { value, .. }
            | Node::Lookaround { value, .. }
            | Node::CaptureGroup(value)
            | Node::NamedCaptureGroup { value, .. } => value.depth(),
            Node::Intersection(l, r) | Node::Union(l, r) | Node::Difference(l, r) => {
                l.depth().max(r.depth())
            }
        };
        1 + children
    }
}

fn write_code_point(f: &mut fmt::Formatter<'_>, cp: u32, in_class: bool) -> fmt::Result {
    match char::from_u32(cp) {
        Some(c) if c.is_ascii_alphanumeric() || c == ' ' || (!c.is_ascii() && !c.is_control()) => {
            write!(f, "{}", c)
        }
        Some(c) if c.is_ascii_punctuation() && (in_class || c != '-') => write!(f, "\\{}", c),
        Some('-') => write!(f, "-"),
        // lone surrogates go to `\x{..}`: `\uD83D\uDE00` reads back as one code point
        Some(_) if cp <= 0xFFFF => write!(f, "\\u{:04X}", cp),
        _ => write!(f, "\\x{{{:X}}}", cp),
    }
}

fn write_ranges(f: &mut fmt::Formatter<'_>, ranges: &[CharRange]) -> fmt::Result {
    write!(f, "[")?;
    for r in ranges {
        write_code_point(f, r.from, true)?;
        if r.to != r.from {
            write!(f, "-")?;
            write_code_point(f, r.to, true)?;
        }
    }
    write!(f, "]")
}

/// Renders the tree in the pattern syntax. Set operations, which have no
/// textual form, are written as `(?&&…)`, `(?||…)` and `(?--…)`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Lit(c) => write_code_point(f, *c, false),
            Node::Range(r) => write_ranges(f, std::slice::from_ref(r)),
            Node::Wildcard => write!(f, "."),
            Node::CharSet(ranges) if ranges.is_empty() => write!(f, "[^\\x00-\\x{{10FFFF}}]"),
            Node::CharSet(ranges) => write_ranges(f, ranges),
            Node::Juxt(values) => {
                for v in values {
                    write!(f, "{}", v)?;
                }
                Ok(())
            }
            Node::Disj(values) => {
                write!(f, "(?:")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
            Node::Rep { min, max, value } => {
                write!(f, "(?:{})", value)?;
                match (min, max) {
                    (0, None) => write!(f, "*"),
                    (1, None) => write!(f, "+"),
                    (0, Some(1)) => write!(f, "?"),
                    (min, None) => write!(f, "{{{},}}", min),
                    (min, Some(max)) if min == max => write!(f, "{{{}}}", min),
                    (min, Some(max)) => write!(f, "{{{},{}}}", min, max),
                }
            }
            Node::Lookaround { dir, cond, value } => {
                let prefix = match (dir, cond) {
                    (Direction::Ahead, Condition::Positive) => "?=",
                    (Direction::Ahead, Condition::Negative) => "?!",
                    (Direction::Behind, Condition::Positive) => "?<=",
                    (Direction::Behind, Condition::Negative) => "?<!",
                };
                write!(f, "({}{})", prefix, value)
            }
            Node::CaptureGroup(value) => write!(f, "({})", value),
            Node::NamedCaptureGroup { name, value } => write!(f, "(?<{}>{})", name, value),
            Node::Intersection(l, r) => write!(f, "(?&&{}|{})", l, r),
            Node::Union(l, r) => write!(f, "(?||{}|{})", l, r),
            Node::Difference(l, r) => write!(f, "(?--{}|{})", l, r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_ranges_merges_adjacent() {
        let merged = union_ranges(vec![
            CharRange::chars('d', 'f'),
            CharRange::chars('a', 'c'),
            CharRange::chars('x', 'z'),
            CharRange::chars('y', 'y'),
        ]);
        assert_eq!(merged, vec![CharRange::chars('a', 'f'), CharRange::chars('x', 'z')]);
    }

    #[test]
    fn test_complement_ranges() {
        let digits = [CharRange::chars('0', '9')];
        assert_eq!(
            complement_ranges(&digits),
            vec![
                CharRange::new(0, '0' as u32 - 1),
                CharRange::new('9' as u32 + 1, MAX_CODE_POINT)
            ]
        );
        assert_eq!(
            complement_ranges(&[]),
            vec![CharRange::new(MIN_CODE_POINT, MAX_CODE_POINT)]
        );
        assert!(complement_ranges(&[CharRange::new(0, MAX_CODE_POINT)]).is_empty());
        assert_eq!(
            complement_ranges(&[CharRange::new(0, 10), CharRange::new(20, MAX_CODE_POINT)]),
            vec![CharRange::new(11, 19)]
        );
    }

    #[test]
    fn test_difference_ranges() {
        let letters = [CharRange::chars('a', 'z')];
        let vowels = [
            CharRange::single('a' as u32),
            CharRange::single('e' as u32),
            CharRange::single('i' as u32),
            CharRange::single('o' as u32),
            CharRange::single('u' as u32),
        ];
        let consonants = difference_ranges(&letters, &vowels);
        assert_eq!(consonants.len(), 5);
        assert_eq!(consonants[0], CharRange::chars('b', 'd'));
        assert_eq!(consonants[4], CharRange::chars('v', 'z'));
    }

    #[test]
    fn test_char_set_simplifies() {
        assert_eq!(Node::char_set(vec![CharRange::single(97)]), Node::Lit(97));
        assert_eq!(
            Node::char_set(vec![CharRange::new(0, 50), CharRange::new(51, MAX_CODE_POINT)]),
            Node::Wildcard
        );
        assert_eq!(Node::char_set(vec![]), Node::CharSet(vec![]));
    }

    #[test]
    fn test_range_span() {
        assert_eq!(Node::lit('a').range_span(), Some(CharInterval::single(97)));
        assert_eq!(Node::Wildcard.range_span(), Some(CharInterval::ALL));
        assert_eq!(Node::Juxt(vec![]).range_span(), None);
    }

    #[test]
    fn test_depth() {
        assert_eq!(Node::lit('a').depth(), 1);
        assert_eq!(Node::star(Node::lit('a')).depth(), 2);
        let nested = Node::Juxt(vec![Node::lit('a'), Node::disj(vec![Node::lit('b'), Node::star(Node::lit('c'))])]);
        assert_eq!(nested.depth(), 4);
    }

    #[test]
    fn test_display() {
        let node = Node::Juxt(vec![
            Node::lit('a'),
            Node::rep(2, Some(3), Node::range('b', 'd')),
            Node::lookaround(Direction::Ahead, Condition::Negative, Node::lit('.')),
        ]);
        assert_eq!(node.to_string(), "a(?:[b-d]){2,3}(?!\\.)");
    }

    #[test]
    fn test_display_surrogates() {
        let pair = Node::Juxt(vec![Node::Lit(0xD83D), Node::Lit(0xDE00)]);
        assert_eq!(pair.to_string(), "\\x{D83D}\\x{DE00}");
        assert_eq!(Node::lit('\u{7}').to_string(), "\\u0007");
        let low = Node::CharSet(vec![CharRange::new(0xDC00, 0xDFFF)]);
        assert_eq!(low.to_string(), "[\\x{DC00}-\\x{DFFF}]");
    }
}
