//! Character intervals and the alphabet partitioner.
//!
//! Automaton transitions are labelled with closed code point intervals instead
//! of single characters, otherwise a wildcard alone would expand to more than a
//! million transitions. For set operations between automata to be well defined,
//! all the intervals used by a group of patterns must be *disjoint or equal*:
//! two operands then never disagree about where a symbol starts and ends.
//!
//! `partition` computes that common refinement:
//!
//! ```text
//!   [abc]      -> a-c
//!   [^efg]     -> 0-d | h-MAX
//!   mno[^efg]  -> m, n, o, 0-d | h-l | m | n | o | p-MAX
//!   .          -> 0-MAX
//! ```

use std::collections::BTreeSet;
use std::fmt;

use rustc_hash::FxHashMap;

/// Smallest code point.
pub const MIN_CODE_POINT: u32 = 0;

/// Largest code point.
pub const MAX_CODE_POINT: u32 = 0x10FFFF;

/// A closed range `[from, to]` of code points, the atomic alphabet symbol.
///
/// Intervals are ordered by `from` first; within one DFA state the outgoing
/// intervals never overlap, so that order alone is total there.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CharInterval {
    from: u32,
    to: u32,
}

impl CharInterval {
    /// The interval covering every code point.
    pub const ALL: CharInterval = CharInterval {
        from: MIN_CODE_POINT,
        to: MAX_CODE_POINT,
    };

    /// Panics if `from > to`.
    pub fn new(from: u32, to: u32) -> Self {
        assert!(
            from <= to,
            "interval start {:#x} is greater than its end {:#x}",
            from,
            to
        );
        Self { from, to }
    }

    pub fn single(code_point: u32) -> Self {
        Self {
            from: code_point,
            to: code_point,
        }
    }

    #[inline]
    pub fn from(&self) -> u32 {
        self.from
    }

    #[inline]
    pub fn to(&self) -> u32 {
        self.to
    }

    #[inline]
    pub fn contains(&self, code_point: u32) -> bool {
        self.from <= code_point && code_point <= self.to
    }

    /// Upper bound key for an ordered lookup: every interval whose `from` is at
    /// most `code_point` sorts before (or equal to) it.
    #[inline]
    pub(crate) fn floor_key(code_point: u32) -> Self {
        Self {
            from: code_point,
            to: u32::MAX,
        }
    }
}

impl fmt::Debug for CharInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{:#x}", self.from)
        } else {
            write!(f, "[{:#x}-{:#x}]", self.from, self.to)
        }
    }
}

impl fmt::Display for CharInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Split every input span into maximal sub-intervals that are disjoint from or
/// equal to the sub-intervals of every other span.
///
/// For each distinct span the returned list is sorted ascending, its members
/// are disjoint, and their union is exactly the span.
pub fn partition<I>(spans: I) -> FxHashMap<CharInterval, Vec<CharInterval>>
where
    I: IntoIterator<Item = CharInterval>,
{
    let spans: BTreeSet<CharInterval> = spans.into_iter().collect();

    // Every span boundary is a breakpoint: a span starting at `from` forces an
    // interval to end at `from - 1`, and one ending at `to` forces another to
    // start at `to + 1`.
    let mut starts = BTreeSet::new();
    let mut ends = BTreeSet::new();
    for span in &spans {
        starts.insert(span.from);
        if span.from > MIN_CODE_POINT {
            ends.insert(span.from - 1);
        }
        ends.insert(span.to);
        if span.to < MAX_CODE_POINT {
            starts.insert(span.to + 1);
        }
    }

    let mut result = FxHashMap::with_capacity_and_hasher(spans.len(), Default::default());
    for span in spans {
        let inner_starts = starts.range(span.from..=span.to);
        let inner_ends = ends.range(span.from..=span.to);
        let pieces: Vec<CharInterval> = inner_starts
            .zip(inner_ends)
            .map(|(&from, &to)| CharInterval::new(from, to))
            .collect();
        debug_assert_eq!(pieces.first().map(|p| p.from), Some(span.from));
        debug_assert_eq!(pieces.last().map(|p| p.to), Some(span.to));
        result.insert(span, pieces);
    }
    result
}
