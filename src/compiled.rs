//! Compiled regexes: matching and set operations over a shared universe.

use std::fmt;
use std::io::{self, BufReader, Read};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, trace};
use unicode_normalization::UnicodeNormalization;

use crate::automaton::{self, utf16_code_points, Combine, Dfa, MatchResult, Utf8Chars};
use crate::regexp::{compile_dfa, Node, ParsedRegex};
use crate::universe::Universe;
use crate::{Error, Result};

/// A regex compiled to a DFA.
///
/// Matching is whole-input: `matches("ab")` is true only if the entire string
/// is in the language. Inputs go through the universe's normalization first,
/// so a case-insensitive regex sees lowercased input.
///
/// Binary operations require both operands to come from the same
/// [`Universe`] and fail with [`Error::IncompatibleUniverse`] otherwise.
#[derive(Clone)]
pub struct CompiledRegex {
    source: Option<String>,
    dfa: Dfa,
    universe: Arc<Universe>,
}

impl CompiledRegex {
    /// Compile `tree` against `universe`. Every range in the tree must have
    /// been collected when the universe was built.
    pub fn compile(tree: &Node, universe: &Arc<Universe>) -> Result<CompiledRegex> {
        Self::build(None, tree, universe)
    }

    pub(crate) fn compile_parsed(parsed: ParsedRegex, universe: &Arc<Universe>) -> Result<CompiledRegex> {
        Self::build(Some(parsed.source), &parsed.tree, universe)
    }

    fn build(source: Option<String>, tree: &Node, universe: &Arc<Universe>) -> Result<CompiledRegex> {
        let start = Instant::now();
        let dfa = compile_dfa(tree, universe)?;
        trace!("compiled {:?} in {:?}", source.as_deref().unwrap_or("<tree>"), start.elapsed());
        debug!("compiled DFA has {} states", dfa.state_count());
        Ok(CompiledRegex {
            source,
            dfa,
            universe: Arc::clone(universe),
        })
    }

    /// A regex that matches no string at all.
    pub fn nothing(universe: &Arc<Universe>) -> CompiledRegex {
        Self::synthetic(Dfa::nothing(), universe)
    }

    fn synthetic(dfa: Dfa, universe: &Arc<Universe>) -> CompiledRegex {
        CompiledRegex {
            source: None,
            dfa,
            universe: Arc::clone(universe),
        }
    }

    /// The pattern text, for regexes compiled from one.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn universe(&self) -> &Arc<Universe> {
        &self.universe
    }

    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    pub fn state_count(&self) -> usize {
        self.dfa.state_count()
    }

    pub fn is_compatible(&self, other: &CompiledRegex) -> bool {
        Arc::ptr_eq(&self.universe, &other.universe)
    }

    fn check_compatible(&self, other: &CompiledRegex) -> Result<()> {
        if self.is_compatible(other) {
            Ok(())
        } else {
            Err(Error::IncompatibleUniverse)
        }
    }

    // ---- matching ----

    pub fn matches(&self, input: &str) -> bool {
        self.match_and_report(input).matched
    }

    /// Match and report how many (normalized) code points were consumed.
    pub fn match_and_report(&self, input: &str) -> MatchResult {
        self.match_chars(input.chars())
    }

    /// Match a stream of characters without collecting it.
    pub fn match_chars<I>(&self, input: I) -> MatchResult
    where
        I: IntoIterator<Item = char>,
    {
        let normalizer = self.universe.normalizer();
        let chars = input.into_iter();
        if self.universe.canonical_eq() {
            self.dfa
                .match_code_points(chars.nfd().map(|c| normalizer.normalize_code_point(c as u32)))
        } else {
            self.dfa
                .match_code_points(chars.map(|c| normalizer.normalize_code_point(c as u32)))
        }
    }

    /// Match UTF-16 code units, decoding surrogate pairs on the fly.
    ///
    /// An unpaired surrogate matches as its own code point, except under
    /// canonical equivalence where it becomes U+FFFD before decomposition.
    pub fn match_utf16<I>(&self, units: I) -> MatchResult
    where
        I: IntoIterator<Item = u16>,
    {
        if self.universe.canonical_eq() {
            let chars = char::decode_utf16(units)
                .map(|decoded| decoded.unwrap_or(char::REPLACEMENT_CHARACTER));
            return self.match_chars(chars);
        }
        let normalizer = self.universe.normalizer();
        self.dfa
            .match_code_points(utf16_code_points(units).map(|cp| normalizer.normalize_code_point(cp)))
    }

    /// Match UTF-8 read from `reader`. Invalid UTF-8 is an
    /// `io::ErrorKind::InvalidData` error.
    pub fn match_reader<R: Read>(&self, reader: R) -> io::Result<MatchResult> {
        let chars = Utf8Chars::new(BufReader::new(reader));
        if self.universe.canonical_eq() {
            // decomposition needs plain chars; park the first error and stop
            let mut failure = None;
            let result = self.match_chars(chars.map_while(|c| c.map_err(|e| failure = Some(e)).ok()));
            return match failure {
                Some(e) => Err(e),
                None => Ok(result),
            };
        }
        let normalizer = self.universe.normalizer();
        self.dfa
            .try_match_code_points(chars.map(|c| c.map(|c| normalizer.normalize_code_point(c as u32))))
    }

    // ---- set operations ----

    pub fn union(&self, other: &CompiledRegex) -> Result<CompiledRegex> {
        self.combine(other, Combine::Union)
    }

    pub fn intersect(&self, other: &CompiledRegex) -> Result<CompiledRegex> {
        self.combine(other, Combine::Intersection)
    }

    /// Strings matched by `self` but not by `other`.
    pub fn diff(&self, other: &CompiledRegex) -> Result<CompiledRegex> {
        self.combine(other, Combine::Difference)
    }

    fn combine(&self, other: &CompiledRegex, op: Combine) -> Result<CompiledRegex> {
        self.check_compatible(other)?;
        let start = Instant::now();
        let dfa = automaton::combine(&self.dfa, &other.dfa, op);
        trace!("{:?} of {} and {} in {:?}", op, self, other, start.elapsed());
        debug!("{:?} has {} states", op, dfa.state_count());
        Ok(Self::synthetic(dfa, &self.universe))
    }

    pub fn do_intersect(&self, other: &CompiledRegex) -> Result<bool> {
        self.check_compatible(other)?;
        Ok(automaton::do_intersect(&self.dfa, &other.dfa))
    }

    pub fn is_subset_of(&self, other: &CompiledRegex) -> Result<bool> {
        self.check_compatible(other)?;
        Ok(automaton::is_subset_of(&self.dfa, &other.dfa))
    }

    pub fn is_proper_subset_of(&self, other: &CompiledRegex) -> Result<bool> {
        self.check_compatible(other)?;
        Ok(automaton::is_proper_subset_of(&self.dfa, &other.dfa))
    }

    /// Both regexes match exactly the same strings.
    pub fn equiv(&self, other: &CompiledRegex) -> Result<bool> {
        self.check_compatible(other)?;
        Ok(automaton::equivalent(&self.dfa, &other.dfa))
    }

    pub fn matches_at_least_one(&self) -> bool {
        automaton::matches_at_least_one(&self.dfa)
    }

    /// The same language with the fewest states.
    pub fn minimize(&self) -> CompiledRegex {
        CompiledRegex {
            source: self.source.clone(),
            dfa: automaton::minimize(&self.dfa),
            universe: Arc::clone(&self.universe),
        }
    }
}

impl fmt::Display for CompiledRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "⟪{}⟫", source)?,
            None => write!(f, "[synthetic]")?,
        }
        write!(f, " (DFA states: {})", self.dfa.state_count())
    }
}

impl fmt::Debug for CompiledRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRegex")
            .field("source", &self.source)
            .field("states", &self.dfa.state_count())
            .field("minimal", &self.dfa.is_minimal())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compile, compile_all, compile_with, Flags};

    fn group(patterns: &[&str]) -> Vec<CompiledRegex> {
        compile_all(patterns, Flags::default()).unwrap()
    }

    #[test]
    fn test_match_and_report() {
        let re = compile("a*").unwrap();
        assert!(re.matches(""));
        assert!(re.matches("aaaa"));
        assert_eq!(
            re.match_and_report("aab"),
            MatchResult {
                matched: false,
                consumed: 2
            }
        );
    }

    #[test]
    fn test_negated_class() {
        let re = compile("[^a]").unwrap();
        assert!(!re.matches("a"));
        assert!(!re.matches(""));
        assert!(re.matches("b"));
        assert!(re.matches("\u{10FFFF}"));
        assert!(!re.matches("bc"));
    }

    #[test]
    fn test_union_and_diff() {
        let g = group(&["a|b", "b|c"]);
        let either = g[0].union(&g[1]).unwrap();
        for s in ["a", "b", "c"] {
            assert!(either.matches(s), "{}", s);
        }
        let only_left = g[0].diff(&g[1]).unwrap();
        assert!(only_left.matches("a"));
        assert!(!only_left.matches("b"));
        assert_eq!(only_left.source(), None);
        assert!(only_left.to_string().starts_with("[synthetic] (DFA states: "));
    }

    #[test]
    fn test_predicates_agree_with_operations() {
        let g = group(&["[a-c]+", "a+", "x?", "(a|b|c)*[a-c]"]);
        for left in &g {
            for right in &g {
                let meet = left.intersect(right).unwrap();
                assert_eq!(left.do_intersect(right).unwrap(), meet.matches_at_least_one());
                let rest = left.diff(right).unwrap();
                assert_eq!(left.is_subset_of(right).unwrap(), !rest.matches_at_least_one());
                assert_eq!(
                    left.equiv(right).unwrap(),
                    left.is_subset_of(right).unwrap() && right.is_subset_of(left).unwrap()
                );
            }
        }
        assert!(g[0].equiv(&g[3]).unwrap());
        assert!(g[1].is_proper_subset_of(&g[0]).unwrap());
        assert!(!g[0].is_proper_subset_of(&g[3]).unwrap());
    }

    #[test]
    fn test_minimize() {
        let re = compile("(a|b)*abb|(a|b)*abb").unwrap();
        let min = re.minimize();
        assert!(min.state_count() <= re.state_count());
        assert_eq!(min.minimize().state_count(), min.state_count());
        assert!(min.matches("babb"));
        assert!(!min.matches("bab"));
        assert_eq!(min.source(), re.source());
    }

    #[test]
    fn test_nothing() {
        let g = group(&["abc"]);
        let none = CompiledRegex::nothing(g[0].universe());
        assert!(!none.matches(""));
        assert!(!none.matches_at_least_one());
        assert!(none.is_subset_of(&g[0]).unwrap());
        assert!(g[0].union(&none).unwrap().equiv(&g[0]).unwrap());
    }

    #[test]
    fn test_display() {
        let re = compile("ab").unwrap();
        assert_eq!(re.to_string(), format!("⟪ab⟫ (DFA states: {})", re.state_count()));
    }

    #[test]
    fn test_match_utf16() {
        let re = compile("a\u{1F600}+").unwrap();
        let units: Vec<u16> = "a\u{1F600}\u{1F600}".encode_utf16().collect();
        assert!(re.match_utf16(units).matched);
        let lone = compile("\\x{D800}").unwrap();
        assert!(lone.match_utf16([0xD800]).matched);
    }

    #[test]
    fn test_match_reader() {
        let re = compile("h[eé]llo").unwrap();
        assert!(re.match_reader("héllo".as_bytes()).unwrap().matched);
        assert!(!re.match_reader("hallo".as_bytes()).unwrap().matched);
        let err = re.match_reader(&[b'h', 0xFF][..]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_normalized_inputs() {
        let ci = compile_with(
            "straße",
            Flags {
                case_insensitive: true,
                unicode_case: true,
                ..Flags::default()
            },
        )
        .unwrap();
        assert!(ci.matches("STRAßE"));
        let ce = compile_with(
            "ö",
            Flags {
                canonical_eq: true,
                ..Flags::default()
            },
        )
        .unwrap();
        assert!(ce.matches("o\u{0308}"));
        assert!(ce.matches("\u{F6}"));
        assert!(ce.match_reader("o\u{0308}".as_bytes()).unwrap().matched);
        let utf16: Vec<u16> = "\u{F6}".encode_utf16().collect();
        assert!(ce.match_utf16(utf16).matched);
    }
}
