//! setregex: DFA-based regular expressions with set operations.
//!
//! Patterns compile to deterministic automata, so matching is a single
//! linear pass over the input. Because every pattern is a plain DFA, two
//! patterns can also be combined: union, intersection and difference build
//! new regexes, and emptiness checks answer subset and equivalence questions.
//!
//! ```
//! let digits = setregex::compile("[0-9]+").unwrap();
//! assert!(digits.matches("2024"));
//! assert!(!digits.matches("20x4"));
//! ```
//!
//! Set operations need patterns compiled against one shared [`Universe`]:
//!
//! ```
//! use setregex::{compile_all, Flags};
//!
//! let group = compile_all(&["[a-z]+", "a.*", "(?!a).*"], Flags::default()).unwrap();
//! let both = group[0].intersect(&group[1]).unwrap();
//! assert!(both.matches("abc"));
//! assert!(!both.matches("Abc"));
//! assert!(!group[1].do_intersect(&group[2]).unwrap());
//! ```

pub mod automaton;
mod compiled;
pub mod regexp;
mod universe;

pub use automaton::MatchResult;
pub use compiled::CompiledRegex;
pub use regexp::{DotMatch, Flags, Node, Normalizer, PatternError};
pub use universe::Universe;

/// Errors from compiling or combining regexes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),
    #[error("regexes were compiled in different universes")]
    IncompatibleUniverse,
    #[error("range {from:#x}..={to:#x} is not part of the universe")]
    OutsideUniverse { from: u32, to: u32 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Compile one pattern with default flags.
pub fn compile(pattern: &str) -> Result<CompiledRegex> {
    compile_with(pattern, Flags::default())
}

/// Compile one pattern in a universe of its own.
pub fn compile_with(pattern: &str, flags: Flags) -> Result<CompiledRegex> {
    let parsed = regexp::parse(pattern, flags)?;
    let universe = Universe::new([&parsed.tree], parsed.normalizer, parsed.canonical_eq);
    CompiledRegex::compile_parsed(parsed, &universe)
}

/// Compile a group of patterns against one shared universe, so that the
/// results can be combined with each other.
pub fn compile_all<S: AsRef<str>>(patterns: &[S], flags: Flags) -> Result<Vec<CompiledRegex>> {
    let parsed = patterns
        .iter()
        .map(|p| regexp::parse(p.as_ref(), flags))
        .collect::<Result<Vec<_>, _>>()?;
    // only leading embedded flags can change normalization, take the first
    let Some(first) = parsed.first() else {
        return Ok(Vec::new());
    };
    let universe = Universe::new(
        parsed.iter().map(|p| &p.tree),
        first.normalizer,
        first.canonical_eq,
    );
    parsed
        .into_iter()
        .map(|p| CompiledRegex::compile_parsed(p, &universe))
        .collect()
}
