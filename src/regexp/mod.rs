//! Regex syntax: trees, parsing, normalization and compilation to DFAs.
//!
//! - `tree`: the `Node` syntax tree and code point range helpers
//! - `parser`: Java-flavoured pattern syntax to `Node`
//! - `blocks`: Unicode block ranges
//! - `classes`: shorthand, POSIX, Java and Unicode property classes
//! - `normalize`: case mapping and canonical decomposition
//! - `nfa`: `Node` to NFA (Thompson construction, lookaround rewrite) to DFA

mod blocks;
mod classes;
mod nfa;
mod normalize;
mod parser;
mod tree;

// Re-export public API
pub use classes::DotMatch;
pub(crate) use nfa::compile_dfa;
pub use normalize::{Normalization, Normalizer};
pub use parser::{parse, Flags, ParsedRegex, PatternError};
pub use tree::{
    complement_ranges, difference_ranges, union_ranges, CharRange, Condition, Direction, Node,
};
