//! seqmatch: Aho-Corasick multi-pattern matching over arbitrary token alphabets
//!
//! Patterns are sequences of hashable symbols (word ids, bytes, enum tags...)
//! registered under opaque keys. After [`AhoCorasickAutomaton::compile`] a
//! single left-to-right pass reports every pattern ending at every position,
//! longest first, optionally followed by the shorter dictionary patterns that
//! end at the same position.
//!
//! ```
//! use seqmatch::{AhoCorasickAutomaton, PatternMatches};
//!
//! let mut ac = AhoCorasickAutomaton::new();
//! ac.add_pattern("he", &['h', 'e']).unwrap();
//! ac.add_pattern("she", &['s', 'h', 'e']).unwrap();
//! ac.compile().unwrap();
//!
//! let mut matches = PatternMatches::with_suffixes();
//! ac.scan(['u', 's', 'h', 'e'], &mut matches).unwrap();
//! let keys: Vec<_> = matches.iter().map(|m| (m.key, m.end_pos)).collect();
//! assert_eq!(keys, vec![("she", 3), ("he", 3)]);
//! ```
//!
//! For word-level matching over plain text, [`PatternMatcher`] tokenizes
//! patterns and input and drives the automaton:
//!
//! ```
//! use seqmatch::{PatternMatcher, PatternMatches};
//!
//! let mut matcher = PatternMatcher::new();
//! matcher.add_pattern(0u8, "hello").unwrap();
//! matcher.add_pattern(1u8, "world").unwrap();
//! matcher.add_pattern(2u8, "hello world").unwrap();
//! matcher.compile().unwrap();
//!
//! let mut matches = PatternMatches::with_suffixes();
//! matcher.find_patterns("hello world string", &mut matches).unwrap();
//! assert_eq!(matches.len(), 3);
//! ```

pub mod arena;
mod automaton;
mod config;
mod matcher;

use std::fmt;

pub use arena::{BufferArena, Span, SpanIndex, View};
pub use automaton::{
    AhoCorasickAutomaton, PatternId, PatternMatch, PatternMatches, StateId, SuffixChain,
};
pub use config::{AutomatonLimits, MatcherConfig, TokenMode, DEFAULT_ARENA_BLOCK_SIZE};
pub use matcher::{PatternMatcher, WordId, UNKNOWN_WORD};

/// The dense index spaces whose exhaustion is reported by
/// [`SeqMatchError::CapacityExceeded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSpace {
    States,
    Tables,
    Patterns,
    Words,
}

impl fmt::Display for IndexSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexSpace::States => write!(f, "states"),
            IndexSpace::Tables => write!(f, "goto tables"),
            IndexSpace::Patterns => write!(f, "patterns"),
            IndexSpace::Words => write!(f, "words"),
        }
    }
}

/// Errors returned by the automaton, the arena and the pattern matcher.
///
/// All of them are caller or programmer errors; none is transient.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeqMatchError {
    #[error("{operation} cannot be called after the automaton has been compiled")]
    AlreadyCompiled { operation: &'static str },

    #[error("{operation} cannot be called before the automaton has been compiled")]
    NotCompiled { operation: &'static str },

    #[error("the given key has already been inserted")]
    DuplicateKey,

    #[error("the given pattern has already been inserted")]
    DuplicatePattern,

    #[error("patterns must contain at least one symbol")]
    EmptyPattern,

    #[error("the given key is not a registered pattern")]
    UnknownKey,

    #[error("matches accumulator has the wrong suffix mode (expected include_suffixes = {expected_suffixes})")]
    MatchesMode { expected_suffixes: bool },

    #[error("too many {space}: limit is {limit}")]
    CapacityExceeded { space: IndexSpace, limit: u32 },

    #[error("arena allocation of {requested} elements failed")]
    AllocationFailed { requested: usize },

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),

    #[error("automaton is unusable after an internal invariant violation")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, SeqMatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SeqMatchError::AlreadyCompiled {
            operation: "add_pattern",
        };
        assert_eq!(
            err.to_string(),
            "add_pattern cannot be called after the automaton has been compiled"
        );

        let err = SeqMatchError::MatchesMode {
            expected_suffixes: false,
        };
        assert_eq!(
            err.to_string(),
            "matches accumulator has the wrong suffix mode (expected include_suffixes = false)"
        );

        let err = SeqMatchError::CapacityExceeded {
            space: IndexSpace::Tables,
            limit: 4,
        };
        assert_eq!(err.to_string(), "too many goto tables: limit is 4");
    }
}
