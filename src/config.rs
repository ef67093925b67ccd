//! Construction-time configuration.
//!
//! All settings are plain values with sensible defaults; builders follow the
//! `with_*` convention so a config can be assembled in one expression:
//!
//! ```
//! use seqmatch::{MatcherConfig, TokenMode};
//!
//! let config = MatcherConfig::default()
//!     .with_token_mode(TokenMode::Words { delimiter: b',' })
//!     .with_arena_block_size(4096);
//! assert_eq!(config.arena_block_size, 4096);
//! ```

/// Default size of one arena block (elements, not bytes, for non-byte arenas).
pub const DEFAULT_ARENA_BLOCK_SIZE: usize = 1024 * 1024;

/// Upper bounds on the automaton's dense index spaces.
///
/// Every id is a `u32`; the defaults allow the whole range. Lower limits are
/// useful to cap memory for untrusted pattern sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutomatonLimits {
    /// Maximum number of trie states, root included.
    pub max_states: u32,
    /// Maximum number of goto tables, the root table included.
    pub max_tables: u32,
    /// Maximum number of registered patterns.
    pub max_patterns: u32,
}

impl Default for AutomatonLimits {
    fn default() -> Self {
        Self {
            max_states: u32::MAX,
            max_tables: u32::MAX,
            max_patterns: u32::MAX,
        }
    }
}

impl AutomatonLimits {
    pub fn with_max_states(mut self, max_states: u32) -> Self {
        self.max_states = max_states;
        self
    }

    pub fn with_max_tables(mut self, max_tables: u32) -> Self {
        self.max_tables = max_tables;
        self
    }

    pub fn with_max_patterns(mut self, max_patterns: u32) -> Self {
        self.max_patterns = max_patterns;
        self
    }
}

/// How the [`PatternMatcher`](crate::PatternMatcher) splits text into symbols.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenMode {
    /// Split on a delimiter byte; empty tokens are skipped.
    Words { delimiter: u8 },
    /// Every byte is its own symbol.
    Bytes,
}

impl Default for TokenMode {
    fn default() -> Self {
        TokenMode::Words { delimiter: b' ' }
    }
}

/// Configuration for a [`PatternMatcher`](crate::PatternMatcher).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatcherConfig {
    pub token_mode: TokenMode,
    /// Size of each backing block of the pattern-text arena.
    pub arena_block_size: usize,
    /// Limits forwarded to the underlying automaton.
    pub limits: AutomatonLimits,
    /// Maximum number of distinct words. Word id 0 means "unknown word",
    /// so at most `u32::MAX - 1` words can be registered.
    pub max_words: u32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            token_mode: TokenMode::default(),
            arena_block_size: DEFAULT_ARENA_BLOCK_SIZE,
            limits: AutomatonLimits::default(),
            max_words: u32::MAX - 1,
        }
    }
}

impl MatcherConfig {
    pub fn with_token_mode(mut self, token_mode: TokenMode) -> Self {
        self.token_mode = token_mode;
        self
    }

    pub fn with_arena_block_size(mut self, arena_block_size: usize) -> Self {
        self.arena_block_size = arena_block_size;
        self
    }

    pub fn with_limits(mut self, limits: AutomatonLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_max_words(mut self, max_words: u32) -> Self {
        self.max_words = max_words.min(u32::MAX - 1);
        self
    }
}
