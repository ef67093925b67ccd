//! Aho-Corasick automaton over an arbitrary symbol alphabet.
//!
//! The automaton is a trie stored as parallel dense arrays addressed by
//! integer ids, then compiled in place into a total-transition automaton.
//! The key components are:
//!
//! - `Node`: per-state goto table id and output pattern id
//! - `GotoTable`: hashed symbol -> state map, possibly shared between states
//! - the pattern registry (id <-> key, pattern lengths)
//! - the dictionary suffix chain, one link per pattern
//!
//! # Module Organization
//!
//! - `goto_table`: transition tables and their ownership tags
//! - `build`: trie phase (`add_pattern`, `reserve`)
//! - `compile`: breadth-first compilation and compaction
//! - `query`: transitions, match reporting, suffix completion
//! - `matches`: the match accumulator

mod build;
mod compile;
mod goto_table;
mod matches;
mod query;

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::config::AutomatonLimits;
use crate::{IndexSpace, Result, SeqMatchError};

use goto_table::GotoTable;

pub use matches::{PatternMatch, PatternMatches};
pub use query::SuffixChain;

/// A state identifier - an index into the node array.
///
/// State ids are only meaningful for the automaton that produced them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct StateId(u32);

impl StateId {
    /// The root state, where every scan starts.
    pub const ROOT: StateId = StateId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl Default for StateId {
    fn default() -> Self {
        Self::ROOT
    }
}

/// Dense pattern identifier, assigned in insertion order starting at 0.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct PatternId(u32);

impl PatternId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct TableId(u32);

impl TableId {
    /// The root's table; it is allocated at construction and never aliased.
    pub(crate) const ROOT: TableId = TableId(0);

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A trie node.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Node {
    /// Transition table, if the node branches (or after compilation, if it
    /// inherited one from its failure state).
    pub(crate) goto: Option<TableId>,
    /// Longest pattern recognized on reaching this node.
    pub(crate) pattern: Option<PatternId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Trie phase: patterns may be added.
    Open,
    /// Automaton phase: queries are valid, mutation is rejected.
    Compiled,
    /// Compilation hit an internal invariant violation.
    Poisoned,
}

/// Multi-pattern matcher built as a trie and compiled into an automaton.
///
/// `K` is the application's pattern key, `S` the symbol type. Both must be
/// hashable; keys are cloned into the match accumulator when reported.
///
/// Lifecycle: add patterns, call [`compile`](Self::compile) once, then query
/// with [`step`](Self::step) / [`scan`](Self::scan). A compiled automaton is
/// immutable and can be shared between threads for querying.
#[derive(Clone, Debug)]
pub struct AhoCorasickAutomaton<K, S> {
    phase: Phase,
    limits: AutomatonLimits,
    pub(crate) nodes: Vec<Node>,
    tables: Vec<GotoTable<S>>,
    pattern_keys: Vec<K>,
    pattern_lengths: Vec<usize>,
    /// Next-shorter dictionary pattern ending at the same position.
    suffix_links: Vec<Option<PatternId>>,
    key_to_pattern: FxHashMap<K, PatternId>,
}

impl<K: Clone + Eq + Hash, S: Clone + Eq + Hash> Default for AhoCorasickAutomaton<K, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash, S: Clone + Eq + Hash> AhoCorasickAutomaton<K, S> {
    /// Create an empty automaton containing only the root state.
    pub fn new() -> Self {
        Self::with_limits(AutomatonLimits::default())
    }

    pub fn with_limits(limits: AutomatonLimits) -> Self {
        Self {
            phase: Phase::Open,
            limits,
            nodes: vec![Node {
                goto: Some(TableId::ROOT),
                pattern: None,
            }],
            tables: vec![GotoTable::new()],
            pattern_keys: Vec::new(),
            pattern_lengths: Vec::new(),
            suffix_links: Vec::new(),
            key_to_pattern: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn is_compiled(&self) -> bool {
        self.phase == Phase::Compiled
    }

    pub fn limits(&self) -> AutomatonLimits {
        self.limits
    }

    /// Number of states, root included.
    pub fn num_states(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct goto tables. Aliased tables are counted once.
    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    pub fn num_patterns(&self) -> usize {
        self.pattern_keys.len()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.key_to_pattern.contains_key(key)
    }

    pub fn pattern_id(&self, key: &K) -> Option<PatternId> {
        self.key_to_pattern.get(key).copied()
    }

    pub fn pattern_key(&self, id: PatternId) -> Option<&K> {
        self.pattern_keys.get(id.index())
    }

    /// Number of symbols in the pattern registered under `key`.
    pub fn pattern_length(&self, key: &K) -> Result<usize> {
        let id = self.pattern_id(key).ok_or(SeqMatchError::UnknownKey)?;
        Ok(self.pattern_lengths[id.index()])
    }

    /// Every registered key with its pattern length, in insertion order.
    pub fn pattern_lengths(&self) -> impl Iterator<Item = (&K, usize)> + '_ {
        self.pattern_keys
            .iter()
            .zip(self.pattern_lengths.iter().copied())
    }

    /// The pattern recognized on reaching `state`, if any.
    pub fn output(&self, state: StateId) -> Option<PatternId> {
        self.nodes.get(state.index())?.pattern
    }

    pub(crate) fn check_open(&self, operation: &'static str) -> Result<()> {
        match self.phase {
            Phase::Open => Ok(()),
            Phase::Compiled => Err(SeqMatchError::AlreadyCompiled { operation }),
            Phase::Poisoned => Err(SeqMatchError::Poisoned),
        }
    }

    pub(crate) fn check_compiled(&self, operation: &'static str) -> Result<()> {
        match self.phase {
            Phase::Compiled => Ok(()),
            Phase::Open => Err(SeqMatchError::NotCompiled { operation }),
            Phase::Poisoned => Err(SeqMatchError::Poisoned),
        }
    }
}

/// Convert a dense array length into the next id, enforcing `limit`.
fn next_id(len: usize, limit: u32, space: IndexSpace) -> Result<u32> {
    match u32::try_from(len) {
        Ok(id) if id < limit => Ok(id),
        _ => Err(SeqMatchError::CapacityExceeded { space, limit }),
    }
}
