//! Trie phase: pattern registration.

use std::hash::Hash;

use log::trace;

use super::goto_table::GotoTable;
use super::{next_id, AhoCorasickAutomaton, Node, PatternId, StateId, TableId};
use crate::{IndexSpace, Result, SeqMatchError};

impl<K: Clone + Eq + Hash, S: Clone + Eq + Hash> AhoCorasickAutomaton<K, S> {
    /// Add a pattern to the trie under `key`.
    ///
    /// Fails without modifying the trie if the automaton is compiled, the key
    /// or the symbol sequence is already registered, the pattern is empty, or
    /// a capacity limit would be exceeded.
    pub fn add_pattern(&mut self, key: K, symbols: &[S]) -> Result<PatternId> {
        self.check_open("add_pattern")?;
        if symbols.is_empty() {
            return Err(SeqMatchError::EmptyPattern);
        }
        if self.key_to_pattern.contains_key(&key) {
            return Err(SeqMatchError::DuplicateKey);
        }

        // Read-only walk along the existing prefix.
        let (prefix_end, matched) = self.walk_trie(symbols);
        if matched == symbols.len() && self.nodes[prefix_end.index()].pattern.is_some() {
            return Err(SeqMatchError::DuplicatePattern);
        }

        // Every missing symbol creates a state; every new state but the last
        // needs a table, plus the prefix end if it never branched.
        let new_states = symbols.len() - matched;
        let mut new_tables = new_states.saturating_sub(1);
        if new_states > 0 && self.nodes[prefix_end.index()].goto.is_none() {
            new_tables += 1;
        }
        if new_states > 0 {
            next_id(
                self.nodes.len() + new_states - 1,
                self.limits.max_states,
                IndexSpace::States,
            )?;
        }
        if new_tables > 0 {
            next_id(
                self.tables.len() + new_tables - 1,
                self.limits.max_tables,
                IndexSpace::Tables,
            )?;
        }
        let pattern_id = PatternId(next_id(
            self.pattern_keys.len(),
            self.limits.max_patterns,
            IndexSpace::Patterns,
        )?);

        let mut state = prefix_end;
        for symbol in &symbols[matched..] {
            state = self.add_child(state, symbol.clone())?;
        }

        self.pattern_keys.push(key.clone());
        self.pattern_lengths.push(symbols.len());
        self.key_to_pattern.insert(key, pattern_id);
        self.nodes[state.index()].pattern = Some(pattern_id);

        trace!(
            "registered pattern {} (length {}, {} new states)",
            pattern_id.index(),
            symbols.len(),
            new_states
        );
        Ok(pattern_id)
    }

    /// Reserve room for about `num_patterns` patterns.
    pub fn reserve(&mut self, num_patterns: usize) -> Result<()> {
        self.check_open("reserve")?;
        let num_patterns = num_patterns.max(1);
        self.nodes.reserve(num_patterns);
        self.tables.reserve(num_patterns);
        self.pattern_keys.reserve(num_patterns);
        self.pattern_lengths.reserve(num_patterns);
        self.key_to_pattern.reserve(num_patterns * 2);
        Ok(())
    }

    /// Follow explicit edges as far as `symbols` allows.
    ///
    /// Returns the last state reached and the number of symbols consumed.
    fn walk_trie(&self, symbols: &[S]) -> (StateId, usize) {
        let mut state = StateId::ROOT;
        for (consumed, symbol) in symbols.iter().enumerate() {
            let next = self.nodes[state.index()]
                .goto
                .and_then(|table| self.tables[table.index()].get(symbol));
            match next {
                Some(next) => state = next,
                None => return (state, consumed),
            }
        }
        (state, symbols.len())
    }

    /// Create a child of `parent` on `symbol`, allocating the parent's table
    /// on its first branch.
    fn add_child(&mut self, parent: StateId, symbol: S) -> Result<StateId> {
        let table = match self.nodes[parent.index()].goto {
            Some(table) => table,
            None => {
                let table = TableId(next_id(
                    self.tables.len(),
                    self.limits.max_tables,
                    IndexSpace::Tables,
                )?);
                self.tables.push(GotoTable::new());
                self.nodes[parent.index()].goto = Some(table);
                table
            }
        };

        let child = StateId(next_id(
            self.nodes.len(),
            self.limits.max_states,
            IndexSpace::States,
        )?);
        self.nodes.push(Node::default());
        self.tables[table.index()].insert_edge(symbol, child)?;
        Ok(child)
    }
}
