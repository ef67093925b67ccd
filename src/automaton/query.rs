//! Query protocol: transitions, match reporting and suffix completion.
//!
//! Queries on an automaton that has not been compiled return a state, but
//! it follows only explicit trie edges and the results are not meaningful.

use std::borrow::Borrow;
use std::hash::Hash;

use super::{AhoCorasickAutomaton, PatternId, PatternMatches, StateId};
use crate::{Result, SeqMatchError};

/// Iterator over a pattern's dictionary suffix chain, longest first.
///
/// Created by [`AhoCorasickAutomaton::suffix_chain`]; the starting pattern is
/// not included.
#[derive(Clone, Debug)]
pub struct SuffixChain<'a> {
    links: &'a [Option<PatternId>],
    current: Option<PatternId>,
}

impl Iterator for SuffixChain<'_> {
    type Item = PatternId;

    #[inline]
    fn next(&mut self) -> Option<PatternId> {
        let next = self
            .current
            .and_then(|id| self.links.get(id.index()).copied().flatten());
        self.current = next;
        next
    }
}

impl<K: Clone + Eq + Hash, S: Clone + Eq + Hash> AhoCorasickAutomaton<K, S> {
    /// The transition function.
    ///
    /// Looks `symbol` up in `state`'s table; on a miss falls back to the
    /// root's table, and to the root itself if that misses too. On a
    /// compiled automaton this is total and at most two lookups.
    #[inline]
    pub fn next_state(&self, state: StateId, symbol: &S) -> StateId {
        if let Some(next) = self.lookup(state, symbol) {
            return next;
        }
        if state.is_root() {
            return StateId::ROOT;
        }
        self.lookup(StateId::ROOT, symbol).unwrap_or(StateId::ROOT)
    }

    #[inline]
    fn lookup(&self, state: StateId, symbol: &S) -> Option<StateId> {
        let table = self.nodes.get(state.index())?.goto?;
        self.tables[table.index()].get(symbol)
    }

    /// Advance on `symbol` and report the matches ending at `pos`.
    ///
    /// The longest pattern recognized at the new state is pushed first; when
    /// `matches` includes suffixes, its dictionary suffix chain follows.
    pub fn step(
        &self,
        state: StateId,
        symbol: &S,
        matches: &mut PatternMatches<K>,
        pos: usize,
    ) -> StateId {
        let next = self.next_state(state, symbol);
        if let Some(pattern) = self.output(next) {
            matches.push(self.pattern_keys[pattern.index()].clone(), pos);
            if matches.include_suffixes() {
                for suffix in self.suffix_chain(pattern) {
                    matches.push(self.pattern_keys[suffix.index()].clone(), pos);
                }
            }
        }
        next
    }

    /// Advance on `symbol` and push the keys of every pattern ending here,
    /// longest first, suffixes included.
    pub fn step_keys(&self, state: StateId, symbol: &S, keys: &mut Vec<K>) -> StateId {
        let next = self.next_state(state, symbol);
        if let Some(pattern) = self.output(next) {
            keys.push(self.pattern_keys[pattern.index()].clone());
            keys.extend(
                self.suffix_chain(pattern)
                    .map(|suffix| self.pattern_keys[suffix.index()].clone()),
            );
        }
        next
    }

    /// Scan a whole sequence from the root, numbering symbols from 0.
    ///
    /// Returns the final state.
    pub fn scan<I>(&self, symbols: I, matches: &mut PatternMatches<K>) -> Result<StateId>
    where
        I: IntoIterator,
        I::Item: Borrow<S>,
    {
        self.check_compiled("scan")?;
        let mut state = StateId::ROOT;
        for (pos, symbol) in symbols.into_iter().enumerate() {
            state = self.step(state, symbol.borrow(), matches, pos);
        }
        Ok(state)
    }

    /// The dictionary suffix chain of `pattern`, longest suffix first.
    ///
    /// Empty before compilation.
    pub fn suffix_chain(&self, pattern: PatternId) -> SuffixChain<'_> {
        SuffixChain {
            links: &self.suffix_links,
            current: Some(pattern),
        }
    }

    /// Append to `dst` the matches of `src` each followed by its dictionary
    /// suffixes, preserving order.
    ///
    /// The result is identical to scanning with a suffix-expanding
    /// accumulator. `src` must not include suffixes and `dst` must. If a key
    /// in `src` is unknown, everything appended to `dst` by this call is
    /// removed before the error is returned.
    pub fn complete_with_suffix_matches(
        &self,
        src: &PatternMatches<K>,
        dst: &mut PatternMatches<K>,
    ) -> Result<()> {
        if src.include_suffixes() {
            return Err(SeqMatchError::MatchesMode {
                expected_suffixes: false,
            });
        }
        if !dst.include_suffixes() {
            return Err(SeqMatchError::MatchesMode {
                expected_suffixes: true,
            });
        }

        let initial_len = dst.len();
        for m in src.iter() {
            let Some(pattern) = self.pattern_id(&m.key) else {
                dst.truncate(initial_len);
                return Err(SeqMatchError::UnknownKey);
            };
            dst.push(m.key.clone(), m.end_pos);
            for suffix in self.suffix_chain(pattern) {
                dst.push(self.pattern_keys[suffix.index()].clone(), m.end_pos);
            }
        }
        Ok(())
    }
}
