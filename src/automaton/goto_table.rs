//! Hashed transition tables.
//!
//! Tables only exist for states that branch. During compilation a state
//! without children may alias the table of its failure state instead of
//! copying it; the ownership tag records that so the shared table is never
//! mutated afterwards.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use super::StateId;
use crate::{Result, SeqMatchError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) enum Ownership {
    /// Referenced by a single state; may still be extended.
    #[default]
    Exclusive,
    /// Aliased by at least one other state; read-only.
    Shared,
    /// The root table once compilation has started; read-only.
    Frozen,
}

#[derive(Clone, Debug)]
pub(crate) struct GotoTable<S> {
    edges: FxHashMap<S, StateId>,
    ownership: Ownership,
}

impl<S> Default for GotoTable<S> {
    fn default() -> Self {
        Self {
            edges: FxHashMap::default(),
            ownership: Ownership::Exclusive,
        }
    }
}

impl<S: Clone + Eq + Hash> GotoTable<S> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn get(&self, symbol: &S) -> Option<StateId> {
        self.edges.get(symbol).copied()
    }

    #[inline]
    pub(crate) fn contains(&self, symbol: &S) -> bool {
        self.edges.contains_key(symbol)
    }

    pub(crate) fn len(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&S, StateId)> {
        self.edges.iter().map(|(symbol, &state)| (symbol, state))
    }

    /// Add an explicit trie edge.
    pub(crate) fn insert_edge(&mut self, symbol: S, target: StateId) -> Result<()> {
        self.check_writable()?;
        self.edges.insert(symbol, target);
        Ok(())
    }

    /// Copy every edge of `fallback` whose symbol is not already present.
    /// Explicit edges always win. Returns the number of inherited edges.
    pub(crate) fn inherit_from(&mut self, fallback: &GotoTable<S>) -> Result<usize> {
        self.check_writable()?;
        let mut inherited = 0;
        for (symbol, &target) in &fallback.edges {
            if !self.edges.contains_key(symbol) {
                self.edges.insert(symbol.clone(), target);
                inherited += 1;
            }
        }
        Ok(inherited)
    }

    pub(crate) fn mark_shared(&mut self) {
        if self.ownership == Ownership::Exclusive {
            self.ownership = Ownership::Shared;
        }
    }

    pub(crate) fn freeze(&mut self) {
        self.ownership = Ownership::Frozen;
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.edges.reserve(additional);
    }

    /// Resize the hash table to a load factor of about one half.
    pub(crate) fn rebalance(&mut self) {
        rebalance(&mut self.edges);
    }

    fn check_writable(&self) -> Result<()> {
        match self.ownership {
            Ownership::Exclusive => Ok(()),
            other => Err(SeqMatchError::InternalInvariant(format!(
                "attempt to mutate a {:?} goto table",
                other
            ))),
        }
    }
}

/// Set `map`'s capacity to twice its length.
pub(crate) fn rebalance<K: Eq + Hash, V>(map: &mut FxHashMap<K, V>) {
    let target = map.len() * 2;
    if map.capacity() > target {
        map.shrink_to(target);
    } else {
        map.reserve(target - map.len());
    }
}
