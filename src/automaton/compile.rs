//! Breadth-first compilation of the trie into a total-transition automaton.
//!
//! Each queue entry pairs a state with its failure state. Processing in order
//! of increasing depth guarantees that a failure state (always shallower) has
//! already had its output and table finalized when it is consulted.
//!
//! For every `(fail, curr)`:
//!
//! 1. Output merge: `curr` adopts `fail`'s pattern if it has none of its own,
//!    otherwise `fail`'s pattern becomes the suffix link of `curr`'s pattern.
//! 2. Children of `curr` are enqueued with their failure state, resolved
//!    through `fail`'s table, then the root's table, then the root.
//! 3. Unless `fail` is the root, `curr` inherits `fail`'s edges: merged into
//!    its own table if it has one, otherwise by aliasing `fail`'s table.
//!
//! The root table is frozen for the whole traversal: it is the single
//! default table every other lookup falls back to.

use std::collections::VecDeque;
use std::hash::Hash;
use std::mem;

use log::{debug, warn};

use super::goto_table::{rebalance, Ownership};
use super::{AhoCorasickAutomaton, Phase, StateId, TableId};
use crate::{Result, SeqMatchError};

#[derive(Clone, Copy, Debug)]
struct QueueEntry {
    fail: StateId,
    curr: StateId,
}

#[derive(Default, Debug)]
struct CompileStats {
    aliased: usize,
    extended: usize,
    inherited_edges: usize,
    suffix_links: usize,
}

impl<K: Clone + Eq + Hash, S: Clone + Eq + Hash> AhoCorasickAutomaton<K, S> {
    /// Compile the trie into an automaton. Calling it again is a no-op.
    ///
    /// After compilation no pattern can be added. An `InternalInvariant`
    /// error means the construction is inconsistent; the automaton is then
    /// poisoned and rejects every further operation that needs it.
    pub fn compile(&mut self) -> Result<()> {
        match self.phase {
            Phase::Compiled => return Ok(()),
            Phase::Poisoned => return Err(SeqMatchError::Poisoned),
            Phase::Open => {}
        }

        self.suffix_links = vec![None; self.pattern_keys.len()];
        match self.run_bfs() {
            Ok(stats) => {
                self.phase = Phase::Compiled;
                debug!(
                    "compiled automaton: {} states, {} tables ({} aliased, {} extended with {} edges), {} patterns, {} suffix links",
                    self.nodes.len(),
                    self.tables.len(),
                    stats.aliased,
                    stats.extended,
                    stats.inherited_edges,
                    self.pattern_keys.len(),
                    stats.suffix_links
                );
                Ok(())
            }
            Err(err) => {
                warn!("automaton compilation failed: {}", err);
                self.phase = Phase::Poisoned;
                Err(err)
            }
        }
    }

    fn run_bfs(&mut self) -> Result<CompileStats> {
        let mut stats = CompileStats::default();
        let root_table = TableId::ROOT;
        if self.nodes[StateId::ROOT.index()].goto != Some(root_table) {
            return Err(SeqMatchError::InternalInvariant(
                "root state does not own the root goto table".to_string(),
            ));
        }
        self.tables[root_table.index()].freeze();

        let mut queue: VecDeque<QueueEntry> = self.tables[root_table.index()]
            .iter()
            .map(|(_, child)| QueueEntry {
                fail: StateId::ROOT,
                curr: child,
            })
            .collect();
        let root_edges = self.tables[root_table.index()].len();

        while let Some(QueueEntry { fail, curr }) = queue.pop_front() {
            let fail_node = self.nodes[fail.index()];
            let curr_node = self.nodes[curr.index()];

            // 1) output merge
            if let Some(fail_pattern) = fail_node.pattern {
                match curr_node.pattern {
                    Some(own) => {
                        let slot = &mut self.suffix_links[own.index()];
                        if slot.is_some() {
                            return Err(SeqMatchError::InternalInvariant(format!(
                                "suffix link of pattern {} set twice",
                                own.index()
                            )));
                        }
                        *slot = Some(fail_pattern);
                        stats.suffix_links += 1;
                    }
                    None => self.nodes[curr.index()].pattern = Some(fail_pattern),
                }
            }

            // 2) enqueue children, before the table is extended below
            if let Some(curr_table) = curr_node.goto {
                let tables = &self.tables;
                let fail_table = fail_node.goto.map(|table| &tables[table.index()]);
                let root = &tables[root_table.index()];
                for (symbol, child) in tables[curr_table.index()].iter() {
                    let child_fail = fail_table
                        .and_then(|table| table.get(symbol))
                        .or_else(|| {
                            if fail_node.goto == Some(root_table) {
                                None
                            } else {
                                root.get(symbol)
                            }
                        })
                        .unwrap_or(StateId::ROOT);
                    queue.push_back(QueueEntry {
                        fail: child_fail,
                        curr: child,
                    });
                }
            }

            // 3) inherit the failure state's edges
            if fail.is_root() {
                continue;
            }
            let Some(fail_table) = fail_node.goto else {
                continue;
            };
            if fail_table == root_table {
                return Err(SeqMatchError::InternalInvariant(format!(
                    "state {} aliases the root goto table",
                    fail.index()
                )));
            }
            match curr_node.goto {
                Some(curr_table) if curr_table == fail_table => {
                    return Err(SeqMatchError::InternalInvariant(format!(
                        "state {} shares a goto table with its failure state",
                        curr.index()
                    )));
                }
                Some(curr_table) => {
                    let mut table = mem::take(&mut self.tables[curr_table.index()]);
                    let inherited = table.inherit_from(&self.tables[fail_table.index()]);
                    self.tables[curr_table.index()] = table;
                    stats.inherited_edges += inherited?;
                    stats.extended += 1;
                }
                None => {
                    self.tables[fail_table.index()].mark_shared();
                    self.nodes[curr.index()].goto = Some(fail_table);
                    stats.aliased += 1;
                }
            }
        }

        if self.tables[root_table.index()].len() != root_edges
            || self.tables[root_table.index()].ownership() != Ownership::Frozen
        {
            return Err(SeqMatchError::InternalInvariant(
                "root goto table changed during compilation".to_string(),
            ));
        }
        Ok(stats)
    }

    /// Shrink every dense array and resize every hash table to a load factor
    /// of about one half. Matching behavior is unchanged.
    pub fn compact(&mut self) -> Result<()> {
        self.check_compiled("compact")?;
        self.nodes.shrink_to_fit();
        self.tables.shrink_to_fit();
        self.pattern_keys.shrink_to_fit();
        self.pattern_lengths.shrink_to_fit();
        self.suffix_links.shrink_to_fit();
        rebalance(&mut self.key_to_pattern);
        for table in &mut self.tables {
            table.rebalance();
        }
        debug!(
            "compacted automaton: {} states, {} tables, {} patterns",
            self.nodes.len(),
            self.tables.len(),
            self.pattern_keys.len()
        );
        Ok(())
    }
}
