//! Append-only block arena handing out zero-copy views.
//!
//! Data is copied once into large backing blocks and afterwards referenced by
//! [`Span`] handles (block index + offset + length). A span is only an index,
//! so it can be stored anywhere without borrowing the arena; resolving it
//! with [`BufferArena::get`] or [`BufferArena::view`] yields a borrowed slice
//! whose lifetime is tied to the arena.
//!
//! Blocks are never reallocated: a block is created with a fixed capacity and
//! only filled up to it, so resolved slices never move. Dropping the arena
//! frees every block at once.
//!
//! [`SpanIndex`] is a content-keyed dictionary over spans. Lookups hash the
//! probe slice itself, so callers can query with borrowed input (for example
//! a word of the text being scanned) without copying it into the arena.

use std::hash::{Hash, Hasher};
use std::ops::Deref;

use hashbrown::hash_table::{Entry, HashTable};
use rustc_hash::FxHasher;

use crate::config::DEFAULT_ARENA_BLOCK_SIZE;
use crate::{Result, SeqMatchError};

/// Handle to a contiguous run of elements stored in a [`BufferArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Span {
    block: u32,
    offset: u32,
    len: u32,
}

impl Span {
    #[inline]
    pub fn len(self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.len == 0
    }

    /// A sub-range of this span, or `None` if it does not fit.
    pub fn sub(self, index: usize, len: usize) -> Option<Span> {
        let end = index.checked_add(len)?;
        if end > self.len() {
            return None;
        }
        Some(Span {
            block: self.block,
            offset: self.offset + index as u32,
            len: len as u32,
        })
    }
}

/// Block arena for `Copy` elements.
#[derive(Debug)]
pub struct BufferArena<T> {
    blocks: Vec<Vec<T>>,
    block_size: usize,
}

impl<T: Copy> Default for BufferArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> BufferArena<T> {
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_ARENA_BLOCK_SIZE)
    }

    /// Create an arena whose blocks hold `block_size` elements.
    ///
    /// No block is allocated until the first [`alloc`](Self::alloc).
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            blocks: Vec::new(),
            block_size: block_size.max(1),
        }
    }

    /// Copy `source` into the arena and return its span.
    ///
    /// When the current block lacks room a new block is allocated, sized to
    /// the configured block size or to `source.len()`, whichever is larger.
    pub fn alloc(&mut self, source: &[T]) -> Result<Span> {
        let requested = source.len();
        if u32::try_from(requested).is_err() {
            return Err(SeqMatchError::AllocationFailed { requested });
        }

        let (needs_block, offset) = match self.blocks.last() {
            Some(block) if block.capacity() - block.len() >= requested => (false, block.len()),
            _ => (true, 0),
        };
        let block_index = if needs_block {
            self.blocks.len()
        } else {
            self.blocks.len() - 1
        };
        // Every span field must fit in a u32 before anything is allocated.
        let (Ok(block), Ok(offset), Ok(len)) = (
            u32::try_from(block_index),
            u32::try_from(offset),
            u32::try_from(offset + requested),
        ) else {
            return Err(SeqMatchError::AllocationFailed { requested });
        };
        if needs_block {
            self.push_block(requested)?;
        }
        self.blocks[block_index].extend_from_slice(source);

        Ok(Span {
            block,
            offset,
            len: len - offset,
        })
    }

    fn push_block(&mut self, requested: usize) -> Result<()> {
        let capacity = self.block_size.max(requested);
        let mut block = Vec::new();
        block
            .try_reserve_exact(capacity)
            .map_err(|_| SeqMatchError::AllocationFailed { requested })?;
        self.blocks.push(block);
        Ok(())
    }

    /// Resolve a span produced by this arena.
    ///
    /// A span from a different arena resolves to an empty slice when it is
    /// out of bounds here.
    #[inline]
    pub fn get(&self, span: Span) -> &[T] {
        let start = span.offset as usize;
        self.blocks
            .get(span.block as usize)
            .and_then(|block| block.get(start..start + span.len()))
            .unwrap_or(&[])
    }

    #[inline]
    pub fn view(&self, span: Span) -> View<'_, T> {
        View::new(self.get(span))
    }

    /// Number of backing blocks allocated so far.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Total number of elements copied into the arena.
    pub fn allocated_len(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }
}

/// Read-only view over arena (or caller) data.
///
/// Equality and hashing are by content, so two views over equal data in
/// different places compare equal and hash identically to the plain slice.
#[derive(Clone, Copy, Debug)]
pub struct View<'a, T> {
    data: &'a [T],
}

impl<'a, T> View<'a, T> {
    #[inline]
    pub fn new(data: &'a [T]) -> Self {
        Self { data }
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Sub-view of `len` elements starting at `index`.
    pub fn sub(&self, index: usize, len: usize) -> Option<View<'a, T>> {
        let end = index.checked_add(len)?;
        self.data.get(index..end).map(View::new)
    }
}

impl<'a, T: PartialEq> View<'a, T> {
    /// Position of the first `delimiter` at or after `from`.
    pub fn find(&self, delimiter: &T, from: usize) -> Option<usize> {
        self.data
            .get(from..)?
            .iter()
            .position(|item| item == delimiter)
            .map(|pos| pos + from)
    }
}

impl<T> Deref for View<'_, T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.data
    }
}

impl<T: PartialEq> PartialEq for View<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<T: Eq> Eq for View<'_, T> {}

impl<T: Hash> Hash for View<'_, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

fn content_hash<T: Hash>(data: &[T]) -> u64 {
    let mut hasher = FxHasher::default();
    data.hash(&mut hasher);
    hasher.finish()
}

/// Dictionary keyed by the content of arena spans.
///
/// Entries are stored in a raw hash table and located by hashing the probe
/// slice, then comparing each candidate span's data through the arena. The
/// index does not own the arena, so every call takes the arena the spans
/// belong to (and rehashing resolves spans through it too).
#[derive(Debug, Clone)]
pub struct SpanIndex<V> {
    table: HashTable<(Span, V)>,
}

impl<V> Default for SpanIndex<V> {
    fn default() -> Self {
        Self {
            table: HashTable::new(),
        }
    }
}

/// Rehash function for entries of a [`SpanIndex`].
fn entry_hasher<T: Copy + Hash, V>(arena: &BufferArena<T>) -> impl Fn(&(Span, V)) -> u64 + '_ {
    move |entry: &(Span, V)| content_hash(arena.get(entry.0))
}

impl<V> SpanIndex<V> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn reserve<T: Copy + Hash>(&mut self, arena: &BufferArena<T>, additional: usize) {
        self.table.reserve(additional, entry_hasher(arena));
    }

    /// Look up the value stored for data equal to `probe`.
    pub fn get<T: Copy + Eq + Hash>(&self, arena: &BufferArena<T>, probe: &[T]) -> Option<&V> {
        self.table
            .find(content_hash(probe), |(span, _)| arena.get(*span) == probe)
            .map(|(_, value)| value)
    }

    pub fn contains<T: Copy + Eq + Hash>(&self, arena: &BufferArena<T>, probe: &[T]) -> bool {
        self.get(arena, probe).is_some()
    }

    /// Insert `span` with `value`. If equal content is already indexed the
    /// old value is replaced and returned; the stored span is kept.
    pub fn insert<T: Copy + Eq + Hash>(
        &mut self,
        arena: &BufferArena<T>,
        span: Span,
        value: V,
    ) -> Option<V> {
        let data = arena.get(span);
        let entry = self.table.entry(
            content_hash(data),
            |(stored, _)| arena.get(*stored) == data,
            entry_hasher(arena),
        );
        match entry {
            Entry::Occupied(mut occupied) => {
                Some(std::mem::replace(&mut occupied.get_mut().1, value))
            }
            Entry::Vacant(vacant) => {
                vacant.insert((span, value));
                None
            }
        }
    }

    /// Iterate over the indexed spans and their values, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (Span, &V)> {
        self.table.iter().map(|(span, value)| (*span, value))
    }

    /// Resize the table to a load factor of about one half.
    pub fn compact<T: Copy + Hash>(&mut self, arena: &BufferArena<T>) {
        let target = self.table.len() * 2;
        if self.table.capacity() > target {
            self.table.shrink_to(target, entry_hasher(arena));
        } else {
            self.table.reserve(target - self.table.len(), entry_hasher(arena));
        }
    }
}
