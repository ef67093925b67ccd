//! Match accumulator.

use std::ops::Deref;

/// A pattern occurrence: the pattern's key and the position of its last symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PatternMatch<K> {
    pub key: K,
    pub end_pos: usize,
}

impl<K> PatternMatch<K> {
    pub fn new(key: K, end_pos: usize) -> Self {
        Self { key, end_pos }
    }
}

/// Ordered record of matches produced by a scan.
///
/// The accumulator is tagged at construction with whether dictionary
/// suffixes are expanded inline. The automaton honors the tag when stepping,
/// and suffix completion checks it on both of its arguments.
///
/// Matches are appended in non-decreasing `end_pos` order; at equal end
/// position longer patterns come first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternMatches<K> {
    matches: Vec<PatternMatch<K>>,
    include_suffixes: bool,
}

impl<K> Default for PatternMatches<K> {
    fn default() -> Self {
        Self::with_suffixes()
    }
}

impl<K> PatternMatches<K> {
    pub fn new(include_suffixes: bool) -> Self {
        Self {
            matches: Vec::new(),
            include_suffixes,
        }
    }

    /// Accumulator that receives every dictionary suffix of each match.
    pub fn with_suffixes() -> Self {
        Self::new(true)
    }

    /// Accumulator that receives only the longest pattern at each position.
    pub fn without_suffixes() -> Self {
        Self::new(false)
    }

    #[inline]
    pub fn include_suffixes(&self) -> bool {
        self.include_suffixes
    }

    pub fn as_slice(&self) -> &[PatternMatch<K>] {
        &self.matches
    }

    /// Remove every match; the suffix tag is kept.
    pub fn clear(&mut self) {
        self.matches.clear();
    }

    pub fn into_vec(self) -> Vec<PatternMatch<K>> {
        self.matches
    }

    #[inline]
    pub(crate) fn push(&mut self, key: K, end_pos: usize) {
        self.matches.push(PatternMatch { key, end_pos });
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.matches.truncate(len);
    }
}

impl<K> Deref for PatternMatches<K> {
    type Target = [PatternMatch<K>];

    fn deref(&self) -> &[PatternMatch<K>] {
        &self.matches
    }
}

impl<K> IntoIterator for PatternMatches<K> {
    type Item = PatternMatch<K>;
    type IntoIter = std::vec::IntoIter<PatternMatch<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

impl<'a, K> IntoIterator for &'a PatternMatches<K> {
    type Item = &'a PatternMatch<K>;
    type IntoIter = std::slice::Iter<'a, PatternMatch<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}
