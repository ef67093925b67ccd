//! Text front end for the automaton.
//!
//! `PatternMatcher` splits pattern text and input text into tokens, maps each
//! distinct token to a dense word id and feeds the ids to an
//! [`AhoCorasickAutomaton`]. Pattern text is copied once into a
//! [`BufferArena`]; the word dictionary indexes sub-spans of those copies, so
//! every registered word costs no allocation of its own.

use std::hash::Hash;

use log::{debug, trace};
use smallvec::SmallVec;

use crate::arena::{BufferArena, Span, SpanIndex, View};
use crate::automaton::{AhoCorasickAutomaton, PatternMatches, StateId};
use crate::config::{MatcherConfig, TokenMode};
use crate::{IndexSpace, Result, SeqMatchError};

/// Dense identifier of a registered word.
pub type WordId = u32;

/// Word id of every token that appears in no pattern.
pub const UNKNOWN_WORD: WordId = 0;

/// Iterator over the non-empty tokens of `text` with their byte offsets.
fn tokens(text: &[u8], mode: TokenMode) -> impl Iterator<Item = (usize, &[u8])> {
    let mut pos = 0;
    std::iter::from_fn(move || match mode {
        TokenMode::Bytes => {
            let start = pos;
            pos += 1;
            text.get(start..pos).map(|token| (start, token))
        }
        TokenMode::Words { delimiter } => {
            let view = View::new(text);
            while pos < text.len() {
                let start = pos;
                let end = view.find(&delimiter, start).unwrap_or(text.len());
                pos = end + 1;
                if end > start {
                    return Some((start, &text[start..end]));
                }
            }
            None
        }
    })
}

/// Word-level (or byte-level) multi-pattern matcher over text.
///
/// ```
/// use seqmatch::{PatternMatcher, PatternMatches};
///
/// let mut matcher = PatternMatcher::new();
/// matcher.add_pattern("greeting", "hello there").unwrap();
/// matcher.compile().unwrap();
///
/// let mut matches = PatternMatches::without_suffixes();
/// matcher.find_patterns("well hello  there", &mut matches).unwrap();
/// assert_eq!(matches[0].key, "greeting");
/// assert_eq!(matches[0].end_pos, 2);
/// ```
#[derive(Debug)]
pub struct PatternMatcher<K> {
    config: MatcherConfig,
    automaton: AhoCorasickAutomaton<K, WordId>,
    arena: BufferArena<u8>,
    /// Registered pattern texts.
    patterns: SpanIndex<()>,
    words: SpanIndex<WordId>,
}

impl<K: Clone + Eq + Hash> Default for PatternMatcher<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash> PatternMatcher<K> {
    pub fn new() -> Self {
        Self::with_config(MatcherConfig::default())
    }

    pub fn with_config(config: MatcherConfig) -> Self {
        Self {
            config,
            automaton: AhoCorasickAutomaton::with_limits(config.limits),
            arena: BufferArena::with_block_size(config.arena_block_size),
            patterns: SpanIndex::new(),
            words: SpanIndex::new(),
        }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn automaton(&self) -> &AhoCorasickAutomaton<K, WordId> {
        &self.automaton
    }

    /// Register `pattern` under `key`.
    ///
    /// The same text cannot be registered twice, even under another key.
    /// Nothing is recorded unless the whole registration succeeds.
    pub fn add_pattern(&mut self, key: K, pattern: &str) -> Result<()> {
        self.automaton.check_open("add_pattern")?;
        let text = pattern.as_bytes();
        if self.patterns.contains(&self.arena, text) {
            return Err(SeqMatchError::DuplicatePattern);
        }
        if self.automaton.contains_key(&key) {
            return Err(SeqMatchError::DuplicateKey);
        }

        // Resolve word ids, handing out provisional ids to unseen words.
        let mut word_ids: SmallVec<[WordId; 32]> = SmallVec::new();
        let mut new_words: SmallVec<[(usize, usize, WordId); 8]> = SmallVec::new();
        for (offset, token) in tokens(text, self.config.token_mode) {
            let id = match self.words.get(&self.arena, token) {
                Some(&id) => id,
                None => match new_words
                    .iter()
                    .find(|(start, len, _)| &text[*start..*start + *len] == token)
                {
                    Some(&(_, _, id)) => id,
                    None => {
                        let id = self.next_word_id(new_words.len())?;
                        new_words.push((offset, token.len(), id));
                        id
                    }
                },
            };
            word_ids.push(id);
        }

        if word_ids.is_empty() {
            return Err(SeqMatchError::EmptyPattern);
        }

        // Copy first: a pattern the automaton rejects leaves only
        // unreferenced bytes in the arena, never an indexed word.
        let block = self.arena.alloc(text)?;
        let mut word_spans: SmallVec<[(Span, WordId); 8]> = SmallVec::new();
        for &(offset, len, id) in &new_words {
            let word = block.sub(offset, len).ok_or_else(|| {
                SeqMatchError::InternalInvariant("word span outside its pattern".to_string())
            })?;
            word_spans.push((word, id));
        }
        self.automaton.add_pattern(key, &word_ids)?;

        self.patterns.insert(&self.arena, block, ());
        for (word, id) in word_spans {
            self.words.insert(&self.arena, word, id);
        }
        trace!(
            "pattern of {} tokens registered, {} new words",
            word_ids.len(),
            new_words.len()
        );
        Ok(())
    }

    fn next_word_id(&self, pending: usize) -> Result<WordId> {
        let limit = self.config.max_words;
        // Ids start at 1; 0 is UNKNOWN_WORD.
        match u32::try_from(self.words.len() + pending + 1) {
            Ok(id) if id <= limit => Ok(id),
            _ => Err(SeqMatchError::CapacityExceeded {
                space: IndexSpace::Words,
                limit,
            }),
        }
    }

    /// Compile the automaton and compact its memory.
    pub fn compile(&mut self) -> Result<()> {
        self.automaton.compile()?;
        self.automaton.compact()?;
        self.patterns.compact(&self.arena);
        self.words.compact(&self.arena);
        debug!(
            "pattern matcher ready: {} patterns, {} words, {} arena bytes in {} blocks",
            self.automaton.num_patterns(),
            self.words.len(),
            self.arena.allocated_len(),
            self.arena.block_count()
        );
        Ok(())
    }

    /// Scan `text` and append its matches to `matches`.
    ///
    /// Positions count tokens (bytes in [`TokenMode::Bytes`]), starting at 0.
    /// Tokens that belong to no pattern reset the automaton to the root.
    pub fn find_patterns(&self, text: &str, matches: &mut PatternMatches<K>) -> Result<()> {
        self.automaton.check_compiled("find_patterns")?;
        let mut state = StateId::ROOT;
        for (pos, (_, token)) in tokens(text.as_bytes(), self.config.token_mode).enumerate() {
            let word = self
                .words
                .get(&self.arena, token)
                .copied()
                .unwrap_or(UNKNOWN_WORD);
            state = self.automaton.step(state, &word, matches, pos);
        }
        Ok(())
    }

    pub fn complete_with_suffix_matches(
        &self,
        src: &PatternMatches<K>,
        dst: &mut PatternMatches<K>,
    ) -> Result<()> {
        self.automaton.complete_with_suffix_matches(src, dst)
    }

    /// Number of tokens in the pattern registered under `key`.
    pub fn pattern_length(&self, key: &K) -> Result<usize> {
        self.automaton.pattern_length(key)
    }

    /// Every registered key with its length in tokens, in insertion order.
    pub fn pattern_lengths(&self) -> impl Iterator<Item = (&K, usize)> + '_ {
        self.automaton.pattern_lengths()
    }

    pub fn reserve(&mut self, num_patterns: usize) -> Result<()> {
        self.automaton.reserve(num_patterns)?;
        self.patterns.reserve(&self.arena, num_patterns);
        self.words.reserve(&self.arena, num_patterns);
        Ok(())
    }

    pub fn pattern_count(&self) -> usize {
        self.automaton.num_patterns()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Word id of `word`, if it appears in some pattern.
    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.words.get(&self.arena, word.as_bytes()).copied()
    }

    /// The registered pattern texts, in no particular order.
    pub fn pattern_texts(&self) -> impl Iterator<Item = View<'_, u8>> {
        self.patterns
            .iter()
            .map(move |(span, _)| self.arena.view(span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str, mode: TokenMode) -> Vec<(usize, &str)> {
        tokens(text.as_bytes(), mode)
            .map(|(offset, token)| (offset, std::str::from_utf8(token).unwrap()))
            .collect()
    }

    #[test]
    fn test_tokens_words() {
        let words = TokenMode::Words { delimiter: b' ' };
        assert_eq!(
            collect("  hello  world ", words),
            vec![(2, "hello"), (9, "world")]
        );
        assert!(collect("", words).is_empty());
        assert!(collect("   ", words).is_empty());
        assert_eq!(collect("a", words), vec![(0, "a")]);
    }

    #[test]
    fn test_tokens_custom_delimiter() {
        let csv = TokenMode::Words { delimiter: b',' };
        assert_eq!(collect("a,,b c", csv), vec![(0, "a"), (3, "b c")]);
    }

    #[test]
    fn test_tokens_bytes() {
        assert_eq!(
            collect("ab c", TokenMode::Bytes),
            vec![(0, "a"), (1, "b"), (2, " "), (3, "c")]
        );
    }

    #[test]
    fn test_hello_world_scenario() {
        let mut matcher = PatternMatcher::new();
        for (key, pattern) in ["hello", "world", "hello world"].iter().enumerate() {
            matcher.add_pattern(key as u8, pattern).unwrap();
        }
        matcher.compile().unwrap();

        assert_eq!(
            matcher.add_pattern(15, "wow"),
            Err(SeqMatchError::AlreadyCompiled {
                operation: "add_pattern"
            })
        );

        let mut plain = PatternMatches::without_suffixes();
        matcher.find_patterns("hello world string", &mut plain).unwrap();
        let got: Vec<_> = plain.iter().map(|m| (m.key, m.end_pos)).collect();
        assert_eq!(got, vec![(0, 0), (2, 1)]);

        let mut expanded = PatternMatches::with_suffixes();
        matcher
            .find_patterns("hello world string", &mut expanded)
            .unwrap();
        let got: Vec<_> = expanded.iter().map(|m| (m.key, m.end_pos)).collect();
        assert_eq!(got, vec![(0, 0), (2, 1), (1, 1)]);

        let mut completed = PatternMatches::with_suffixes();
        matcher
            .complete_with_suffix_matches(&plain, &mut completed)
            .unwrap();
        assert_eq!(completed, expanded);

        completed.clear();
        assert!(completed.is_empty());
        assert!(completed.include_suffixes());
    }

    #[test]
    fn test_words_are_shared_between_patterns() {
        let mut matcher = PatternMatcher::new();
        matcher.add_pattern(1, "a b a").unwrap();
        matcher.add_pattern(2, "b c").unwrap();

        assert_eq!(matcher.word_count(), 3);
        assert_eq!(matcher.word_id("a"), Some(1));
        assert_eq!(matcher.word_id("b"), Some(2));
        assert_eq!(matcher.word_id("c"), Some(3));
        assert_eq!(matcher.word_id("d"), None);
        assert_eq!(matcher.pattern_length(&1), Ok(3));
        assert_eq!(matcher.pattern_length(&2), Ok(2));
        assert_eq!(matcher.pattern_length(&3), Err(SeqMatchError::UnknownKey));
    }

    #[test]
    fn test_duplicate_text_and_key() {
        let mut matcher = PatternMatcher::new();
        matcher.add_pattern(1, "x y").unwrap();

        assert_eq!(
            matcher.add_pattern(2, "x y"),
            Err(SeqMatchError::DuplicatePattern)
        );
        assert_eq!(
            matcher.add_pattern(1, "z"),
            Err(SeqMatchError::DuplicateKey)
        );
        // Same tokens, different spacing: a different text but the same
        // symbol sequence, rejected by the automaton.
        assert_eq!(
            matcher.add_pattern(3, "x  y"),
            Err(SeqMatchError::DuplicatePattern)
        );
        assert_eq!(matcher.pattern_count(), 1);
        assert_eq!(matcher.word_count(), 2);
        assert_eq!(matcher.pattern_texts().count(), 1);
    }

    #[test]
    fn test_failed_add_does_not_register_words() {
        let mut matcher = PatternMatcher::new();
        matcher.add_pattern(1, "known").unwrap();

        assert_eq!(
            matcher.add_pattern(1, "brand new words"),
            Err(SeqMatchError::DuplicateKey)
        );
        assert_eq!(matcher.add_pattern(2, "   "), Err(SeqMatchError::EmptyPattern));
        assert_eq!(matcher.word_count(), 1);
        assert_eq!(matcher.word_id("brand"), None);
    }

    #[test]
    fn test_word_limit() {
        let config = MatcherConfig::default().with_max_words(2);
        let mut matcher = PatternMatcher::with_config(config);
        matcher.add_pattern(1, "a b").unwrap();
        assert_eq!(
            matcher.add_pattern(2, "a c"),
            Err(SeqMatchError::CapacityExceeded {
                space: IndexSpace::Words,
                limit: 2
            })
        );
        matcher.add_pattern(3, "b a").unwrap();
    }

    #[test]
    fn test_byte_mode() {
        let config = MatcherConfig::default().with_token_mode(TokenMode::Bytes);
        let mut matcher = PatternMatcher::with_config(config);
        matcher.add_pattern("he", "he").unwrap();
        matcher.add_pattern("she", "she").unwrap();
        matcher.add_pattern("his", "his").unwrap();
        matcher.add_pattern("hers", "hers").unwrap();
        matcher.compile().unwrap();

        let mut matches = PatternMatches::with_suffixes();
        matcher.find_patterns("ushers", &mut matches).unwrap();
        let got: Vec<_> = matches.iter().map(|m| (m.key, m.end_pos)).collect();
        assert_eq!(got, vec![("she", 3), ("he", 3), ("hers", 5)]);
    }

    #[test]
    fn test_find_before_compile() {
        let mut matcher: PatternMatcher<u32> = PatternMatcher::new();
        matcher.add_pattern(1, "a").unwrap();
        let mut matches = PatternMatches::with_suffixes();
        assert_eq!(
            matcher.find_patterns("a", &mut matches),
            Err(SeqMatchError::NotCompiled {
                operation: "find_patterns"
            })
        );
    }

    #[test]
    fn test_reserve_after_compile() {
        let mut matcher: PatternMatcher<u32> = PatternMatcher::new();
        matcher.reserve(100).unwrap();
        matcher.compile().unwrap();
        assert!(matches!(
            matcher.reserve(10),
            Err(SeqMatchError::AlreadyCompiled { .. })
        ));
    }

    #[test]
    fn test_small_arena_blocks() {
        let config = MatcherConfig::default().with_arena_block_size(8);
        let mut matcher = PatternMatcher::with_config(config);
        let texts = ["alpha beta", "gamma", "beta gamma delta", "epsilon"];
        for (key, text) in texts.iter().enumerate() {
            matcher.add_pattern(key, text).unwrap();
        }
        matcher.compile().unwrap();

        let mut stored: Vec<_> = matcher
            .pattern_texts()
            .map(|view| String::from_utf8(view.to_vec()).unwrap())
            .collect();
        stored.sort();
        assert_eq!(
            stored,
            vec!["alpha beta", "beta gamma delta", "epsilon", "gamma"]
        );

        let mut matches = PatternMatches::without_suffixes();
        matcher
            .find_patterns("x beta gamma delta epsilon", &mut matches)
            .unwrap();
        let got: Vec<_> = matches.iter().map(|m| (m.key, m.end_pos)).collect();
        assert_eq!(got, vec![(1, 2), (2, 3), (3, 4)]);
    }

    #[test]
    fn test_failed_allocation_registers_nothing() {
        let config = MatcherConfig::default().with_arena_block_size(usize::MAX / 2);
        let mut matcher = PatternMatcher::with_config(config);

        assert_eq!(
            matcher.add_pattern(1, "p"),
            Err(SeqMatchError::AllocationFailed { requested: 1 })
        );
        assert!(!matcher.automaton().contains_key(&1));
        assert_eq!(matcher.automaton().num_states(), 1);
        assert_eq!(matcher.pattern_count(), 0);
        assert_eq!(matcher.word_count(), 0);

        // A different text must fail the same way, not collide with "p".
        assert_eq!(
            matcher.add_pattern(2, "q"),
            Err(SeqMatchError::AllocationFailed { requested: 1 })
        );
        assert_eq!(matcher.pattern_count(), 0);
    }

    #[test]
    fn test_rejected_pattern_does_not_consume_word_ids() {
        let mut matcher = PatternMatcher::new();
        matcher.add_pattern(1, "x y").unwrap();
        // Rejected by the automaton after its text was copied.
        assert_eq!(
            matcher.add_pattern(2, "x  y"),
            Err(SeqMatchError::DuplicatePattern)
        );
        assert_eq!(
            matcher.add_pattern(3, "x y").unwrap_err(),
            SeqMatchError::DuplicatePattern
        );
        assert_eq!(matcher.add_pattern(4, "   "), Err(SeqMatchError::EmptyPattern));

        matcher.add_pattern(5, "z x").unwrap();
        assert_eq!(matcher.word_id("z"), Some(3));
        assert_eq!(matcher.pattern_texts().count(), 2);

        matcher.compile().unwrap();
        let mut matches = PatternMatches::with_suffixes();
        matcher.find_patterns("x y z x", &mut matches).unwrap();
        let got: Vec<_> = matches.iter().map(|m| (m.key, m.end_pos)).collect();
        assert_eq!(got, vec![(1, 1), (5, 3)]);
    }

    #[test]
    fn test_poisoned_matcher() {
        let mut matcher = PatternMatcher::new();
        matcher.add_pattern(1, "a b").unwrap();
        matcher.automaton.nodes[0].goto = None;

        assert!(matches!(
            matcher.compile(),
            Err(SeqMatchError::InternalInvariant(_))
        ));
        let mut matches = PatternMatches::with_suffixes();
        assert_eq!(
            matcher.find_patterns("a b", &mut matches),
            Err(SeqMatchError::Poisoned)
        );
        assert_eq!(matcher.add_pattern(2, "c"), Err(SeqMatchError::Poisoned));
        assert_eq!(matcher.word_count(), 2);
    }

    #[test]
    fn test_pattern_lengths() {
        let mut matcher = PatternMatcher::new();
        matcher.add_pattern("long", "a b c d").unwrap();
        matcher.add_pattern("short", "b").unwrap();
        matcher.add_pattern("mid", " c  d ").unwrap();

        let lengths: Vec<_> = matcher
            .pattern_lengths()
            .map(|(key, len)| (*key, len))
            .collect();
        assert_eq!(lengths, vec![("long", 4), ("short", 1), ("mid", 2)]);
    }
}
