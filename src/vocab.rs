//! Character Vocabulary and Corpus Preprocessing
//!
//! Language models never see raw text — they see symbol indices. This module
//! turns a raw corpus into exactly the pair the rest of the crate consumes:
//!
//! 1. A [`Vocabulary`]: the sorted, deduplicated characters of the corpus
//!    with a bijective character ↔ index mapping.
//! 2. An index sequence: the corpus re-expressed as vocabulary indices, every
//!    one of them guaranteed to lie in `[0, vocab_size)`.
//!
//! ## Filtering
//!
//! Control characters are dropped during preprocessing, with one exception:
//! `'\n'` survives. The corpus is line-structured and the newline doubles as
//! the generation terminator, so stripping it would leave nothing for
//! [`generate`](crate::sampler::generate) to stop on.
//!
//! ## Example
//!
//! ```rust
//! use puck::vocab::preprocess;
//!
//! let (vocab, indices) = preprocess("abba");
//! assert_eq!(vocab.len(), 2);
//! assert_eq!(indices, vec![0, 1, 1, 0]);
//! ```

use std::collections::{BTreeSet, HashMap};

/// An ordered, deduplicated set of characters with index mappings.
///
/// Index assignment follows sort order, so the same corpus always produces
/// the same vocabulary regardless of character order of appearance.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    chars: Vec<char>,
    index: HashMap<char, usize>,
}

impl Vocabulary {
    /// Build a vocabulary from an already sorted, deduplicated character list.
    fn from_sorted_chars(chars: Vec<char>) -> Self {
        let index = chars.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        Self { chars, index }
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// True when the vocabulary holds no symbols.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Look up the index of a character, if it is in the vocabulary.
    pub fn char_to_index(&self, c: char) -> Option<usize> {
        self.index.get(&c).copied()
    }

    /// Look up the character at an index, if the index is in range.
    pub fn index_to_char(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// The symbols in index order.
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// A short printable preview of the vocabulary for progress output.
    pub fn preview(&self, max_chars: usize) -> String {
        let head: String = self.chars.iter().take(max_chars).collect();
        if self.chars.len() > max_chars {
            format!("{:?}...", head)
        } else {
            format!("{:?}", head)
        }
    }
}

/// Characters that survive preprocessing: everything except control
/// characters, plus the newline (the generation terminator).
fn keep(c: char) -> bool {
    c == '\n' || !c.is_control()
}

/// Turn raw text into a vocabulary and an index sequence.
///
/// Filters control characters (keeping `'\n'`), derives the sorted-unique
/// vocabulary from what remains, and re-expresses the filtered text as
/// vocabulary indices. Every returned index is a valid vocabulary index.
pub fn preprocess(text: &str) -> (Vocabulary, Vec<usize>) {
    let filtered: Vec<char> = text.chars().filter(|&c| keep(c)).collect();

    let unique: BTreeSet<char> = filtered.iter().copied().collect();
    let vocab = Vocabulary::from_sorted_chars(unique.into_iter().collect());

    let indices = filtered
        .iter()
        .filter_map(|&c| vocab.char_to_index(c))
        .collect();

    (vocab, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_is_sorted_and_unique() {
        let (vocab, _) = preprocess("cbacba");
        assert_eq!(vocab.chars(), &['a', 'b', 'c']);
    }

    #[test]
    fn test_bijective_mapping() {
        let (vocab, _) = preprocess("hello world");
        for (i, &c) in vocab.chars().iter().enumerate() {
            assert_eq!(vocab.char_to_index(c), Some(i));
            assert_eq!(vocab.index_to_char(i), Some(c));
        }
        assert_eq!(vocab.char_to_index('z'), None);
        assert_eq!(vocab.index_to_char(vocab.len()), None);
    }

    #[test]
    fn test_indices_in_range() {
        let (vocab, indices) = preprocess("the quick brown fox\njumps over the lazy dog");
        assert!(!indices.is_empty());
        assert!(indices.iter().all(|&i| i < vocab.len()));
    }

    #[test]
    fn test_control_chars_filtered_newline_kept() {
        let (vocab, indices) = preprocess("a\tb\r\nc\u{0000}");
        // Tab, carriage return, and NUL are gone; newline stays.
        assert_eq!(vocab.chars(), &['\n', 'a', 'b', 'c']);
        assert_eq!(indices.len(), 4);
        assert!(vocab.char_to_index('\t').is_none());
    }

    #[test]
    fn test_empty_text() {
        let (vocab, indices) = preprocess("");
        assert!(vocab.is_empty());
        assert!(indices.is_empty());
    }

    #[test]
    fn test_preview_truncates() {
        let (vocab, _) = preprocess("abcdef");
        assert_eq!(vocab.preview(3), "\"abc\"...");
        assert_eq!(vocab.preview(10), "\"abcdef\"");
    }
}
