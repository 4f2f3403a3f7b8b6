//! Fuzzy search index.
//!
//! Each entry is the normalized composite key of one record. A query matches
//! an entry when every query token either appears in the key as a substring
//! or is within a small edit distance of one of the key's words (or of the
//! beginning of a word, so partially typed words still match).

use crate::normalizer::{normalize, tokenize};
use sill_core::SearchConfig;

#[derive(Debug, Clone)]
struct IndexedEntry {
    key: String,
    words: Vec<Vec<char>>,
}

/// Searchable keys, kept in input order
#[derive(Debug, Clone)]
pub struct SearchIndex {
    entries: Vec<IndexedEntry>,
    config: SearchConfig,
}

impl SearchIndex {
    /// Build an index over raw composite keys
    pub fn build<I, S>(keys: I, config: &SearchConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries: Vec<IndexedEntry> = keys
            .into_iter()
            .map(|raw| {
                let key = normalize(raw.as_ref());
                let words = key.split(' ').map(|w| w.chars().collect()).collect();
                IndexedEntry { key, words }
            })
            .collect();

        tracing::debug!(entries = entries.len(), "search index built");
        Self {
            entries,
            config: config.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Positions of the matching entries, ascending
    ///
    /// A blank query matches every entry.
    pub fn search(&self, query: &str) -> Vec<usize> {
        let tokens: Vec<Vec<char>> = tokenize(query)
            .into_iter()
            .map(|t| t.chars().collect())
            .collect();

        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| tokens.iter().all(|token| self.token_matches(token, entry)))
            .map(|(position, _)| position)
            .collect()
    }

    fn token_matches(&self, token: &[char], entry: &IndexedEntry) -> bool {
        let token_str: String = token.iter().collect();
        if entry.key.contains(&token_str) {
            return true;
        }
        if token.len() < self.config.min_fuzzy_token_len {
            return false;
        }

        let max = self.config.max_edit_distance;
        entry.words.iter().any(|word| {
            if levenshtein(token, word) <= max {
                return true;
            }
            // Partially typed word: compare against a prefix of the same length
            word.len() > token.len() && levenshtein(token, &word[..token.len()]) <= max
        })
    }
}

/// Edit distance between two char sequences
pub fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
