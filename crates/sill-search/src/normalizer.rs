//! Text normalization for catalog search.
//!
//! Normalizes record keys and user queries the same way so they can be
//! compared word by word:
//! - Lowercase conversion
//! - Accent folding (French diacritics and ligatures)
//! - Punctuation turned into word separators
//! - Whitespace normalization

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    /// Accented characters and their ASCII base
    static ref ACCENTS: HashMap<char, &'static str> = {
        let mut m = HashMap::new();
        for c in ['à', 'â', 'ä', 'á', 'ã'] {
            m.insert(c, "a");
        }
        for c in ['é', 'è', 'ê', 'ë'] {
            m.insert(c, "e");
        }
        for c in ['î', 'ï', 'í', 'ì'] {
            m.insert(c, "i");
        }
        for c in ['ô', 'ö', 'ó', 'ò', 'õ'] {
            m.insert(c, "o");
        }
        for c in ['ù', 'û', 'ü', 'ú'] {
            m.insert(c, "u");
        }
        m.insert('ç', "c");
        m.insert('ñ', "n");
        m.insert('ÿ', "y");
        m.insert('œ', "oe");
        m.insert('æ', "ae");
        m
    };

    /// Anything that is not a letter or a digit separates words
    static ref SEPARATORS: Regex = Regex::new(r"[^\p{L}\p{N}]+").unwrap();

    /// Multiple whitespace pattern
    static ref MULTI_SPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalize text for matching
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();

    let mut folded = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        match ACCENTS.get(&c) {
            Some(base) => folded.push_str(base),
            None => folded.push(c),
        }
    }

    let spaced = SEPARATORS.replace_all(&folded, " ");
    MULTI_SPACE.replace_all(spaced.trim(), " ").to_string()
}

/// Normalized words of a text
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a query contains nothing to search for
pub fn is_blank(query: &str) -> bool {
    normalize(query).is_empty()
}
