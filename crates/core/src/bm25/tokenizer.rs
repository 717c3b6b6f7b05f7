//! Simple tokenizer with stop word removal.
//!
//! Tokenizes text by lowercasing, splitting on non-alphanumeric characters,
//! and removing common English and French stop words. Single-character tokens
//! are also discarded. Uses a zero-per-token allocation design via byte spans.

use std::collections::HashSet;
use std::sync::LazyLock;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
        "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
        "they", "this", "to", "was", "will", "with",
        // French common stop words
        "le", "la", "les", "un", "une", "des", "de", "du", "et", "ou", "en", "au", "aux", "ce",
        "ces", "pour", "par", "sur", "dans", "avec", "est", "sont", "qui", "que", "ne", "pas",
        "se", "sa", "son", "ses", "il", "elle", "je", "tu", "nous", "vous",
    ]
    .into_iter()
    .collect()
});

/// Tokenized text: owns the lowercased buffer, provides &str slices via byte spans.
/// Only 1 heap allocation (the lowercased String) instead of N per-token Strings.
pub struct Tokens {
    buffer: String,
    spans: Vec<(u32, u32)>, // (start, end) byte offsets into buffer
}

impl Tokens {
    /// Returns an iterator over the token `&str` slices.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.spans
            .iter()
            .map(|&(s, e)| &self.buffer[s as usize..e as usize])
    }

    /// Returns the number of tokens.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Returns `true` if there are no tokens.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

fn keep(token: &str) -> bool {
    token.chars().count() > 1 && !STOP_WORDS.contains(token)
}

/// Tokenize text: lowercase, split on non-alphanumeric, remove stop words.
pub fn tokenize(text: &str) -> Tokens {
    let buffer = text.to_lowercase();
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in buffer.char_indices() {
        if c.is_alphanumeric() {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start {
            if keep(&buffer[s..i]) {
                spans.push((s as u32, i as u32));
            }
            start = None;
        }
    }
    // Last token (no trailing separator)
    if let Some(s) = start {
        if keep(&buffer[s..]) {
            spans.push((s as u32, buffer.len() as u32));
        }
    }

    Tokens { buffer, spans }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("The quick brown fox jumps over the lazy dog");
        let words: Vec<&str> = tokens.iter().collect();
        assert!(!words.contains(&"the"));
        assert!(words.contains(&"quick"));
        assert!(words.contains(&"fox"));
    }

    #[test]
    fn test_tokenize_french_accents() {
        let tokens = tokenize("Curl biceps avec haltères, pour les débutants.");
        let words: Vec<&str> = tokens.iter().collect();
        assert_eq!(words, vec!["curl", "biceps", "haltères", "débutants"]);
    }

    #[test]
    fn test_single_char_tokens_dropped() {
        let tokens = tokenize("a b c squat");
        assert_eq!(tokens.len(), 1);
        assert!(!tokens.is_empty());
    }
}
