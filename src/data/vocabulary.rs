// ============================================================
// Layer 4 — Vocabulary Builder
// ============================================================
// Assigns every distinct normalised token a positive integer.
//
// Ordering rule:
//   1. Higher corpus frequency first
//   2. Ties broken by first appearance in the corpus
//
// Indices start at 1. Index 0 is the padding id and is never
// handed to a real token, which is why the embedding matrix has
// `len() + 1` rows.
//
// Example:
//   ["<ticker> up today", "<ticker> down today"]
//   counts: <ticker>=2, today=2, up=1, down=1
//   → <ticker>=1, today=2, up=3, down=4

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Padding id. Never assigned to a token.
pub const PAD_ID: u32 = 0;

/// Serialised as the plain ordered token list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    /// tokens[i] has index i + 1
    tokens: Vec<String>,
    index:  HashMap<String, u32>,
}

impl Vocabulary {
    /// Build from already-normalised texts. `max_words` keeps only the
    /// most frequent tokens when set.
    pub fn build<S: AsRef<str>>(texts: &[S], max_words: Option<usize>) -> Self {
        // token → (count, first-seen position)
        let mut stats: HashMap<&str, (usize, usize)> = HashMap::new();
        let mut seen = 0usize;

        for text in texts {
            for token in text.as_ref().split_whitespace() {
                let entry = stats.entry(token).or_insert_with(|| {
                    seen += 1;
                    (0, seen)
                });
                entry.0 += 1;
            }
        }

        let mut ranked: Vec<(&str, (usize, usize))> = stats.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

        if let Some(max) = max_words {
            ranked.truncate(max);
        }

        let tokens: Vec<String> = ranked.into_iter().map(|(t, _)| t.to_string()).collect();
        tracing::debug!("Vocabulary built with {} tokens", tokens.len());
        Self::from_tokens(tokens)
    }

    /// Rebuild from an ordered token list (index = position + 1).
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as u32 + 1))
            .collect();
        Self { tokens, index }
    }

    pub fn index_of(&self, token: &str) -> Option<u32> {
        self.index.get(token).copied()
    }

    pub fn token_of(&self, id: u32) -> Option<&str> {
        if id == PAD_ID {
            return None;
        }
        self.tokens.get(id as usize - 1).map(String::as_str)
    }

    /// Number of real tokens (padding excluded).
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Rows needed in an embedding table: one per token plus padding.
    pub fn embedding_rows(&self) -> usize {
        self.tokens.len() + 1
    }

    /// (token, index) pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i as u32 + 1))
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(tokens: Vec<String>) -> Self {
        Self::from_tokens(tokens)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_frequency_then_first_seen_order() {
        let texts = ["<ticker> up today", "<ticker> down today"];
        let vocab = Vocabulary::build(&texts, None);
        assert_eq!(vocab.len(), 4);
        assert_eq!(vocab.index_of("<ticker>"), Some(1));
        assert_eq!(vocab.index_of("today"), Some(2));
        assert_eq!(vocab.index_of("up"), Some(3));
        assert_eq!(vocab.index_of("down"), Some(4));
    }

    #[test]
    fn test_len_matches_distinct_tokens_and_zero_unused() {
        let texts = ["a b c a", "c d e", "f a"];
        let vocab = Vocabulary::build(&texts, None);

        let distinct: HashSet<&str> = texts.iter().flat_map(|t| t.split_whitespace()).collect();
        assert_eq!(vocab.len(), distinct.len());
        assert!(vocab.iter().all(|(_, id)| id != PAD_ID));
        assert_eq!(vocab.embedding_rows(), distinct.len() + 1);
    }

    #[test]
    fn test_build_is_deterministic() {
        let texts = ["x y z", "z y", "w x", "q"];
        let a = Vocabulary::build(&texts, None);
        let b = Vocabulary::build(&texts, None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_max_words_keeps_most_frequent() {
        let texts = ["rare common common", "common other other"];
        let vocab = Vocabulary::build(&texts, Some(2));
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.index_of("common"), Some(1));
        assert_eq!(vocab.index_of("other"), Some(2));
        assert_eq!(vocab.index_of("rare"), None);
    }

    #[test]
    fn test_token_of_round_trips() {
        let vocab = Vocabulary::build(&["alpha beta"], None);
        assert_eq!(vocab.token_of(PAD_ID), None);
        for (token, id) in vocab.iter() {
            assert_eq!(vocab.token_of(id), Some(token));
        }
        assert_eq!(vocab.token_of(99), None);
    }

    #[test]
    fn test_serializes_as_token_list() {
        let vocab = Vocabulary::build(&["alpha beta beta"], None);
        let json  = serde_json::to_string(&vocab).unwrap();
        assert_eq!(json, r#"["beta","alpha"]"#);

        let back: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vocab);
        assert_eq!(back.index_of("beta"), Some(1));
    }
}
