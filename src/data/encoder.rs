// ============================================================
// Layer 4 — Sequence Encoder
// ============================================================
// Turns a normalised message into a fixed-length id sequence.
//
// Policy:
//   - Out-of-vocabulary tokens are dropped (there is no UNK id)
//   - Too long  → truncate from the LEFT, keep the last L ids
//   - Too short → pad on the LEFT with PAD_ID (0)
//
// Example with L = 5, vocab {<ticker>=1, today=2, up=3}:
//   "<ticker> up today"            → [0, 0, 1, 3, 2]
//   "up up up up <ticker> today"   → [3, 3, 3, 1, 2]
//   "unknown words only"           → [0, 0, 0, 0, 0]

use crate::data::vocabulary::{Vocabulary, PAD_ID};

pub struct SequenceEncoder<'a> {
    vocab:   &'a Vocabulary,
    max_len: usize,
}

impl<'a> SequenceEncoder<'a> {
    pub fn new(vocab: &'a Vocabulary, max_len: usize) -> Self {
        Self { vocab, max_len }
    }

    /// In-vocabulary ids of `text`, no padding or truncation.
    pub fn ids(&self, text: &str) -> Vec<u32> {
        text.split_whitespace()
            .filter_map(|t| self.vocab.index_of(t))
            .collect()
    }

    /// Exactly `max_len` ids: left-truncated or left-padded.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        let ids = self.ids(text);

        if ids.len() >= self.max_len {
            return ids[ids.len() - self.max_len..].to_vec();
        }

        let mut out = vec![PAD_ID; self.max_len - ids.len()];
        out.extend_from_slice(&ids);
        out
    }

    /// Map ids back to tokens, skipping padding.
    pub fn decode(&self, ids: &[u32]) -> String {
        ids.iter()
            .filter_map(|&id| self.vocab.token_of(id))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
