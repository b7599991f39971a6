// ============================================================
// Layer 3 — Corpus Domain Type
// ============================================================
// Messages and labels kept as two parallel vectors. Every
// cleaning step removes entries from both at the same index,
// so `messages[i]` is always labelled by `labels[i]`.

use crate::domain::sentiment::Sentiment;

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub messages: Vec<String>,
    pub labels:   Vec<Sentiment>,
}

impl Corpus {
    /// # Panics
    /// Panics if the two vectors differ in length.
    pub fn new(messages: Vec<String>, labels: Vec<Sentiment>) -> Self {
        assert_eq!(
            messages.len(),
            labels.len(),
            "messages ({}) and labels ({}) must be aligned",
            messages.len(),
            labels.len()
        );
        Self { messages, labels }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Count of (bearish, bullish) labels.
    pub fn label_counts(&self) -> (usize, usize) {
        let bullish = self.labels.iter().filter(|&&l| l == Sentiment::Bullish).count();
        (self.labels.len() - bullish, bullish)
    }
}
