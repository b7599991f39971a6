// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to these traits rather than to
// the concrete CSV loader or burn-backed inferencer.
//
//   - CsvCorpusLoader implements CorpusSource
//   - Inferencer      implements SentimentPredictor

use anyhow::Result;

use crate::domain::corpus::Corpus;
use crate::domain::sentiment::Sentiment;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can produce a labelled message corpus.
pub trait CorpusSource {
    /// Load every (message, sentiment) pair from this source.
    fn load_all(&self) -> Result<Corpus>;
}

// ─── SentimentPredictor ───────────────────────────────────────────────────────
/// Any component that can classify a single raw message.
pub trait SentimentPredictor {
    /// Returns the predicted label and the per-class probabilities,
    /// indexed by [`Sentiment::class_index`].
    fn predict(&self, message: &str) -> Result<(Sentiment, [f32; 2])>;
}
