// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Loads the artifacts written by `train` and classifies one
// message:
//   1. vocab.json         → Vocabulary
//   2. train_config.json  → architecture + max_seq_len
//   3. latest checkpoint  → weights
//   4. Inferencer::predict

use anyhow::Result;

use crate::domain::{sentiment::Sentiment, traits::SentimentPredictor};
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::inferencer::Inferencer;

/// Outcome of classifying one message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub sentiment:     Sentiment,
    pub probabilities: [f32; 2],
}

impl Prediction {
    /// Probability of the predicted class.
    pub fn confidence(&self) -> f32 {
        self.probabilities[self.sentiment.class_index()]
    }
}

pub struct PredictUseCase {
    predictor: Box<dyn SentimentPredictor>,
}

impl PredictUseCase {
    pub fn new(checkpoint_dir: &str) -> Result<Self> {
        let vocab      = VocabStore::new(checkpoint_dir).load()?;
        let ckpt       = CheckpointManager::new(checkpoint_dir);
        let inferencer = Inferencer::from_checkpoint(&ckpt, vocab)?;
        Ok(Self::with_predictor(Box::new(inferencer)))
    }

    pub fn with_predictor(predictor: Box<dyn SentimentPredictor>) -> Self {
        Self { predictor }
    }

    pub fn predict(&self, message: &str) -> Result<Prediction> {
        let (sentiment, probabilities) = self.predictor.predict(message)?;
        Ok(Prediction { sentiment, probabilities })
    }
}
