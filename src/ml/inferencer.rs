// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds the trained CNN from the checkpoint directory and
// classifies single messages:
//
//   raw text → normalise → encode (left pad / truncate) → [1, L]
//            → model → softmax → (Sentiment, [p_bearish, p_bullish])
//
// Inference always runs on the CPU NdArray backend, whatever
// backend the model was trained on.
use anyhow::{anyhow, Result};
use burn::{backend::NdArray, prelude::*};

use crate::data::{
    encoder::SequenceEncoder,
    preprocessor::Preprocessor,
    vocabulary::{Vocabulary, PAD_ID},
};
use crate::domain::{
    sentiment::{Sentiment, NUM_CLASSES},
    traits::SentimentPredictor,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::SentimentCnn;

type InferBackend = NdArray<f32>;

pub struct Inferencer {
    model:        SentimentCnn<InferBackend>,
    vocab:        Vocabulary,
    preprocessor: Preprocessor,
    max_seq_len:  usize,
    device:       burn::backend::ndarray::NdArrayDevice,
}

impl Inferencer {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, vocab: Vocabulary) -> Result<Self> {
        let device = burn::backend::ndarray::NdArrayDevice::default();
        let cfg    = ckpt_manager.load_config()?;

        let mut model_cfg = cfg.model_config(vocab.embedding_rows());
        model_cfg.dropout = 0.0;

        let model: SentimentCnn<InferBackend> = model_cfg.init(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!(
            "Model loaded from checkpoint ({} vocabulary tokens, max_seq_len={})",
            vocab.len(),
            cfg.max_seq_len,
        );

        Ok(Self {
            model,
            vocab,
            preprocessor: Preprocessor::new(),
            max_seq_len:  cfg.max_seq_len,
            device,
        })
    }

    /// The fixed-length id sequence the model sees for `message`.
    pub fn encode(&self, message: &str) -> Vec<u32> {
        let normalized = self.preprocessor.normalize(message);
        SequenceEncoder::new(&self.vocab, self.max_seq_len).encode(&normalized)
    }
}

impl SentimentPredictor for Inferencer {
    fn predict(&self, message: &str) -> Result<(Sentiment, [f32; 2])> {
        let input_ids = self.encode(message);
        if input_ids.iter().all(|&id| id == PAD_ID) {
            tracing::warn!("Message has no known tokens; predicting from padding only");
        }

        let flat: Vec<i32> = input_ids.iter().map(|&id| id as i32).collect();
        let input = Tensor::<InferBackend, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([1, self.max_seq_len]);

        let probs: Vec<f32> = self
            .model
            .forward_classification(input)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read model output: {e:?}"))?;

        let probs: [f32; NUM_CLASSES] = probs
            .try_into()
            .map_err(|v: Vec<f32>| anyhow!("Expected {NUM_CLASSES} probabilities, got {}", v.len()))?;

        // Ties go to the lower class index (bearish)
        let best_idx = (1..NUM_CLASSES).fold(0, |best, i| if probs[i] > probs[best] { i } else { best });
        let best = Sentiment::from_class_index(best_idx)
            .ok_or_else(|| anyhow!("No sentiment for class index {best_idx}"))?;

        tracing::debug!("'{}' → {} {:?}", message, best, probs);
        Ok((best, probs))
    }
}
