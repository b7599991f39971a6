// ============================================================
// Layer 4 — Sentiment Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec of encoded
// samples into tensors.
//
// How batching works here:
//   Input:  Vec of N samples, each with L ids (pre-padded)
//   Output: SentimentBatch with
//             input_ids [N, L]   Int
//             targets   [N, 2]   Float, one-hot
//             labels    [N]      Int, class index
//
//   All ids are flattened into one Vec then reshaped:
//   [s1_t1, ..., s1_tL, s2_t1, ..., sN_tL] → [N, L]
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::SentimentSample;
use crate::domain::sentiment::NUM_CLASSES;

/// A batch of samples ready for the model forward pass.
/// All tensors have batch_size as their first dimension.
#[derive(Debug, Clone)]
pub struct SentimentBatch<B: Backend> {
    /// Token id sequences — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// One-hot labels — shape: [batch_size, 2]
    pub targets: Tensor<B, 2>,

    /// Class indices — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

/// Holds the target device so tensors are created on the
/// correct GPU/CPU.
#[derive(Clone, Debug)]
pub struct SentimentBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SentimentBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<B, SentimentSample, SentimentBatch<B>> for SentimentBatcher<B> {
    fn batch(&self, items: Vec<SentimentSample>, _device: &B::Device) -> SentimentBatch<B> {
        let batch_size = items.len();
        // All sequences have the same length (pre-padded)
        let seq_len    = items[0].input_ids.len();

        // ── Flatten input_ids ─────────────────────────────────────────────────
        // Vec<Vec<u32>> → Vec<i32> (Burn uses i32 for Int tensors)
        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();

        // ── One-hot targets and class indices ─────────────────────────────────
        let targets_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.label.one_hot())
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|s| s.label.class_index() as i32)
            .collect();

        let input_ids = Tensor::<B, 1, Int>::from_ints(
            input_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let targets = Tensor::<B, 1>::from_floats(
            targets_flat.as_slice(), &self.device
        ).reshape([batch_size, NUM_CLASSES]);

        let labels = Tensor::<B, 1, Int>::from_ints(
            labels.as_slice(), &self.device
        );

        SentimentBatch { input_ids, targets, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sentiment::Sentiment;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_batch_shapes_and_one_hot() {
        let batcher = SentimentBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![
            SentimentSample::new(vec![0, 0, 1, 3, 2], Sentiment::Bullish),
            SentimentSample::new(vec![0, 0, 1, 4, 2], Sentiment::Bearish),
        ], &batcher.device);

        assert_eq!(batch.input_ids.dims(), [2, 5]);
        assert_eq!(batch.targets.dims(), [2, 2]);
        assert_eq!(batch.labels.dims(), [2]);

        let targets: Vec<f32> = batch.targets.into_data().to_vec().unwrap();
        assert_eq!(targets, vec![0.0, 1.0, 1.0, 0.0]);

        let ids: Vec<i64> = batch
            .input_ids
            .into_data()
            .convert::<i64>()
            .to_vec()
            .unwrap();
        assert_eq!(ids, vec![0, 0, 1, 3, 2, 0, 0, 1, 4, 2]);
    }
}
