use anyhow::{bail, Result};
use burn::{
    module::Param,
    nn::{
        conv::{Conv1d, Conv1dConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
        PaddingConfig1d,
    },
    prelude::*,
    tensor::activation,
};

use crate::data::embeddings::EmbeddingMatrix;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct SentimentCnnConfig {
    /// Embedding rows: vocabulary size + 1 (padding row)
    pub num_embeddings:    usize,
    pub embedding_dim:     usize,
    /// One convolution branch per kernel width
    pub kernel_sizes:      Vec<usize>,
    /// Filters per branch
    pub num_filters:       usize,
    pub hidden_size:       usize,
    pub num_classes:       usize,
    pub dropout:           f64,
    /// Exclude the embedding table from gradient updates
    pub freeze_embeddings: bool,
}

impl SentimentCnnConfig {
    /// Model with a randomly initialised embedding table.
    pub fn init<B: Backend>(&self, device: &B::Device) -> SentimentCnn<B> {
        let embedding = EmbeddingConfig::new(self.num_embeddings, self.embedding_dim).init(device);
        self.assemble(embedding, device)
    }

    /// Model whose embedding table starts from `matrix`.
    pub fn init_with_embeddings<B: Backend>(
        &self,
        matrix: &EmbeddingMatrix,
        device: &B::Device,
    ) -> Result<SentimentCnn<B>> {
        let (rows, dim) = matrix.shape();
        if rows != self.num_embeddings || dim != self.embedding_dim {
            bail!(
                "embedding matrix is {}x{}, model expects {}x{}",
                rows, dim, self.num_embeddings, self.embedding_dim
            );
        }

        let weights = Tensor::<B, 2>::from_data(
            TensorData::new(matrix.as_slice().to_vec(), [rows, dim]),
            device,
        );
        let mut embedding = EmbeddingConfig::new(rows, dim).init(device);
        embedding.weight = Param::from_tensor(weights);

        Ok(self.assemble(embedding, device))
    }

    /// Shortest input the widest convolution branch can slide over.
    pub fn min_seq_len(&self) -> usize {
        self.kernel_sizes.iter().copied().max().unwrap_or(1)
    }

    fn assemble<B: Backend>(&self, embedding: Embedding<B>, device: &B::Device) -> SentimentCnn<B> {
        let embedding = if self.freeze_embeddings {
            embedding.no_grad()
        } else {
            embedding
        };

        let convs: Vec<Conv1d<B>> = self
            .kernel_sizes
            .iter()
            .map(|&k| {
                Conv1dConfig::new(self.embedding_dim, self.num_filters, k)
                    .with_padding(PaddingConfig1d::Valid)
                    .init(device)
            })
            .collect();

        let concat_features = self.num_filters * self.kernel_sizes.len();
        let hidden  = LinearConfig::new(concat_features, self.hidden_size).init(device);
        let output  = LinearConfig::new(self.hidden_size, self.num_classes).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();

        SentimentCnn { embedding, convs, dropout, hidden, output }
    }
}

/// Multi-branch 1-D CNN over word embeddings:
///
/// ```text
/// ids [B, L] → embedding [B, L, D] → [B, D, L]
///   ├─ conv k=3 → relu → max over time ─┐
///   ├─ conv k=4 → relu → max over time ─┼→ concat [B, 3F, 1] → dropout → flatten [B, 3F]
///   └─ conv k=5 → relu → max over time ─┘
/// → linear + relu [B, H] → linear [B, 2] (logits)
/// ```
#[derive(Module, Debug)]
pub struct SentimentCnn<B: Backend> {
    pub embedding: Embedding<B>,
    pub convs:     Vec<Conv1d<B>>,
    pub dropout:   Dropout,
    pub hidden:    Linear<B>,
    pub output:    Linear<B>,
}

impl<B: Backend> SentimentCnn<B> {
    /// input_ids: [batch, seq_len] → logits: [batch, num_classes]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        // Conv1d wants [batch, channels, length]
        let x = self.embedding.forward(input_ids).swap_dims(1, 2);

        let pooled: Vec<Tensor<B, 3>> = self
            .convs
            .iter()
            .map(|conv| activation::relu(conv.forward(x.clone())).max_dim(2))
            .collect();

        let x = Tensor::cat(pooled, 1);
        let x = self.dropout.forward(x);
        let x: Tensor<B, 2> = x.flatten(1, 2);

        let x = activation::relu(self.hidden.forward(x));
        self.output.forward(x)
    }

    /// Per-class probabilities, each row sums to 1.
    pub fn forward_classification(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        activation::softmax(self.forward(input_ids), 1)
    }

    /// Categorical cross-entropy against one-hot `targets`.
    pub fn forward_loss(
        &self,
        input_ids: Tensor<B, 2, Int>,
        targets:   Tensor<B, 2>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(input_ids);
        let loss   = categorical_cross_entropy(logits.clone(), targets);
        (loss, logits)
    }
}

/// `-(targets * log_softmax(logits)).sum(1).mean()`
pub fn categorical_cross_entropy<B: Backend>(
    logits:  Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let log_probs = activation::log_softmax(logits, 1);
    (targets * log_probs).sum_dim(1).neg().mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::vocabulary::Vocabulary;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn config(rows: usize, dim: usize) -> SentimentCnnConfig {
        SentimentCnnConfig::new(rows, dim, vec![3, 4, 5], 8, 16, 2, 0.5, false)
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model: SentimentCnn<TestBackend> = config(10, 6).init(&device);

        let ids = Tensor::<TestBackend, 2, Int>::zeros([3, 12], &device);
        assert_eq!(model.forward(ids).dims(), [3, 2]);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let device = Default::default();
        let model: SentimentCnn<TestBackend> = config(10, 6).init(&device);

        let ids = Tensor::<TestBackend, 1, Int>::from_ints([1, 2, 3, 4, 5, 6, 7, 8, 9, 0], &device)
            .reshape([2, 5]);
        let probs: Vec<f32> = model.forward_classification(ids).into_data().to_vec().unwrap();

        for row in probs.chunks(2) {
            assert!((row[0] + row[1] - 1.0).abs() < 1e-5);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn test_pretrained_weights_are_copied() {
        let device = Default::default();
        let vocab  = Vocabulary::build(&["a b c"], None);
        let matrix = EmbeddingMatrix::random(vocab.embedding_rows(), 4, 0.0, 1.0, 3);

        let model: SentimentCnn<TestBackend> = config(vocab.embedding_rows(), 4)
            .init_with_embeddings(&matrix, &device)
            .unwrap();

        let weights: Vec<f32> = model.embedding.weight.val().into_data().to_vec().unwrap();
        assert_eq!(weights, matrix.as_slice());
    }

    #[test]
    fn test_mismatched_matrix_is_rejected() {
        let device = Default::default();
        let matrix = EmbeddingMatrix::random(5, 4, 0.0, 1.0, 3);
        let result = config(6, 4).init_with_embeddings::<TestBackend>(&matrix, &device);
        assert!(result.is_err());
    }

    #[test]
    fn test_cross_entropy_of_uniform_prediction_is_ln2() {
        let device  = Default::default();
        let logits  = Tensor::<TestBackend, 2>::zeros([2, 2], &device);
        let targets = Tensor::<TestBackend, 1>::from_floats([1.0, 0.0, 0.0, 1.0], &device)
            .reshape([2, 2]);

        let loss: f32 = categorical_cross_entropy(logits, targets).into_scalar();
        assert!((loss - std::f32::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_min_seq_len_is_widest_kernel() {
        assert_eq!(config(4, 4).min_seq_len(), 5);
    }
}
