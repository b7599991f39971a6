// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the labelled CSV corpus     (Layer 4 - data)
//   Step 2: Normalise, drop empty messages   (Layer 4 - data)
//   Step 3: Build + save the vocabulary      (Layer 4 / 6)
//   Step 4: Encode into fixed-length samples (Layer 4 - data)
//   Step 5: Seeded train/validation split    (Layer 4 - data)
//   Step 6: Build the embedding matrix       (Layer 4 - data)
//   Step 7: Save config                      (Layer 6 - infra)
//   Step 8: Run training loop                (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use std::path::Path;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{SentimentDataset, SentimentSample},
    embeddings::{EmbeddingMatrix, PretrainedVectors},
    encoder::SequenceEncoder,
    loader::CsvCorpusLoader,
    preprocessor::Preprocessor,
    splitter::split_train_val,
    vocabulary::Vocabulary,
};
use crate::domain::{corpus::Corpus, sentiment::NUM_CLASSES, traits::CorpusSource};
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::{
    model::SentimentCnnConfig,
    trainer::{run_training, ComputeBackend, TrainingReport},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings for a training run. Saved as train_config.json so
// `predict` can rebuild the same architecture and encoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub corpus_path:       String,
    /// GloVe-style vectors; random embeddings when absent
    pub embeddings_path:   Option<String>,
    pub checkpoint_dir:    String,
    pub text_column:       String,
    pub label_column:      String,
    /// Cap on vocabulary size; None keeps every token
    pub max_words:         Option<usize>,
    pub embedding_dim:     usize,
    pub max_seq_len:       usize,
    pub train_fraction:    f64,
    pub epochs:            usize,
    pub batch_size:        usize,
    pub lr:                f64,
    pub kernel_sizes:      Vec<usize>,
    pub num_filters:       usize,
    pub hidden_size:       usize,
    pub dropout:           f64,
    pub freeze_embeddings: bool,
    pub seed:              u64,
    pub backend:           ComputeBackend,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus_path:       "data/messages.csv".to_string(),
            embeddings_path:   None,
            checkpoint_dir:    "checkpoints".to_string(),
            text_column:       "message".to_string(),
            label_column:      "sentiment".to_string(),
            max_words:         Some(20_000),
            embedding_dim:     100,
            max_seq_len:       30,
            train_fraction:    0.8,
            epochs:            5,
            batch_size:        32,
            lr:                1e-3,
            kernel_sizes:      vec![3, 4, 5],
            num_filters:       128,
            hidden_size:       128,
            dropout:           0.5,
            freeze_embeddings: false,
            seed:              42,
            backend:           ComputeBackend::NdArray,
        }
    }
}

impl TrainConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            bail!("epochs must be at least 1");
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if !(self.train_fraction > 0.0 && self.train_fraction <= 1.0) {
            bail!("train_fraction must be in (0, 1], got {}", self.train_fraction);
        }
        if self.embedding_dim == 0 || self.num_filters == 0 || self.hidden_size == 0 {
            bail!("embedding_dim, num_filters and hidden_size must be positive");
        }
        if !(0.0..1.0).contains(&self.dropout) {
            bail!("dropout must be in [0, 1), got {}", self.dropout);
        }
        if self.kernel_sizes.is_empty() || self.kernel_sizes.contains(&0) {
            bail!("kernel_sizes must be non-empty and positive, got {:?}", self.kernel_sizes);
        }
        let widest = self.kernel_sizes.iter().copied().max().unwrap_or(1);
        if self.max_seq_len < widest {
            bail!(
                "max_seq_len ({}) must be at least the widest kernel ({})",
                self.max_seq_len, widest
            );
        }
        Ok(())
    }

    /// Architecture for a vocabulary with `num_embeddings` rows.
    pub fn model_config(&self, num_embeddings: usize) -> SentimentCnnConfig {
        SentimentCnnConfig::new(
            num_embeddings,
            self.embedding_dim,
            self.kernel_sizes.clone(),
            self.num_filters,
            self.hidden_size,
            NUM_CLASSES,
            self.dropout,
            self.freeze_embeddings,
        )
    }
}

// ─── Prepared data ────────────────────────────────────────────────────────────
/// Everything derived from the corpus before any tensor exists.
pub struct PreparedData {
    pub vocab:   Vocabulary,
    pub samples: Vec<SentimentSample>,
}

impl PreparedData {
    /// Normalise, build the vocabulary and encode every message.
    pub fn from_corpus(corpus: Corpus, cfg: &TrainConfig) -> Result<Self> {
        let corpus = Preprocessor::new().preprocess_corpus(corpus);
        if corpus.is_empty() {
            bail!("corpus is empty after cleaning");
        }

        let (bearish, bullish) = corpus.label_counts();
        tracing::info!(
            "{} messages after cleaning ({} bearish, {} bullish)",
            corpus.len(), bearish, bullish,
        );

        let vocab = Vocabulary::build(corpus.messages.as_slice(), cfg.max_words);
        tracing::info!("Vocabulary: {} tokens", vocab.len());

        let encoder = SequenceEncoder::new(&vocab, cfg.max_seq_len);
        let samples = corpus
            .messages
            .iter()
            .zip(&corpus.labels)
            .map(|(m, &label)| SentimentSample::new(encoder.encode(m), label))
            .collect::<Vec<SentimentSample>>();

        if let Some(first) = samples.first() {
            tracing::debug!("Sample 0: {:?} → '{}'", first.input_ids, encoder.decode(&first.input_ids));
        }

        Ok(Self { vocab, samples })
    }

    /// One-hot targets in sample order.
    pub fn targets(&self) -> Vec<[f32; NUM_CLASSES]> {
        self.samples.iter().map(|s| s.label.one_hot()).collect()
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingReport> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load the corpus ───────────────────────────────────────────
        tracing::info!("Loading corpus from '{}'", cfg.corpus_path);
        let loader = CsvCorpusLoader::new(&cfg.corpus_path, &cfg.text_column, &cfg.label_column);
        let corpus = loader.load_all()?;

        // ── Steps 2-4: Clean, vocabulary, encode ──────────────────────────────
        let PreparedData { vocab, samples } = PreparedData::from_corpus(corpus, cfg)?;
        VocabStore::new(&cfg.checkpoint_dir).save(&vocab)?;

        // ── Step 5: Seeded train / validation split ───────────────────────────
        let (train_samples, val_samples) =
            split_train_val(samples, cfg.train_fraction, cfg.seed);
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len()
        );

        let train_dataset = SentimentDataset::new(train_samples);
        let val_dataset   = SentimentDataset::new(val_samples);

        // ── Step 6: Embedding matrix ──────────────────────────────────────────
        let embeddings = match &cfg.embeddings_path {
            Some(path) => {
                tracing::info!("Loading pretrained vectors from '{}'", path);
                let vectors = PretrainedVectors::load(Path::new(path), cfg.embedding_dim)?;
                EmbeddingMatrix::from_pretrained(&vectors, &vocab, cfg.seed)
            }
            None => {
                tracing::info!("No pretrained vectors; using random embeddings");
                EmbeddingMatrix::untrained(&vocab, cfg.embedding_dim, cfg.seed)
            }
        };

        // ── Step 7: Save config for predict ───────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.clear_models()?;
        ckpt_manager.save_config(cfg)?;

        // ── Step 8: Run training loop (Layer 5) ───────────────────────────────
        let model_cfg = cfg.model_config(vocab.embedding_rows());
        run_training(cfg, &model_cfg, &embeddings, train_dataset, val_dataset, &ckpt_manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sentiment::Sentiment;
    use std::fs;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("sentiment_cnn_train_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn tiny_config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            corpus_path:    dir.join("corpus.csv").display().to_string(),
            checkpoint_dir: dir.join("checkpoints").display().to_string(),
            embedding_dim:  4,
            max_seq_len:    6,
            epochs:         1,
            batch_size:     2,
            num_filters:    2,
            hidden_size:    4,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let bad = [
            TrainConfig { epochs: 0, ..TrainConfig::default() },
            TrainConfig { batch_size: 0, ..TrainConfig::default() },
            TrainConfig { train_fraction: 0.0, ..TrainConfig::default() },
            TrainConfig { train_fraction: 1.5, ..TrainConfig::default() },
            TrainConfig { max_seq_len: 4, ..TrainConfig::default() },
            TrainConfig { kernel_sizes: Vec::new(), ..TrainConfig::default() },
            TrainConfig { dropout: 1.0, ..TrainConfig::default() },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }
    }

    #[test]
    fn test_prepare_ticker_messages() {
        let corpus = Corpus::new(
            vec!["$SPY up today".to_string(), "$SPY down today".to_string()],
            vec![Sentiment::Bullish, Sentiment::Bearish],
        );
        let cfg = TrainConfig { max_seq_len: 5, ..TrainConfig::default() };

        let prepared = PreparedData::from_corpus(corpus, &cfg).unwrap();

        assert_eq!(prepared.vocab.len(), 4);
        assert_eq!(prepared.vocab.index_of("<ticker>"), Some(1));
        assert_eq!(prepared.samples[0].input_ids, vec![0, 0, 1, 3, 2]);
        assert_eq!(prepared.samples[1].input_ids, vec![0, 0, 1, 4, 2]);
        assert_eq!(prepared.targets(), vec![[0.0, 1.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_prepare_fails_on_empty_corpus() {
        let corpus = Corpus::new(vec!["!!!".to_string()], vec![Sentiment::Bullish]);
        assert!(PreparedData::from_corpus(corpus, &TrainConfig::default()).is_err());
    }

    const CORPUS: &str = "message,sentiment\n\
        $SPY up today,bullish\n\
        $SPY down today,bearish\n\
        buying more $AAPL,Bullish\n\
        selling all $TSLA,Bearish\n\
        ...,bullish\n";

    #[test]
    fn test_execute_end_to_end() {
        let dir = temp_dir("e2e");
        fs::write(dir.join("corpus.csv"), CORPUS).unwrap();
        let cfg = tiny_config(&dir);

        let report = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert_eq!(report.history.len(), 1);

        let ckpt_dir = Path::new(&cfg.checkpoint_dir);
        for artifact in ["train_config.json", "vocab.json", "latest_epoch.json", "metrics.csv"] {
            assert!(ckpt_dir.join(artifact).exists(), "missing {artifact}");
        }
        let vocab = VocabStore::new(&cfg.checkpoint_dir).load().unwrap();
        assert!(vocab.index_of("<ticker>").is_some());

        let prediction = crate::application::predict_use_case::PredictUseCase::new(&cfg.checkpoint_dir)
            .unwrap()
            .predict("$SPY up today")
            .unwrap();
        let [bearish, bullish] = prediction.probabilities;
        assert!((bearish + bullish - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_execute_with_pretrained_vectors() {
        let dir = temp_dir("pretrained");
        fs::write(dir.join("corpus.csv"), CORPUS).unwrap();
        fs::write(
            dir.join("vectors.txt"),
            "<ticker> 0.1 0.2 0.3 0.4\nup 0.5 -0.5 0.25 0.0\nunrelated 1 1 1 1\n",
        )
        .unwrap();
        let cfg = TrainConfig {
            embeddings_path:   Some(dir.join("vectors.txt").display().to_string()),
            freeze_embeddings: true,
            ..tiny_config(&dir)
        };

        let report = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert!(report.last().unwrap().train_loss.is_finite());

        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);
        assert_eq!(ckpt.latest_epoch().unwrap(), 1);
        assert_eq!(ckpt.load_config().unwrap().embeddings_path, cfg.embeddings_path);
    }

    #[test]
    fn test_execute_rejects_wrong_vector_size() {
        let dir = temp_dir("wrong_dim");
        fs::write(dir.join("corpus.csv"), CORPUS).unwrap();
        fs::write(dir.join("vectors.txt"), "<ticker> 0.1 0.2 0.3\n").unwrap();
        let cfg = TrainConfig {
            embeddings_path: Some(dir.join("vectors.txt").display().to_string()),
            ..tiny_config(&dir)
        };

        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("vectors.txt:1"), "{msg}");
    }

    #[test]
    fn test_rerun_replaces_previous_artifacts() {
        let dir = temp_dir("rerun");
        fs::write(dir.join("corpus.csv"), CORPUS).unwrap();

        let first = TrainConfig { epochs: 2, ..tiny_config(&dir) };
        TrainUseCase::new(first).execute().unwrap();

        let second = tiny_config(&dir);
        TrainUseCase::new(second.clone()).execute().unwrap();

        let ckpt_dir = Path::new(&second.checkpoint_dir);
        assert!(!ckpt_dir.join("model_epoch_2.mpk.gz").exists());
        let metrics = fs::read_to_string(ckpt_dir.join("metrics.csv")).unwrap();
        assert_eq!(metrics.lines().count(), 2);
    }

    #[test]
    fn test_execute_rejects_unknown_label() {
        let dir = temp_dir("bad_label");
        fs::write(dir.join("corpus.csv"), "message,sentiment\nhello,neutral\n").unwrap();

        assert!(TrainUseCase::new(tiny_config(&dir)).execute().is_err());
    }
}
