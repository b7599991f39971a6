// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw CSV corpus to tensor batches.
//
//   corpus.csv(.gz)
//       │
//       ▼
//   CsvCorpusLoader   → (message, sentiment) pairs
//       │
//       ▼
//   Preprocessor      → normalise, drop empty messages
//       │
//       ▼
//   Vocabulary        → token → id (0 reserved for padding)
//       │
//       ▼
//   SequenceEncoder   → fixed-length, left-padded id sequences
//       │
//       ▼
//   split_train_val   → seeded shuffle, train / validation
//       │
//       ▼
//   SentimentDataset  → Burn's Dataset trait
//       │
//       ▼
//   SentimentBatcher  → tensor batches for the DataLoader
//
// EmbeddingMatrix sits beside this chain: it reads pretrained
// vectors and lines them up with the vocabulary ids.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads the labelled CSV corpus (plain or gzip)
pub mod loader;

/// Message normalisation and label encoding
pub mod preprocessor;

/// Token → id mapping
pub mod vocabulary;

/// Fixed-length id sequences
pub mod encoder;

/// Pretrained vectors and the initial embedding matrix
pub mod embeddings;

/// Implements Burn's Dataset trait for encoded samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
