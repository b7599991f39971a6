// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model maths lives here; the data layer only hands over
// id sequences and one-hot targets as burn tensors.
//
//   model.rs      — multi-branch 1-D CNN text classifier
//                   • embedding table (pretrained or random,
//                     optionally frozen)
//                   • conv branches (k = 3, 4, 5) + ReLU
//                   • global max pooling over time
//                   • dropout → dense ReLU → 2-way output
//
//   trainer.rs    — fixed-epoch Adam loop with validation,
//                   per-epoch checkpoints and metrics
//
//   inferencer.rs — reloads a checkpoint and classifies
//                   single messages
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Kim (2014) Convolutional Neural Networks for
//            Sentence Classification

/// CNN sentiment classifier architecture
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Inference engine: loads a checkpoint and predicts sentiment
pub mod inferencer;
