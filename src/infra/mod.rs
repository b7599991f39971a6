// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by both training and predict:
//
//   checkpoint.rs  — model weights via Burn's CompactRecorder,
//                    plus TrainConfig as JSON so predict can
//                    rebuild the model
//
//   vocab_store.rs — vocabulary as JSON, so predict encodes
//                    with the training ids
//
//   metrics.rs     — epoch-level loss / accuracy appended to
//                    a CSV file
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Vocabulary saving and loading
pub mod vocab_store;

/// Training metrics CSV logger
pub mod metrics;
