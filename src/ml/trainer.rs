// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fixed-epoch train + validation loop using Burn's DataLoader
// and Adam.
//
//   - Training runs on an Autodiff<…> backend for gradients
//   - model.valid() returns the model on the inner backend,
//     with dropout disabled, for validation
//   - The validation batcher therefore uses B::InnerBackend
//   - argmax(1) returns [batch, 1], flattened before .equal()
//
// There is no early stopping: every configured epoch runs, and
// a checkpoint plus a metrics.csv row is written after each one.
// A non-finite training loss aborts the run.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::sync::Arc;

use anyhow::{bail, Result};
use burn::{
    backend::{Autodiff, NdArray, Wgpu},
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{SentimentBatch, SentimentBatcher},
    dataset::SentimentDataset,
    embeddings::EmbeddingMatrix,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{SentimentCnn, SentimentCnnConfig};

/// Which burn backend the training run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeBackend {
    /// CPU, pure Rust
    NdArray,
    /// GPU through wgpu
    Wgpu,
}

/// Per-epoch metrics of a finished run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub history: Vec<EpochMetrics>,
}

impl TrainingReport {
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.history.last()
    }
}

pub fn run_training(
    cfg:           &TrainConfig,
    model_cfg:     &SentimentCnnConfig,
    embeddings:    &EmbeddingMatrix,
    train_dataset: SentimentDataset,
    val_dataset:   SentimentDataset,
    ckpt_manager:  &CheckpointManager,
) -> Result<TrainingReport> {
    let report = match cfg.backend {
        ComputeBackend::NdArray => {
            let device = burn::backend::ndarray::NdArrayDevice::default();
            tracing::info!("Using NdArray device: {:?}", device);
            train_loop::<Autodiff<NdArray>>(
                cfg, model_cfg, embeddings, train_dataset, val_dataset, ckpt_manager, device,
            )?
            .1
        }
        ComputeBackend::Wgpu => {
            let device = burn::backend::wgpu::WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<Autodiff<Wgpu>>(
                cfg, model_cfg, embeddings, train_dataset, val_dataset, ckpt_manager, device,
            )?
            .1
        }
    };
    Ok(report)
}

/// Backend-generic loop. Returns the trained model with its history.
pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    model_cfg:     &SentimentCnnConfig,
    embeddings:    &EmbeddingMatrix,
    train_dataset: SentimentDataset,
    val_dataset:   SentimentDataset,
    ckpt_manager:  &CheckpointManager,
    device:        B::Device,
) -> Result<(SentimentCnn<B>, TrainingReport)> {
    if train_dataset.sample_count() == 0 {
        bail!("training set is empty");
    }
    let seq_len = train_dataset.get(0).map_or(0, |s| s.input_ids.len());
    if seq_len < model_cfg.min_seq_len() {
        bail!(
            "sequences of length {} are shorter than the widest kernel ({})",
            seq_len,
            model_cfg.min_seq_len()
        );
    }
    if val_dataset.sample_count() == 0 {
        tracing::warn!("Validation set is empty; validation metrics will be NaN");
    }

    B::seed(&device, cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: SentimentCnn<B> = model_cfg.init_with_embeddings(embeddings, &device)?;
    tracing::info!(
        "Model ready: kernels={:?}, filters={}, embeddings {}x{} ({})",
        model_cfg.kernel_sizes,
        model_cfg.num_filters,
        model_cfg.num_embeddings,
        model_cfg.embedding_dim,
        if model_cfg.freeze_embeddings { "frozen" } else { "trainable" },
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::new(SentimentBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_loader = DataLoaderBuilder::new(SentimentBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let metrics_logger = MetricsLogger::new(&cfg.checkpoint_dir)?;
    tracing::info!("Epoch metrics → '{}'", metrics_logger.csv_path().display());
    let mut history       = Vec::with_capacity(cfg.epochs);
    let mut best_val_loss = f64::INFINITY;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let mut loss_sum = 0.0f64;
        let mut correct  = 0usize;
        let mut seen     = 0usize;

        for (batch_idx, batch) in train_loader.iter().enumerate() {
            let batch_size = batch.labels.dims()[0];
            let (loss, logits) = model.forward_loss(batch.input_ids, batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                bail!("non-finite training loss at epoch {epoch}, batch {}", batch_idx + 1);
            }

            loss_sum += loss_val * batch_size as f64;
            correct  += count_correct(logits, batch.labels);
            seen     += batch_size;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let train_loss = loss_sum / seen.max(1) as f64;
        let train_acc  = correct as f64 / seen.max(1) as f64;

        // model.valid() → SentimentCnn<B::InnerBackend>, dropout disabled
        let (val_loss, val_acc) = evaluate(&model.valid(), &val_loader);

        let metrics = EpochMetrics::new(epoch, train_loss, train_acc, val_loss, val_acc);
        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.1}% | val_loss={:.4} | val_acc={:.1}%",
            epoch, cfg.epochs, train_loss, train_acc * 100.0, val_loss, val_acc * 100.0,
        );
        metrics_logger.log(&metrics)?;
        if metrics.is_improvement(best_val_loss) {
            best_val_loss = metrics.val_loss;
            tracing::info!("New best validation loss {:.4} at epoch {}", best_val_loss, epoch);
        }
        history.push(metrics);

        ckpt_manager.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    tracing::info!("Training complete!");
    Ok((model, TrainingReport { history }))
}

/// Mean loss and accuracy over a loader. NaN loss for an empty loader.
pub fn evaluate<B: Backend>(
    model:  &SentimentCnn<B>,
    loader: &Arc<dyn DataLoader<B, SentimentBatch<B>>>,
) -> (f64, f64) {
    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut seen     = 0usize;

    for batch in loader.iter() {
        let batch_size = batch.labels.dims()[0];
        let (loss, logits) = model.forward_loss(batch.input_ids, batch.targets);

        loss_sum += loss.into_scalar().elem::<f64>() * batch_size as f64;
        correct  += count_correct(logits, batch.labels);
        seen     += batch_size;
    }

    if seen == 0 {
        return (f64::NAN, 0.0);
    }
    (loss_sum / seen as f64, correct as f64 / seen as f64)
}

fn count_correct<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> usize {
    // argmax(1) returns shape [batch, 1] — flatten to [batch]
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    predicted
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}
