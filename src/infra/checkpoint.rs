// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// What gets saved:
//   1. Model weights (.mpk.gz file) — one per epoch
//   2. latest_epoch.json            — which epoch was last saved
//   3. train_config.json            — hyperparameters, so the
//                                     predictor can rebuild the
//                                     exact architecture
//
// File naming convention:
//   checkpoints/
//     model_epoch_1.mpk.gz
//     model_epoch_2.mpk.gz
//     ...
//     latest_epoch.json
//     train_config.json
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::SentimentCnn;

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Nothing touches the disk until a `save_*` call, so the
    /// read-only `predict` path never creates directories.
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Cannot create checkpoint directory '{}'", self.dir.display())
        })
    }

    /// Delete model records and the latest pointer left by an earlier
    /// run in the same directory.
    pub fn clear_models(&self) -> Result<()> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(e).with_context(|| format!("Cannot list '{}'", self.dir.display()))
            }
        };

        let mut removed = 0usize;
        for entry in entries {
            let path = entry?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if name.starts_with("model_epoch_") || name == "latest_epoch.json" {
                fs::remove_file(&path)
                    .with_context(|| format!("Cannot remove stale '{}'", path.display()))?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!("Removed {} files from a previous run in '{}'", removed, self.dir.display());
        }
        Ok(())
    }

    /// Save model weights for a given epoch to
    /// {dir}/model_epoch_{epoch}.mpk.gz and move the latest pointer.
    pub fn save_model<B: Backend>(
        &self,
        model: &SentimentCnn<B>,
        epoch: usize,
    ) -> Result<()> {
        self.ensure_dir()?;
        // Without extension — the recorder adds it
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load weights from the latest checkpoint into `model`, which
    /// must have the same architecture as the saved one.
    pub fn load_model<B: Backend>(
        &self,
        model:  SentimentCnn<B>,
        device: &B::Device,
    ) -> Result<SentimentCnn<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Save the training configuration to JSON. Called before
    /// training starts.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| {
                format!("Cannot write config to '{}'", path.display())
            })?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'predict'.",
                    path.display()
                )
            })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }

    /// Returns an error if training hasn't been run yet.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");

        let s = fs::read_to_string(&path)
            .with_context(|| {
                "Cannot find 'latest_epoch.json'. \
                 Have you run 'train' first?"
            })?;

        Ok(serde_json::from_str::<usize>(&s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::SentimentCnnConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn manager(name: &str) -> CheckpointManager {
        let dir = std::env::temp_dir().join(format!("sentiment_cnn_ckpt_{name}"));
        let _ = fs::remove_dir_all(&dir);
        CheckpointManager::new(dir.display().to_string())
    }

    #[test]
    fn test_config_round_trip() {
        let ckpt = manager("config");
        let cfg  = TrainConfig { epochs: 3, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();

        let loaded = ckpt.load_config().unwrap();
        assert_eq!(loaded.epochs, 3);
        assert_eq!(loaded.kernel_sizes, cfg.kernel_sizes);
    }

    #[test]
    fn test_model_round_trip_restores_weights() {
        let ckpt   = manager("model");
        let device = Default::default();
        let mcfg   = SentimentCnnConfig::new(6, 4, vec![2, 3], 3, 5, 2, 0.0, false);

        let trained: SentimentCnn<TestBackend> = mcfg.init(&device);
        ckpt.save_model(&trained, 2).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 2);

        let fresh: SentimentCnn<TestBackend> = mcfg.init(&device);
        let loaded = ckpt.load_model(fresh, &device).unwrap();

        let ids = Tensor::<TestBackend, 1, Int>::from_ints([1, 2, 3, 4, 5], &device)
            .reshape([1, 5]);
        let a: Vec<f32> = trained.forward(ids.clone()).into_data().to_vec().unwrap();
        let b: Vec<f32> = loaded.forward(ids).into_data().to_vec().unwrap();
        for (x, y) in a.iter().zip(&b) {
            // CompactRecorder stores half precision
            assert!((x - y).abs() < 1e-2, "{x} vs {y}");
        }
    }

    #[test]
    fn test_missing_checkpoint_fails() {
        let ckpt = manager("missing");
        assert!(ckpt.latest_epoch().is_err());
        assert!(ckpt.load_config().is_err());
        // reading never creates the directory
        assert!(!ckpt.dir.exists());
    }

    #[test]
    fn test_clear_models_keeps_other_artifacts() {
        let ckpt   = manager("clear");
        let device = Default::default();
        let mcfg   = SentimentCnnConfig::new(6, 4, vec![2], 3, 5, 2, 0.0, false);
        let model: SentimentCnn<TestBackend> = mcfg.init(&device);

        ckpt.save_config(&TrainConfig::default()).unwrap();
        ckpt.save_model(&model, 1).unwrap();
        ckpt.save_model(&model, 2).unwrap();

        ckpt.clear_models().unwrap();
        assert!(ckpt.latest_epoch().is_err());
        assert!(!ckpt.dir.join("model_epoch_2.mpk.gz").exists());
        assert!(ckpt.load_config().is_ok());

        // a directory that does not exist yet is fine
        assert!(manager("clear_absent").clear_models().is_ok());
    }
}
