// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: mean categorical cross-entropy on the training set
//   - train_acc:  fraction of training samples classified correctly
//   - val_loss:   mean categorical cross-entropy on the validation set
//   - val_acc:    fraction of validation samples classified correctly
//
// Output file: checkpoints/metrics.csv
//
// Example CSV output:
//   epoch,train_loss,train_acc,val_loss,val_acc
//   1,0.612300,0.671000,0.571200,0.702000
//   2,0.498100,0.764000,0.533900,0.731000
//
// The file is rewritten when a run starts, so it only ever holds
// the epochs of the latest run. A diverging run shows up here as
// a growing (or NaN) loss.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

const HEADER: &str = "epoch,train_loss,train_acc,val_loss,val_acc";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch:      usize,
    pub train_loss: f64,
    /// Range: [0.0, 1.0]
    pub train_acc:  f64,
    /// NaN when the validation split is empty
    pub val_loss:   f64,
    /// Range: [0.0, 1.0]
    pub val_acc:    f64,
}

impl EpochMetrics {
    pub fn new(
        epoch:      usize,
        train_loss: f64,
        train_acc:  f64,
        val_loss:   f64,
        val_acc:    f64,
    ) -> Self {
        Self { epoch, train_loss, train_acc, val_loss, val_acc }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Starts a fresh metrics.csv (header only), replacing the
    /// rows of any earlier run.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)?;
        writeln!(f, "{HEADER}")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.train_acc,
            m.val_loss,
            m.val_acc,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 0.6, 0.7, 0.5, 0.75);
        assert!(m.is_improvement(0.55));
        assert!(!m.is_improvement(0.5));
    }

    #[test]
    fn test_log_appends_rows_under_header() {
        let dir = std::env::temp_dir().join("sentiment_cnn_metrics_log");
        let _ = fs::remove_dir_all(&dir);

        let logger = MetricsLogger::new(dir.display().to_string()).unwrap();
        logger.log(&EpochMetrics::new(1, 0.5, 0.75, 0.625, 0.5)).unwrap();
        logger.log(&EpochMetrics::new(2, 0.25, 1.0, f64::NAN, 0.0)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "1,0.500000,0.750000,0.625000,0.500000");
        assert!(lines[2].starts_with("2,0.250000,1.000000,NaN"));
    }

    #[test]
    fn test_new_run_replaces_old_rows() {
        let dir = std::env::temp_dir().join("sentiment_cnn_metrics_rerun");
        let _ = fs::remove_dir_all(&dir);

        let first = MetricsLogger::new(dir.display().to_string()).unwrap();
        first.log(&EpochMetrics::new(1, 0.5, 0.5, 0.5, 0.5)).unwrap();
        first.log(&EpochMetrics::new(2, 0.4, 0.6, 0.4, 0.6)).unwrap();

        let second = MetricsLogger::new(dir.display().to_string()).unwrap();
        second.log(&EpochMetrics::new(1, 0.3, 0.7, 0.3, 0.7)).unwrap();

        let text = fs::read_to_string(second.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("1,0.300000"));
    }
}
