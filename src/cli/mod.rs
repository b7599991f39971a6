// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   — trains the CNN on a labelled CSV corpus
//   2. `predict` — loads a checkpoint and classifies a message
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "sentiment-cnn",
    version = "0.1.0",
    about = "Train a CNN bullish/bearish classifier on financial messages, then classify new ones."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on corpus: {}", args.corpus);

    let checkpoint_dir = args.checkpoint_dir.clone();
    let report = TrainUseCase::new(args.into()).execute()?;

    if let Some(last) = report.last() {
        println!(
            "Training complete after {} epochs: val_loss={:.4}, val_acc={:.1}%",
            last.epoch, last.val_loss, last.val_acc * 100.0,
        );
    }
    println!("Artifacts saved to '{}'.", checkpoint_dir);
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case   = PredictUseCase::new(&args.checkpoint_dir)?;
    let prediction = use_case.predict(&args.message)?;

    let [bearish, bullish] = prediction.probabilities;
    println!(
        "\nSentiment: {} ({:.1}% confidence)",
        prediction.sentiment,
        prediction.confidence() * 100.0,
    );
    println!("  bearish={:.4} bullish={:.4}", bearish, bullish);
    Ok(())
}
