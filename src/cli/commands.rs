// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `predict`, and all
// their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::TrainConfig;
use crate::ml::trainer::ComputeBackend;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the CNN sentiment classifier on a labelled CSV corpus
    Train(TrainArgs),

    /// Classify one message with a trained checkpoint
    Predict(PredictArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum BackendArg {
    Ndarray,
    Wgpu,
}

impl From<BackendArg> for ComputeBackend {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Ndarray => ComputeBackend::NdArray,
            BackendArg::Wgpu    => ComputeBackend::Wgpu,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV file (optionally .gz) with a message and a sentiment column
    #[arg(long)]
    pub corpus: String,

    /// GloVe-style pretrained vectors (optionally .gz)
    #[arg(long)]
    pub embeddings: Option<String>,

    /// Directory for checkpoints, vocabulary, config and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value = "message")]
    pub text_column: String,

    #[arg(long, default_value = "sentiment")]
    pub label_column: String,

    /// Keep only the most frequent words; 0 keeps all
    #[arg(long, default_value_t = 20_000)]
    pub max_words: usize,

    /// Must match the vector size of --embeddings when given
    #[arg(long, default_value_t = 100)]
    pub embedding_dim: usize,

    /// Tokens per message after padding / truncation
    #[arg(long, default_value_t = 30)]
    pub max_seq_len: usize,

    /// Share of messages used for training, the rest validates
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Convolution widths, one branch each
    #[arg(long, value_delimiter = ',', default_values_t = [3, 4, 5])]
    pub kernel_sizes: Vec<usize>,

    /// Filters per convolution branch
    #[arg(long, default_value_t = 128)]
    pub num_filters: usize,

    #[arg(long, default_value_t = 128)]
    pub hidden_size: usize,

    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    /// Keep the embedding table fixed during training
    #[arg(long)]
    pub freeze_embeddings: bool,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = BackendArg::Ndarray)]
    pub backend: BackendArg,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            corpus_path:       a.corpus,
            embeddings_path:   a.embeddings,
            checkpoint_dir:    a.checkpoint_dir,
            text_column:       a.text_column,
            label_column:      a.label_column,
            max_words:         (a.max_words > 0).then_some(a.max_words),
            embedding_dim:     a.embedding_dim,
            max_seq_len:       a.max_seq_len,
            train_fraction:    a.train_fraction,
            epochs:            a.epochs,
            batch_size:        a.batch_size,
            lr:                a.lr,
            kernel_sizes:      a.kernel_sizes,
            num_filters:       a.num_filters,
            hidden_size:       a.hidden_size,
            dropout:           a.dropout,
            freeze_embeddings: a.freeze_embeddings,
            seed:              a.seed,
            backend:           a.backend.into(),
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// The raw message to classify
    #[arg(long)]
    pub message: String,

    /// Directory where `train` saved its artifacts
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}
