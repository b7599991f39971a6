// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Loads (message, sentiment) pairs from a CSV file with a
// header row, e.g. a StockTwits export:
//
//   message,sentiment
//   "$AAPL breaking out, loading calls",bullish
//   "$SPY puts printing",bearish
//
// Files ending in `.gz` are decompressed on the fly with flate2.
// Column names are configurable; extra columns are ignored.
//
// A missing file, a missing column or an unknown label aborts
// the load.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;

use crate::data::preprocessor::encode_labels;
use crate::domain::corpus::Corpus;
use crate::domain::traits::CorpusSource;

/// Open a text file for buffered reading, transparently gunzipping `.gz`.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;

    let reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    Ok(Box::new(BufReader::new(reader)))
}

fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

/// Loads a labelled corpus from a (possibly gzip-compressed) CSV file.
/// Implements the CorpusSource trait from Layer 3.
pub struct CsvCorpusLoader {
    path:         PathBuf,
    text_column:  String,
    label_column: String,
}

impl CsvCorpusLoader {
    pub fn new(
        path:         impl Into<PathBuf>,
        text_column:  impl Into<String>,
        label_column: impl Into<String>,
    ) -> Self {
        Self {
            path:         path.into(),
            text_column:  text_column.into(),
            label_column: label_column.into(),
        }
    }

    /// Read the two columns as raw strings, in file order.
    fn read_columns<R: Read>(&self, reader: R) -> Result<(Vec<String>, Vec<String>)> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv
            .headers()
            .with_context(|| format!("Cannot read CSV header of '{}'", self.path.display()))?
            .clone();

        let text_idx  = column_index(&headers, &self.text_column, &self.path)?;
        let label_idx = column_index(&headers, &self.label_column, &self.path)?;

        let mut messages = Vec::new();
        let mut labels   = Vec::new();

        for (row, record) in csv.records().enumerate() {
            let record = record
                .with_context(|| format!("Malformed CSV row {} in '{}'", row + 1, self.path.display()))?;

            let (Some(text), Some(label)) = (record.get(text_idx), record.get(label_idx)) else {
                bail!(
                    "CSV row {} in '{}' has only {} fields",
                    row + 1,
                    self.path.display(),
                    record.len()
                );
            };

            messages.push(text.to_string());
            labels.push(label.to_string());
        }

        Ok((messages, labels))
    }
}

fn column_index(headers: &csv::StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .with_context(|| {
            format!(
                "Column '{}' not found in '{}' (columns: {})",
                name,
                path.display(),
                headers.iter().collect::<Vec<_>>().join(", ")
            )
        })
}

impl CorpusSource for CsvCorpusLoader {
    fn load_all(&self) -> Result<Corpus> {
        let reader = open_text(&self.path)?;
        let (messages, raw_labels) = self.read_columns(reader)?;

        let labels = encode_labels(&raw_labels)
            .with_context(|| format!("Bad sentiment column in '{}'", self.path.display()))?;

        let corpus = Corpus::new(messages, labels);
        let (bearish, bullish) = corpus.label_counts();
        tracing::info!(
            "Loaded {} messages from '{}' ({} bearish, {} bullish)",
            corpus.len(),
            self.path.display(),
            bearish,
            bullish,
        );
        Ok(corpus)
    }
}
