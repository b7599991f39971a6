// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Persists the vocabulary next to the checkpoints so `predict`
// encodes messages with exactly the ids the model was trained on.
//
//   checkpoints/vocab.json   ["<ticker>", "today", "up", ...]
//
// Position i in the array is id i + 1; id 0 stays padding.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::data::vocabulary::Vocabulary;

pub struct VocabStore {
    dir: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    fn path(&self) -> PathBuf {
        self.dir.join("vocab.json")
    }

    pub fn save(&self, vocab: &Vocabulary) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.path();

        std::fs::write(&path, serde_json::to_string(vocab)?)
            .with_context(|| format!("Cannot write vocabulary to '{}'", path.display()))?;

        tracing::info!("Vocabulary ({} tokens) saved to '{}'", vocab.len(), path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<Vocabulary> {
        let path = self.path();
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot load vocabulary from '{}'", path.display()))?;

        let vocab: Vocabulary = serde_json::from_str(&json)
            .with_context(|| format!("Malformed vocabulary in '{}'", path.display()))?;
        if vocab.is_empty() {
            bail!("Vocabulary in '{}' is empty", path.display());
        }
        Ok(vocab)
    }
}
