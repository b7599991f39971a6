// ============================================================
// Layer 3 — Sentiment Domain Type
// ============================================================
// The two legal labels of the corpus and their fixed class order:
//
//   class 0 → bearish   one-hot [1, 0]
//   class 1 → bullish   one-hot [0, 1]
//
// Training, validation and `predict` all go through this type,
// so the order cannot drift between them.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Number of output classes of the classifier.
pub const NUM_CLASSES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bearish,
    Bullish,
}

impl Sentiment {
    /// All labels in class-index order.
    pub const ALL: [Sentiment; NUM_CLASSES] = [Sentiment::Bearish, Sentiment::Bullish];

    pub fn class_index(self) -> usize {
        match self {
            Sentiment::Bearish => 0,
            Sentiment::Bullish => 1,
        }
    }

    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// One-hot vector of length [`NUM_CLASSES`].
    pub fn one_hot(self) -> [f32; NUM_CLASSES] {
        let mut v = [0.0; NUM_CLASSES];
        v[self.class_index()] = 1.0;
        v
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Bearish => "bearish",
            Sentiment::Bullish => "bullish",
        }
    }
}

impl FromStr for Sentiment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bearish" => Ok(Sentiment::Bearish),
            "bullish" => Ok(Sentiment::Bullish),
            other => bail!("unknown sentiment label '{other}' (expected 'bearish' or 'bullish')"),
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
