// ============================================================
// Layer 4 — Message Preprocessor
// ============================================================
// Normalises raw social-media messages before vocabulary
// building and encoding.
//
// Normalisation steps (applied in order):
//   1. Lowercase, then compose to NFC
//   2. URLs            → <url>
//   3. @user mentions  → <user>
//   4. $cashtags       → <ticker>
//   5. Strip punctuation from every non-placeholder token;
//      leftover combining marks are dropped, not split on
//   6. Standalone digit runs → <number>
//   7. Re-join tokens with single spaces
//
// Example:
//   "$AAPL to the moon!!! @trader says 150 https://t.co/x"
//   → "<ticker> to the moon <user> says <number> <url>"
//
// Every placeholder survives a second pass untouched and no
// punctuation is left for step 5 to remove, so the transform
// is idempotent.
//
// Reference: Rust Book §8 (Strings in Rust)
//            regex crate documentation

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::domain::corpus::Corpus;
use crate::domain::sentiment::Sentiment;

pub const URL_TOKEN:    &str = "<url>";
pub const USER_TOKEN:   &str = "<user>";
pub const TICKER_TOKEN: &str = "<ticker>";
pub const NUMBER_TOKEN: &str = "<number>";

const PLACEHOLDERS: [&str; 4] = [URL_TOKEN, USER_TOKEN, TICKER_TOKEN, NUMBER_TOKEN];

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:https?://|www\.)\S+").unwrap());
static MENTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+").unwrap());
static TICKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[a-z][a-z0-9._\-]*").unwrap());

pub struct Preprocessor;

impl Preprocessor {
    /// Create a new Preprocessor instance
    pub fn new() -> Self {
        Self
    }

    /// Normalise one message. An empty result means the message
    /// carries no usable content and should be dropped.
    pub fn normalize(&self, text: &str) -> String {
        // ── Step 1: Case-fold ─────────────────────────────────────────────────
        // "İ" lowercases to "i" + U+0307, which NFC cannot compose
        let lowered: String = text.to_lowercase().nfc().collect();

        // ── Steps 2-4: Entity placeholders ────────────────────────────────────
        // Placeholders are padded with spaces so they always end up as
        // standalone tokens, e.g. "hi@bob" → "hi <user> ".
        let replaced = URL_REGEX.replace_all(&lowered, " <url> ");
        let replaced = MENTION_REGEX.replace_all(&replaced, " <user> ");
        let replaced = TICKER_REGEX.replace_all(&replaced, " <ticker> ");

        // ── Steps 5-7: Punctuation and numbers ────────────────────────────────
        let mut tokens: Vec<String> = Vec::new();
        for raw in replaced.split_whitespace() {
            if PLACEHOLDERS.contains(&raw) {
                tokens.push(raw.to_string());
                continue;
            }

            let stripped: String = raw
                .chars()
                .filter(|&c| !is_combining_mark(c))
                .map(|c| if c.is_alphanumeric() { c } else { ' ' })
                .collect();

            for piece in stripped.split_whitespace() {
                if piece.chars().all(|c| c.is_ascii_digit()) {
                    tokens.push(NUMBER_TOKEN.to_string());
                } else {
                    tokens.push(piece.to_string());
                }
            }
        }

        tokens.join(" ")
    }

    /// Normalise every message of the corpus, then drop the ones that
    /// came out empty together with their labels.
    pub fn preprocess_corpus(&self, corpus: Corpus) -> Corpus {
        let Corpus { messages, labels } = corpus;
        let normalized = messages.iter().map(|m| self.normalize(m)).collect();
        drop_empty_messages(Corpus::new(normalized, labels))
    }
}

/// Implement Default so Preprocessor can be created with Preprocessor::default()
impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove every index whose message is empty (or whitespace only),
/// from both the message and the label vector.
pub fn drop_empty_messages(corpus: Corpus) -> Corpus {
    let before = corpus.len();

    let (messages, labels): (Vec<String>, Vec<Sentiment>) = corpus
        .messages
        .into_iter()
        .zip(corpus.labels)
        .filter(|(m, _)| !m.trim().is_empty())
        .unzip();

    let dropped = before - messages.len();
    if dropped > 0 {
        tracing::info!("Dropped {} empty messages ({} remain)", dropped, messages.len());
    }

    Corpus::new(messages, labels)
}

/// Map raw sentiment strings to labels. Fails on the first value that
/// is neither "bearish" nor "bullish", naming its 0-based position.
pub fn encode_labels(raw: &[String]) -> Result<Vec<Sentiment>> {
    raw.iter()
        .enumerate()
        .map(|(i, s)| {
            s.parse::<Sentiment>()
                .with_context(|| format!("invalid label at row {i}"))
        })
        .collect()
}
