// ============================================================
// Layer 4 — Pretrained Embedding Table
// ============================================================
// Reads a GloVe-style vector file and builds the initial weight
// matrix of the classifier's embedding layer.
//
// File format (plain text or .gz), one vector per line:
//   <token> <f1> <f2> ... <fD>
//
// Matrix construction, shape (vocab.len() + 1, D):
//   1. mean / std over EVERY component of EVERY parsed vector
//   2. fill all entries from Normal(mean, std), seeded RNG
//   3. overwrite the row of each vocabulary token found in the
//      file with its exact pretrained vector
//   Row 0 (padding) keeps its random draw.
//
// Malformed lines (wrong arity, non-numeric or non-finite
// components) abort the load with file and line number.
// Blank lines are skipped.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::data::loader::open_text;
use crate::data::vocabulary::Vocabulary;

/// Standard deviation used when no pretrained file is configured.
pub const DEFAULT_INIT_STD: f32 = 0.05;

#[derive(Debug, Clone)]
pub struct PretrainedVectors {
    dim:     usize,
    vectors: HashMap<String, Vec<f32>>,
    mean:    f32,
    std:     f32,
}

impl PretrainedVectors {
    pub fn load(path: &Path, dim: usize) -> Result<Self> {
        tracing::info!("Loading pretrained vectors from '{}'", path.display());
        let reader = open_text(path)?;
        let vectors = Self::parse(reader, dim, &path.display().to_string())?;
        tracing::info!(
            "Parsed {} vectors (dim={}, mean={:.4}, std={:.4})",
            vectors.vectors.len(),
            dim,
            vectors.mean,
            vectors.std,
        );
        Ok(vectors)
    }

    /// Parse vectors from any reader. `origin` names the source in errors.
    pub fn parse<R: BufRead>(reader: R, dim: usize, origin: &str) -> Result<Self> {
        let mut vectors: HashMap<String, Vec<f32>> = HashMap::new();
        let mut sum    = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut count  = 0usize;

        for (i, line) in reader.lines().enumerate() {
            let line_no = i + 1;
            let line = line.with_context(|| format!("{origin}:{line_no}: read failed"))?;

            let mut parts = line.split_whitespace();
            let Some(token) = parts.next() else {
                continue;
            };

            let values = parts
                .map(|p| p.parse::<f32>())
                .collect::<std::result::Result<Vec<f32>, _>>()
                .with_context(|| {
                    format!("{origin}:{line_no}: non-numeric component for '{token}'")
                })?;

            if values.len() != dim {
                bail!(
                    "{origin}:{line_no}: expected {dim} components for '{token}', found {}",
                    values.len()
                );
            }
            // f32::from_str accepts "inf" and "NaN"
            if values.iter().any(|v| !v.is_finite()) {
                bail!("{origin}:{line_no}: non-finite component for '{token}'");
            }

            for &v in &values {
                sum    += v as f64;
                sum_sq += (v as f64) * (v as f64);
            }
            count += values.len();

            vectors.insert(token.to_string(), values);
        }

        if vectors.is_empty() {
            bail!("{origin}: no vectors found");
        }

        let mean = sum / count as f64;
        let var  = (sum_sq / count as f64 - mean * mean).max(0.0);

        Ok(Self {
            dim,
            vectors,
            mean: mean as f32,
            std:  var.sqrt() as f32,
        })
    }

    pub fn get(&self, token: &str) -> Option<&[f32]> {
        self.vectors.get(token).map(Vec::as_slice)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// (mean, std) over all parsed components.
    pub fn stats(&self) -> (f32, f32) {
        (self.mean, self.std)
    }
}

/// Row-major `(rows, dim)` weight table. Row `i` belongs to vocabulary id `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    rows: usize,
    dim:  usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Every entry drawn from Normal(mean, std). A non-positive or
    /// non-finite std yields the constant `mean`.
    pub fn random(rows: usize, dim: usize, mean: f32, std: f32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let len = rows * dim;

        let data = match Normal::new(mean, std) {
            Ok(normal) if std.is_finite() && std > 0.0 => {
                (0..len).map(|_| normal.sample(&mut rng)).collect()
            }
            _ => vec![mean; len],
        };

        Self { rows, dim, data }
    }

    /// Random rows from the file's statistics, pretrained rows copied over.
    pub fn from_pretrained(vectors: &PretrainedVectors, vocab: &Vocabulary, seed: u64) -> Self {
        let (mean, std) = vectors.stats();
        let mut matrix = Self::random(vocab.embedding_rows(), vectors.dim(), mean, std, seed);

        let mut hits = 0usize;
        for (token, id) in vocab.iter() {
            if let Some(v) = vectors.get(token) {
                matrix.row_mut(id as usize).copy_from_slice(v);
                hits += 1;
            }
        }

        tracing::info!(
            "Embedding matrix {}x{}: {} of {} tokens pretrained",
            matrix.rows,
            matrix.dim,
            hits,
            vocab.len(),
        );
        matrix
    }

    /// Rows from Normal(0, DEFAULT_INIT_STD) when no pretrained file is used.
    pub fn untrained(vocab: &Vocabulary, dim: usize, seed: u64) -> Self {
        Self::random(vocab.embedding_rows(), dim, 0.0, DEFAULT_INIT_STD, seed)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.dim)
    }

    #[cfg(test)]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    fn row_mut(&mut self, i: usize) -> &mut [f32] {
        &mut self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const FILE: &str = "\
<ticker> 0.5 -0.5 1.0
today 0.25 0.75 -1.0

up 1.5 0.0 0.0
";

    fn parse(text: &str, dim: usize) -> Result<PretrainedVectors> {
        PretrainedVectors::parse(Cursor::new(text), dim, "test.txt")
    }

    #[test]
    fn test_parses_vectors_and_skips_blank_lines() {
        let v = parse(FILE, 3).unwrap();
        assert_eq!(v.vectors.len(), 3);
        assert_eq!(v.get("today"), Some(&[0.25, 0.75, -1.0][..]));
        assert_eq!(v.get("down"), None);
    }

    #[test]
    fn test_stats_cover_all_components() {
        let v = parse("a 1 3\nb 5 7\n", 2).unwrap();
        let (mean, std) = v.stats();
        assert!((mean - 4.0).abs() < 1e-6);
        // population std of [1, 3, 5, 7]
        assert!((std - 5.0f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_wrong_arity_fails_with_line_number() {
        let err = parse("a 1 2 3\nb 1 2\n", 3).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("test.txt:2"), "{msg}");
    }

    #[test]
    fn test_non_numeric_component_fails() {
        let err = parse("a 1 x 3\n", 3).unwrap_err();
        assert!(format!("{err:#}").contains("test.txt:1"));
    }

    #[test]
    fn test_non_finite_component_fails() {
        for bad in ["inf", "-inf", "NaN"] {
            let text = format!("good 0.1 0.2\nbad {bad} 0.3\n");
            let err = parse(&text, 2).unwrap_err();
            let msg = format!("{err:#}");
            assert!(msg.contains("test.txt:2") && msg.contains("'bad'"), "{msg}");
        }
    }

    #[test]
    fn test_load_gzipped_file_from_disk() {
        use flate2::{write::GzEncoder, Compression};
        use std::io::Write;

        let dir = std::env::temp_dir().join("sentiment_cnn_embeddings_gz");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join("vectors.txt.gz");
        let mut gz = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        gz.write_all(FILE.as_bytes()).unwrap();
        gz.finish().unwrap();

        let v = PretrainedVectors::load(&path, 3).unwrap();
        assert_eq!(v.get("up"), Some(&[1.5, 0.0, 0.0][..]));

        let err = PretrainedVectors::load(&path, 4).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("vectors.txt.gz:1"), "{msg}");
    }

    #[test]
    fn test_empty_file_fails() {
        assert!(parse("\n\n", 3).is_err());
    }

    #[test]
    fn test_matrix_shape_and_pretrained_rows_exact() {
        let vectors = parse(FILE, 3).unwrap();
        let vocab   = Vocabulary::build(&["<ticker> up today", "<ticker> down today"], None);
        let matrix  = EmbeddingMatrix::from_pretrained(&vectors, &vocab, 7);

        assert_eq!(matrix.shape(), (vocab.len() + 1, 3));
        for (token, id) in vocab.iter() {
            if let Some(v) = vectors.get(token) {
                assert_eq!(matrix.row(id as usize), v);
            }
        }
        // "down" is not in the file, so it keeps a random row
        let down = vocab.index_of("down").unwrap() as usize;
        assert_eq!(matrix.row(down).len(), 3);
    }

    #[test]
    fn test_random_init_is_seeded() {
        let a = EmbeddingMatrix::random(4, 8, 0.0, 1.0, 42);
        let b = EmbeddingMatrix::random(4, 8, 0.0, 1.0, 42);
        let c = EmbeddingMatrix::random(4, 8, 0.0, 1.0, 43);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_zero_std_falls_back_to_mean() {
        let m = EmbeddingMatrix::random(2, 3, 0.25, 0.0, 1);
        assert!(m.as_slice().iter().all(|&x| x == 0.25));
    }
}
