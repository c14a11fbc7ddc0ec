//! Sentence embeddings for scholarly text.
//!
//! Transformer backends live outside this crate; callers plug them in through
//! [`EmbeddingModel`]. [`HashingEmbedder`] is a deterministic stand-in that
//! needs no model weights.

use sha2::{Digest, Sha256};

use crate::config::defaults;
use crate::error::{MetricsError, MetricsResult};
use crate::utils::Matrix;

/// Model identifier used for scholarly embeddings.
pub const DEFAULT_MODEL_NAME: &str = defaults::EMBEDDING_MODEL;

/// A text encoder producing one vector per input.
pub trait EmbeddingModel {
    /// Model identifier.
    fn name(&self) -> &str;

    /// Encode every text into a vector. All vectors share one dimension.
    fn encode(&self, texts: &[String]) -> MetricsResult<Vec<Vec<f32>>>;
}

/// Embed `texts` with `model`, optionally L2-normalising each row.
///
/// Rows with zero norm are left as they are.
pub fn specter2_embed(
    texts: &[String],
    model: &dyn EmbeddingModel,
    normalize: bool,
) -> MetricsResult<Matrix> {
    let vectors = model.encode(texts)?;
    if vectors.len() != texts.len() {
        return Err(MetricsError::validation(
            "embeddings",
            format!("model returned {} vectors for {} texts", vectors.len(), texts.len()),
        ));
    }

    let rows: Vec<Vec<f64>> = vectors
        .into_iter()
        .map(|v| v.into_iter().map(f64::from).collect())
        .collect();
    let mut matrix = Matrix::from_rows(&rows)?;

    if normalize {
        for r in 0..matrix.nrows() {
            let norm = crate::utils::l2_norm(matrix.row(r));
            if norm > 0.0 {
                for value in matrix.row_mut(r) {
                    *value /= norm;
                }
            }
        }
    }

    tracing::debug!(
        model = model.name(),
        texts = texts.len(),
        dimensions = matrix.ncols(),
        normalize,
        "Embedded texts"
    );
    Ok(matrix)
}

/// Feature-hashing embedder: each lower-cased token increments the bucket
/// chosen by its SHA-256 digest, then the vector is L2-normalised.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    name: String,
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create an embedder with `dimensions` buckets.
    pub fn new(dimensions: usize) -> MetricsResult<Self> {
        if dimensions == 0 {
            return Err(MetricsError::validation("dimensions", "must be greater than zero"));
        }
        Ok(Self { name: format!("hashing-{dimensions}"), dimensions })
    }

    /// Number of buckets.
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(prefix) % self.dimensions as u64) as usize
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text
            .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .filter(|t| !t.is_empty())
        {
            vector[self.bucket(&token.to_lowercase())] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { name: format!("hashing-{}", defaults::HASHING_DIMENSIONS), dimensions: defaults::HASHING_DIMENSIONS }
    }
}

impl EmbeddingModel for HashingEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, texts: &[String]) -> MetricsResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
