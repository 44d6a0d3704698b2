//! Chunk and query vectorization
//!
//! Two strategies are supported and never mixed within one index:
//!
//! - [`SparseVectorizer`]: corpus-wide TF-IDF, refit over every chunk on each
//!   ingestion so vectors depend on the whole corpus.
//! - [`HashingEmbedder`] (or any [`EmbeddingProvider`](crate::providers::EmbeddingProvider)):
//!   dense vectors computed independently per text.
//!
//! Both are compared with cosine similarity.

mod hashing;
mod stop_words;
mod tfidf;

pub use hashing::HashingEmbedder;
pub use stop_words::is_stop_word;
pub use tfidf::SparseVectorizer;

use serde::{Deserialize, Serialize};

/// Norms below this are treated as zero
const EPSILON: f32 = 1e-12;

/// Sparse vector over a vocabulary of known size
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    /// Term indices, strictly increasing
    pub indices: Vec<u32>,
    /// Weights, parallel to `indices`
    pub values: Vec<f32>,
    /// Vocabulary size the vector was produced against
    pub dimensions: usize,
}

impl SparseVector {
    /// Build from `(index, weight)` pairs; pairs are sorted and zero weights dropped
    pub fn from_pairs(mut pairs: Vec<(u32, f32)>, dimensions: usize) -> Self {
        pairs.sort_unstable_by_key(|(i, _)| *i);
        let (indices, values) = pairs.into_iter().filter(|(_, v)| *v != 0.0).unzip();
        Self {
            indices,
            values,
            dimensions,
        }
    }

    /// An all-zero vector
    pub fn zeros(dimensions: usize) -> Self {
        Self {
            dimensions,
            ..Default::default()
        }
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Euclidean norm
    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Dot product by merging the sorted index lists
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Scale to unit length; zero vectors are left unchanged
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > EPSILON {
            for v in &mut self.values {
                *v /= norm;
            }
        }
    }
}

/// A vector produced by one of the vectorizer strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Embedding {
    /// Dense embedding
    Dense(Vec<f32>),
    /// Sparse TF-IDF vector
    Sparse(SparseVector),
}

impl Embedding {
    /// Dimensionality of the vector space
    pub fn dimensions(&self) -> usize {
        match self {
            Embedding::Dense(v) => v.len(),
            Embedding::Sparse(v) => v.dimensions,
        }
    }

    /// Cosine similarity in `[-1, 1]`
    ///
    /// Vectors of different kinds or dimensions, and zero vectors, score 0.
    pub fn cosine(&self, other: &Embedding) -> f32 {
        match (self, other) {
            (Embedding::Dense(a), Embedding::Dense(b)) => cosine_similarity(a, b),
            (Embedding::Sparse(a), Embedding::Sparse(b)) => sparse_cosine(a, b),
            _ => 0.0,
        }
    }
}

/// Cosine similarity between two dense vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < EPSILON {
        return 0.0;
    }

    (dot / denom).clamp(-1.0, 1.0)
}

/// Cosine similarity between two sparse vectors
pub fn sparse_cosine(a: &SparseVector, b: &SparseVector) -> f32 {
    if a.dimensions != b.dimensions {
        return 0.0;
    }
    let denom = a.norm() * b.norm();
    if denom < EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0)
}

/// L2-normalize a dense vector in place; zero vectors are left unchanged
pub fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
