//! Local dense encoder based on signed feature hashing

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;
use crate::providers::EmbeddingProvider;

use super::normalize;

/// Deterministic, corpus-independent dense encoder
///
/// Word unigrams and bigrams are hashed into `dimensions` buckets; the sign of
/// each contribution comes from the same digest so collisions tend to cancel.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dimensions: 384 }
    }
}

impl HashingEmbedder {
    /// Create an encoder with the given number of buckets (at least 1)
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Encode one text
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let words: Vec<String> = text.unicode_words().map(|w| w.to_lowercase()).collect();
        let mut vector = vec![0.0f32; self.dimensions];

        for word in &words {
            self.add_feature(&mut vector, word);
        }
        for pair in words.windows(2) {
            self.add_feature(&mut vector, &format!("{} {}", pair[0], pair[1]));
        }

        normalize(&mut vector);
        vector
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bucket = [0u8; 8];
        bucket.copy_from_slice(&digest[..8]);
        let index = (u64::from_le_bytes(bucket) % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[index] += sign;
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.encode(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.encode(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorize::cosine_similarity;

    #[test]
    fn test_deterministic() {
        let embedder = HashingEmbedder::default();
        let a = embedder.encode("Paris is the capital of France.");
        let b = embedder.encode("Paris is the capital of France.");
        assert_eq!(a, b);
        assert_eq!(a.len(), 384);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero() {
        let embedder = HashingEmbedder::new(16);
        assert_eq!(embedder.encode("  "), vec![0.0; 16]);
    }

    #[test]
    fn test_shared_words_score_higher() {
        let embedder = HashingEmbedder::new(256);
        let query = embedder.encode("capital of France");
        let related = embedder.encode("Paris is the capital of France");
        let unrelated = embedder.encode("bananas contain potassium");
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_provider_batch() {
        let embedder = HashingEmbedder::new(32);
        let texts = vec!["one".to_string(), "two".to_string()];
        let vectors = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], embedder.embed("one").await.unwrap());
        assert_eq!(embedder.dimensions(), 32);
        assert!(embedder.health_check().await.unwrap());
    }
}
