use crate::error::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// External embedding provider collaborator.
///
/// Implementations wrap whatever service produces the vectors; the
/// pipeline only assumes `embed_batch` is fallible and that `dimension`
/// is fixed for the provider's lifetime.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Output vector dimension
    fn dimension(&self) -> usize;

    /// Identifier for cache keying and logging
    fn model_id(&self) -> &str;
}

/// Deterministic offline embedder: token hashing into a fixed number of
/// buckets, L2-normalized.
///
/// Not a semantic model — it exists so the pipeline, store and tests run
/// without network access, and so identical text always embeds
/// identically. Texts sharing many tokens land near each other, which is
/// enough signal for similarity-ranking tests.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text.split_whitespace() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric());
            if token.is_empty() {
                continue;
            }
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let bucket = usize::from(digest[0]) << 8 | usize::from(digest[1]);
            let sign = if digest[2] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket % self.dimension] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        "hash-embedder"
    }
}

/// Cosine similarity between two vectors of equal length
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_embedder_deterministic() {
        let embedder = HashEmbedder::new(64);
        let texts = vec!["the quick brown fox".to_string()];
        let a = embedder.embed_batch(&texts).await.unwrap();
        let b = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 64);
    }

    #[tokio::test]
    async fn test_hash_embedder_normalized() {
        let embedder = HashEmbedder::new(128);
        let vectors = embedder
            .embed_batch(&["some words to embed here".to_string()])
            .await
            .unwrap();
        let norm: f32 = vectors[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_similar_texts_score_higher() {
        let embedder = HashEmbedder::new(256);
        let vectors = embedder
            .embed_batch(&[
                "eigenvalues of a symmetric matrix".to_string(),
                "eigenvalues of a hermitian matrix".to_string(),
                "boiling pasta for dinner tonight".to_string(),
            ])
            .await
            .unwrap();

        let close = cosine_similarity(&vectors[0], &vectors[1]);
        let far = cosine_similarity(&vectors[0], &vectors[2]);
        assert!(close > far, "close={close} far={far}");
    }

    #[test]
    fn test_cosine_similarity_edge_cases() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        let v = [0.6, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }
}
