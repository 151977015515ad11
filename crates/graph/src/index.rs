use crate::error::Result;
use crate::store::GraphStore;
use crate::types::Similarity;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Vector index parameters.
///
/// The dimension must match the embedding provider's output; the store
/// rejects mismatched vectors at upsert time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub dimension: usize,
    pub similarity: Similarity,
}

impl IndexConfig {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            similarity: Similarity::default(),
        }
    }

    /// Builder: override the similarity function
    #[must_use]
    pub const fn with_similarity(mut self, similarity: Similarity) -> Self {
        self.similarity = similarity;
        self
    }
}

/// Declares and maintains the similarity index over chunk embeddings
pub struct VectorIndexManager {
    store: Arc<dyn GraphStore>,
    config: IndexConfig,
}

impl VectorIndexManager {
    #[must_use]
    pub fn new(store: Arc<dyn GraphStore>, config: IndexConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub const fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Declare the index. Safe to repeat; the store recreates it only
    /// when parameters changed.
    pub async fn ensure(&self) -> Result<()> {
        self.store
            .ensure_vector_index(self.config.dimension, self.config.similarity)
            .await
    }

    /// Whether the store can answer vector queries right now
    pub async fn is_ready(&self) -> bool {
        self.store.vector_index_ready().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryGraphStore;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_ensure_is_repeatable() {
        let store = Arc::new(InMemoryGraphStore::new());
        let manager = VectorIndexManager::new(store.clone(), IndexConfig::new(4));

        assert!(!manager.is_ready().await);
        manager.ensure().await.unwrap();
        manager.ensure().await.unwrap();
        assert!(manager.is_ready().await);

        store.upsert_vector("c1", &[1.0, 0.0, 0.0, 0.0]).await.unwrap();
        let hits = store.vector_query(&[1.0, 0.0, 0.0, 0.0], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_config_builder() {
        let config = IndexConfig::new(384).with_similarity(Similarity::DotProduct);
        assert_eq!(config.dimension, 384);
        assert_eq!(config.similarity, Similarity::DotProduct);
    }
}
