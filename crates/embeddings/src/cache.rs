use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;

/// In-process LRU cache of embedding vectors keyed by a hash of
/// (model id, text).
///
/// Re-chunking a document reproduces identical chunk text, so cache hits
/// are common across re-ingestion runs within one process lifetime. A
/// vector whose dimension does not match the expected one is treated as
/// a miss.
pub struct EmbeddingCache {
    inner: LruCache<[u8; 32], Vec<f32>>,
    dimension: usize,
}

impl EmbeddingCache {
    /// Create a cache holding up to `capacity` vectors of `dimension`
    #[must_use]
    pub fn new(capacity: usize, dimension: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: LruCache::new(capacity),
            dimension,
        }
    }

    fn key(model_id: &str, text: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(model_id.as_bytes());
        hasher.update([0]);
        hasher.update(text.as_bytes());
        hasher.finalize().into()
    }

    /// Look up a cached vector
    pub fn get(&mut self, model_id: &str, text: &str) -> Option<Vec<f32>> {
        let vector = self.inner.get(&Self::key(model_id, text))?;
        if vector.len() != self.dimension {
            return None;
        }
        Some(vector.clone())
    }

    /// Store a vector; wrong-dimension vectors are rejected silently
    pub fn put(&mut self, model_id: &str, text: &str, vector: Vec<f32>) {
        if vector.len() != self.dimension {
            log::warn!(
                "Refusing to cache vector of dimension {} (expected {})",
                vector.len(),
                self.dimension
            );
            return;
        }
        self.inner.put(Self::key(model_id, text), vector);
    }

    /// Number of cached vectors
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
