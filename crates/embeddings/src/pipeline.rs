use crate::cache::EmbeddingCache;
use crate::error::{EmbeddingError, Result};
use crate::provider::EmbeddingProvider;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tome_chunker::Chunk;

/// Configuration for the embedding stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Chunks per provider call
    pub batch_size: usize,

    /// Retries after the first failed attempt
    pub max_retries: usize,

    /// First backoff delay; doubles per retry
    pub initial_backoff_ms: u64,

    /// Per-call timeout
    pub timeout_ms: u64,

    /// In-process vector cache capacity
    pub cache_capacity: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            max_retries: 3,
            initial_backoff_ms: 100,
            timeout_ms: 10_000,
            cache_capacity: 2048,
        }
    }
}

impl EmbeddingConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "batch_size must be > 0".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Shared circuit-breaker flag.
///
/// Collaborators that also call the provider (the LLM services outside
/// this core) may trip it during outages; the pipeline only reads it and
/// skips provider calls while it is open.
#[derive(Debug, Default)]
pub struct CircuitBreaker {
    open: AtomicBool,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }

    pub fn trip(&self) {
        self.open.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.open.store(false, Ordering::Relaxed);
    }
}

/// Outcome counts for one embedding pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingReport {
    /// Vectors obtained from the provider
    pub embedded: usize,

    /// Vectors served from the in-process cache
    pub from_cache: usize,

    /// Chunks left unembedded after retry exhaustion
    pub failed: usize,

    /// Chunks skipped because the circuit breaker was open
    pub skipped: usize,
}

impl EmbeddingReport {
    /// Whether every requested chunk ended up with a vector
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }
}

/// Maps chunk text to fixed-dimension vectors via the provider, with
/// batching, caching, timeout, retry and graceful per-chunk failure.
pub struct EmbeddingPipeline {
    provider: Arc<dyn EmbeddingProvider>,
    config: EmbeddingConfig,
    cache: EmbeddingCache,
    breaker: Arc<CircuitBreaker>,
}

impl EmbeddingPipeline {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: EmbeddingConfig) -> Result<Self> {
        config.validate()?;
        let cache = EmbeddingCache::new(config.cache_capacity, provider.dimension());
        Ok(Self {
            provider,
            config,
            cache,
            breaker: Arc::new(CircuitBreaker::new()),
        })
    }

    /// Share an externally owned circuit breaker
    #[must_use]
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    /// Provider output dimension
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    /// Attach embeddings to every chunk that lacks one.
    ///
    /// Failures are per-chunk: a batch that fails terminally is retried
    /// item by item so one poison chunk cannot take its batch mates down
    /// with it. Chunks that still fail keep `embedding = None` and are
    /// reported, never propagated as an error.
    pub async fn embed_chunks(&mut self, chunks: &mut [Chunk]) -> EmbeddingReport {
        let mut report = EmbeddingReport::default();

        let pending: Vec<usize> = chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| c.embedding.is_none() && !c.text.trim().is_empty())
            .map(|(i, _)| i)
            .collect();

        if pending.is_empty() {
            return report;
        }

        if self.breaker.is_open() {
            log::warn!(
                "Circuit breaker open; skipping embedding of {} chunks",
                pending.len()
            );
            report.skipped = pending.len();
            return report;
        }

        // Cache pass first
        let model_id = self.provider.model_id().to_string();
        let mut misses: Vec<usize> = Vec::new();
        for &idx in &pending {
            if let Some(vector) = self.cache.get(&model_id, &chunks[idx].text) {
                chunks[idx].embedding = Some(vector);
                report.from_cache += 1;
            } else {
                misses.push(idx);
            }
        }

        for batch in misses.chunks(self.config.batch_size) {
            if self.breaker.is_open() {
                report.skipped += batch.len();
                continue;
            }

            let texts: Vec<String> = batch.iter().map(|&i| chunks[i].text.clone()).collect();
            match self.call_provider(&texts).await {
                Ok(vectors) => {
                    self.attach(chunks, batch, vectors, &model_id, &mut report);
                }
                Err(e) if batch.len() > 1 => {
                    // Isolate the poison chunk: retry one by one
                    log::warn!("Batch embedding failed ({e}); retrying items individually");
                    for &idx in batch {
                        let single = vec![chunks[idx].text.clone()];
                        match self.call_provider(&single).await {
                            Ok(vectors) => {
                                self.attach(chunks, &[idx], vectors, &model_id, &mut report);
                            }
                            Err(e) => {
                                log::warn!(
                                    "Chunk {} left unembedded: {e}",
                                    chunks[idx].chunk_id
                                );
                                report.failed += 1;
                            }
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Chunk {} left unembedded: {e}", chunks[batch[0]].chunk_id);
                    report.failed += 1;
                }
            }
        }

        log::info!(
            "Embedding pass: {} embedded, {} cached, {} failed, {} skipped",
            report.embedded,
            report.from_cache,
            report.failed,
            report.skipped
        );
        report
    }

    /// Embed a single query text (for search callers)
    pub async fn embed_query(&mut self, text: &str) -> Result<Vec<f32>> {
        if self.breaker.is_open() {
            return Err(EmbeddingError::CircuitOpen);
        }
        let model_id = self.provider.model_id().to_string();
        if let Some(vector) = self.cache.get(&model_id, text) {
            return Ok(vector);
        }
        let mut vectors = self.call_provider(&[text.to_string()]).await?;
        let vector = vectors.pop().ok_or_else(|| {
            EmbeddingError::Terminal("provider returned no vector for query".to_string())
        })?;
        self.check_dimension(&vector)?;
        self.cache.put(&model_id, text, vector.clone());
        Ok(vector)
    }

    fn attach(
        &mut self,
        chunks: &mut [Chunk],
        indices: &[usize],
        vectors: Vec<Vec<f32>>,
        model_id: &str,
        report: &mut EmbeddingReport,
    ) {
        let received = vectors.len();
        for (&idx, vector) in indices.iter().zip(vectors.into_iter()) {
            if let Err(e) = self.check_dimension(&vector) {
                log::warn!("Dropping vector for chunk {}: {e}", chunks[idx].chunk_id);
                report.failed += 1;
                continue;
            }
            self.cache.put(model_id, &chunks[idx].text, vector.clone());
            chunks[idx].embedding = Some(vector);
            report.embedded += 1;
        }
        // A short provider response leaves the tail unembedded
        if received < indices.len() {
            let missing = indices.len() - received;
            log::warn!(
                "Provider returned {received} vectors for {} texts; {missing} chunks left unembedded",
                indices.len()
            );
            report.failed += missing;
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        let expected = self.provider.dimension();
        if vector.len() != expected {
            return Err(EmbeddingError::InvalidDimension {
                expected,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// One provider call with timeout, bounded retry and exponential
    /// backoff. Terminal errors return immediately.
    async fn call_provider(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let mut backoff = Duration::from_millis(self.config.initial_backoff_ms);

        for attempt in 0..=self.config.max_retries {
            let result = match tokio::time::timeout(timeout, self.provider.embed_batch(texts)).await
            {
                Ok(result) => result,
                Err(_) => Err(EmbeddingError::Timeout(self.config.timeout_ms)),
            };

            match result {
                Ok(vectors) => return Ok(vectors),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    log::debug!(
                        "Embedding attempt {}/{} failed ({e}); backing off {:?}",
                        attempt + 1,
                        self.config.max_retries + 1,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(e),
            }
        }

        unreachable!("retry loop always returns")
    }
}
