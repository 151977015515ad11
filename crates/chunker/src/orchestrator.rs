use crate::config::ChunkerConfig;
use crate::content_aware::ContentAwareChunker;
use crate::error::{ChunkerError, Result};
use crate::fallback::FallbackChunker;
use crate::stats::ChunkingStats;
use crate::types::Chunk;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tome_structure::{
    AssessorConfig, ChunkingStrategy, QualityAssessment, StructureElement,
    StructureQualityAssessor,
};

/// One document to be chunked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRequest {
    pub text: String,
    pub book_id: String,
    pub structure_elements: Vec<StructureElement>,

    /// Free-form document metadata (title, subject, source file)
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Pre-cleaning text length, when the caller cleaned the text itself.
    /// Defaults to the cleaned length (retention ratio 1.0).
    #[serde(default)]
    pub original_len: Option<usize>,

    /// Skip quality assessment and use this strategy
    #[serde(default)]
    pub forced_strategy: Option<ChunkingStrategy>,
}

impl ChunkRequest {
    #[must_use]
    pub fn new(text: impl Into<String>, book_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            book_id: book_id.into(),
            structure_elements: Vec::new(),
            metadata: HashMap::new(),
            original_len: None,
            forced_strategy: None,
        }
    }

    /// Builder: attach detected structure
    #[must_use]
    pub fn with_elements(mut self, elements: Vec<StructureElement>) -> Self {
        self.structure_elements = elements;
        self
    }

    /// Builder: force a strategy, bypassing the quality assessor
    #[must_use]
    pub const fn with_forced_strategy(mut self, strategy: ChunkingStrategy) -> Self {
        self.forced_strategy = Some(strategy);
        self
    }
}

/// Result of chunking one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingOutcome {
    pub book_id: String,
    pub chunks: Vec<Chunk>,

    /// The strategy that actually produced the chunks (hybrid resolves to
    /// one of the two concrete strategies)
    pub strategy_used: ChunkingStrategy,

    /// Present unless the caller forced a strategy
    pub quality_assessment: Option<QualityAssessment>,

    pub processing_time_ms: u64,
}

/// Orchestrator that selects and executes a chunking strategy per
/// document or per batch.
///
/// Holds running statistics scoped to this instance; batch items run
/// concurrently with bounded fan-out and their stats are merged in after
/// the batch completes. A failure in one batch item is captured in that
/// item's result slot and never aborts the others.
pub struct ContentChunker {
    config: ChunkerConfig,
    assessor_config: AssessorConfig,
    stats: ChunkingStats,
}

impl ContentChunker {
    pub fn new(config: ChunkerConfig, assessor_config: AssessorConfig) -> Result<Self> {
        config.validate()?;
        assessor_config
            .validate()
            .map_err(|e| ChunkerError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            config,
            assessor_config,
            stats: ChunkingStats::new(),
        })
    }

    /// Chunk a single document.
    pub async fn chunk_content(&mut self, request: ChunkRequest) -> Result<ChunkingOutcome> {
        let outcome =
            Self::chunk_core(self.config.clone(), self.assessor_config.clone(), request).await?;
        self.stats
            .record(outcome.strategy_used, outcome.chunks.len());
        Ok(outcome)
    }

    /// Chunk a batch of independent documents with bounded concurrency.
    ///
    /// Results come back in request order; each slot carries its own
    /// success or failure. Callers correlate by `book_id`.
    pub async fn chunk_batch(
        &mut self,
        requests: Vec<ChunkRequest>,
    ) -> Vec<Result<ChunkingOutcome>> {
        let max_concurrent = self.config.max_workers.max(1);
        let mut results = Vec::with_capacity(requests.len());
        let mut batch_stats = ChunkingStats::new();

        for request_batch in requests.chunks(max_concurrent) {
            let mut tasks = Vec::with_capacity(request_batch.len());
            for request in request_batch {
                let config = self.config.clone();
                let assessor_config = self.assessor_config.clone();
                let request = request.clone();
                tasks.push(tokio::spawn(Self::chunk_core(
                    config,
                    assessor_config,
                    request,
                )));
            }

            for task in tasks {
                match task.await {
                    Ok(Ok(outcome)) => {
                        batch_stats.record(outcome.strategy_used, outcome.chunks.len());
                        results.push(Ok(outcome));
                    }
                    Ok(Err(e)) => results.push(Err(e)),
                    Err(e) => results.push(Err(ChunkerError::TaskFailed(format!(
                        "batch item panicked: {e}"
                    )))),
                }
            }
        }

        self.stats.merge(&batch_stats);
        results
    }

    /// Current running statistics
    #[must_use]
    pub const fn statistics(&self) -> &ChunkingStats {
        &self.stats
    }

    /// Clear running statistics
    pub fn reset_statistics(&mut self) {
        self.stats.reset();
    }

    /// Strategy selection plus execution for one document. Stateless so
    /// batch workers can run it without sharing the orchestrator.
    async fn chunk_core(
        config: ChunkerConfig,
        assessor_config: AssessorConfig,
        request: ChunkRequest,
    ) -> Result<ChunkingOutcome> {
        if request.book_id.trim().is_empty() {
            return Err(ChunkerError::InvalidInput("book_id is empty".to_string()));
        }

        let started = Instant::now();
        let cleaned_len = request.text.len();
        let original_len = request.original_len.unwrap_or(cleaned_len).max(cleaned_len);

        let assessment = StructureQualityAssessor::new(assessor_config).assess(
            &request.structure_elements,
            original_len,
            cleaned_len,
        );

        let selected = match request.forced_strategy {
            Some(strategy) => strategy,
            // Without structure there are no boundaries to respect
            None if request.structure_elements.is_empty() => ChunkingStrategy::Fallback,
            None if config.enable_hybrid => ChunkingStrategy::Hybrid,
            None => assessment.recommended_strategy,
        };

        let (chunks, strategy_used) = match selected {
            ChunkingStrategy::ContentAware => {
                let chunks = ContentAwareChunker::new(config.clone())
                    .chunk(&request.text, &request.book_id, &request.structure_elements)
                    .await;
                (chunks, ChunkingStrategy::ContentAware)
            }
            ChunkingStrategy::Fallback => {
                let chunks =
                    FallbackChunker::new(config.clone()).chunk(&request.text, &request.book_id);
                (chunks, ChunkingStrategy::Fallback)
            }
            ChunkingStrategy::Hybrid => {
                let aware = ContentAwareChunker::new(config.clone())
                    .chunk(&request.text, &request.book_id, &request.structure_elements)
                    .await;
                let fallback =
                    FallbackChunker::new(config.clone()).chunk(&request.text, &request.book_id);
                Self::pick_hybrid(aware, fallback)
            }
        };

        let quality_assessment = if request.forced_strategy.is_some() {
            None
        } else {
            Some(assessment)
        };

        log::info!(
            "Chunked '{}': {} chunks via {}",
            request.book_id,
            chunks.len(),
            strategy_used.as_str()
        );

        Ok(ChunkingOutcome {
            book_id: request.book_id,
            chunks,
            strategy_used,
            quality_assessment,
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Hybrid selection: keep the run with the lower chunk-size variance
    /// (coefficient of variation); ties and empty content-aware output go
    /// to fallback's disadvantage only when it is also empty.
    fn pick_hybrid(
        aware: Vec<Chunk>,
        fallback: Vec<Chunk>,
    ) -> (Vec<Chunk>, ChunkingStrategy) {
        if aware.is_empty() {
            return (fallback, ChunkingStrategy::Fallback);
        }
        if fallback.is_empty() {
            return (aware, ChunkingStrategy::ContentAware);
        }
        let aware_cov = size_variation(&aware);
        let fallback_cov = size_variation(&fallback);
        if aware_cov <= fallback_cov {
            (aware, ChunkingStrategy::ContentAware)
        } else {
            (fallback, ChunkingStrategy::Fallback)
        }
    }
}

/// Coefficient of variation of chunk sizes
fn size_variation(chunks: &[Chunk]) -> f64 {
    let n = chunks.len() as f64;
    let mean = chunks.iter().map(|c| c.len() as f64).sum::<f64>() / n;
    if mean == 0.0 {
        return f64::INFINITY;
    }
    let variance = chunks
        .iter()
        .map(|c| {
            let d = c.len() as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance.sqrt() / mean
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tome_structure::{DetectorConfig, StructureDetector};

    fn structured_text() -> String {
        let mut text = String::new();
        for chapter in 1..=3 {
            text.push_str(&format!("Chapter {chapter}: Topic {chapter}\n\n"));
            for i in 0..25 {
                text.push_str(&format!(
                    "Sentence {i} of chapter {chapter} explains the topic carefully. "
                ));
            }
            text.push_str("\n\n");
        }
        text
    }

    fn chunker() -> ContentChunker {
        ContentChunker::new(ChunkerConfig::default(), AssessorConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_elements_always_fallback() {
        let mut chunker = chunker();
        let request = ChunkRequest::new("Some unstructured prose here. ".repeat(30), "book-1");
        let outcome = chunker.chunk_content(request).await.unwrap();
        assert_eq!(outcome.strategy_used, ChunkingStrategy::Fallback);
        assert!(outcome.quality_assessment.is_some());
    }

    #[tokio::test]
    async fn test_structured_text_selects_content_aware() {
        let text = structured_text();
        let elements = StructureDetector::new(DetectorConfig::default()).detect(&text);
        assert!(elements.len() >= 3);

        let mut chunker = chunker();
        let outcome = chunker
            .chunk_content(ChunkRequest::new(text, "book-1").with_elements(elements))
            .await
            .unwrap();

        assert_eq!(outcome.strategy_used, ChunkingStrategy::ContentAware);
        let quality = outcome.quality_assessment.unwrap();
        assert!(quality.overall_quality_score >= 0.3);
        assert!(!outcome.chunks.is_empty());
    }

    #[tokio::test]
    async fn test_forced_strategy_bypasses_assessment() {
        let text = structured_text();
        let elements = StructureDetector::new(DetectorConfig::default()).detect(&text);

        let mut chunker = chunker();
        let outcome = chunker
            .chunk_content(
                ChunkRequest::new(text, "book-1")
                    .with_elements(elements)
                    .with_forced_strategy(ChunkingStrategy::Fallback),
            )
            .await
            .unwrap();

        assert_eq!(outcome.strategy_used, ChunkingStrategy::Fallback);
        assert!(outcome.quality_assessment.is_none());
    }

    #[tokio::test]
    async fn test_statistics_track_documents_and_reset() {
        let mut chunker = chunker();
        chunker
            .chunk_content(ChunkRequest::new("plain text here. ".repeat(40), "a"))
            .await
            .unwrap();
        let text = structured_text();
        let elements = StructureDetector::new(DetectorConfig::default()).detect(&text);
        chunker
            .chunk_content(ChunkRequest::new(text, "b").with_elements(elements))
            .await
            .unwrap();

        let stats = chunker.statistics();
        assert_eq!(stats.total_documents, 2);
        assert_eq!(stats.fallback_used, 1);
        assert_eq!(stats.content_aware_used, 1);
        assert!(stats.total_chunks_created > 0);

        chunker.reset_statistics();
        assert_eq!(chunker.statistics().total_documents, 0);
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let mut chunker = chunker();
        let good = ChunkRequest::new("Decent text for chunking. ".repeat(20), "good");
        let bad = ChunkRequest::new("text", ""); // empty book_id
        let results = chunker.chunk_batch(vec![good, bad]).await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(chunker.statistics().total_documents, 1);
    }

    #[tokio::test]
    async fn test_batch_results_in_request_order() {
        let mut chunker = chunker();
        let requests: Vec<ChunkRequest> = (0..7)
            .map(|i| ChunkRequest::new("Batch text body here. ".repeat(25), format!("book-{i}")))
            .collect();
        let results = chunker.chunk_batch(requests).await;

        let ids: Vec<String> = results
            .iter()
            .map(|r| r.as_ref().unwrap().book_id.clone())
            .collect();
        let expected: Vec<String> = (0..7).map(|i| format!("book-{i}")).collect();
        assert_eq!(ids, expected);
        assert_eq!(chunker.statistics().total_documents, 7);
    }

    #[tokio::test]
    async fn test_empty_book_id_rejected() {
        let mut chunker = chunker();
        let result = chunker.chunk_content(ChunkRequest::new("text", "  ")).await;
        assert!(matches!(result, Err(ChunkerError::InvalidInput(_))));
    }

    #[test]
    fn test_size_variation() {
        let uniform: Vec<Chunk> = (0..4)
            .map(|i| Chunk {
                chunk_id: format!("c{i}"),
                text: "x".repeat(100),
                content_type: crate::types::ContentType::Prose,
                chapter: None,
                section: None,
                concepts: vec![],
                difficulty_score: 0.3,
                confidence_score: 1.0,
                embedding: None,
            })
            .collect();
        assert!(size_variation(&uniform) < 1e-9);

        let mut skewed = uniform.clone();
        skewed[0].text = "x".repeat(500);
        assert!(size_variation(&skewed) > size_variation(&uniform));
    }
}
