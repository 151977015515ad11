use crate::error::{PipelineError, Result};
use crate::report::{DocumentMetadata, ProcessingReport, ProcessingStatus};
use std::sync::Arc;
use std::time::Instant;
use tome_chunker::{ChunkRequest, ChunkerConfig, ChunkingStats, ContentChunker};
use tome_embeddings::{EmbeddingConfig, EmbeddingPipeline, EmbeddingProvider};
use tome_graph::{
    GraphIngestion, GraphSearch, GraphStore, IndexConfig, IngestionConfig, IngestionCounts,
    ProcessedDocument, VectorIndexManager, VectorSearchResult,
};
use tome_structure::{
    AssessorConfig, ChunkingStrategy, DetectorConfig, StructureDetector, StructureElement,
};

/// Configuration for the whole processing pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub detector: DetectorConfig,
    pub chunker: ChunkerConfig,
    pub assessor: AssessorConfig,
    pub embedding: EmbeddingConfig,
    pub ingestion: IngestionConfig,
}

/// End-to-end document processor.
///
/// Runs the full downstream flow for one document: structure detection,
/// quality-driven chunking, embedding, index declaration and graph
/// ingestion, then answers similarity queries against the result.
///
/// Embedding failures degrade, never abort: chunks left unembedded are
/// ingested without vectors and the run reports partial success.
pub struct DocumentProcessor {
    detector: StructureDetector,
    chunker: ContentChunker,
    embedder: EmbeddingPipeline,
    ingestion: GraphIngestion,
    index: VectorIndexManager,
    search: GraphSearch,
}

impl DocumentProcessor {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn GraphStore>,
        config: PipelineConfig,
    ) -> Result<Self> {
        let chunker = ContentChunker::new(config.chunker, config.assessor)?;
        let embedder = EmbeddingPipeline::new(provider, config.embedding)?;
        let index = VectorIndexManager::new(store.clone(), IndexConfig::new(embedder.dimension()));
        Ok(Self {
            detector: StructureDetector::new(config.detector),
            chunker,
            embedder,
            ingestion: GraphIngestion::with_config(store.clone(), config.ingestion),
            index,
            search: GraphSearch::new(store),
        })
    }

    /// Process one document end to end, detecting structure from the
    /// text.
    pub async fn process(
        &mut self,
        text: &str,
        metadata: &DocumentMetadata,
    ) -> Result<ProcessingReport> {
        let elements = self.detector.detect(text);
        self.run(text, metadata, elements, None).await
    }

    /// Process with a pre-extracted structure element list, skipping
    /// detection.
    pub async fn process_extracted(
        &mut self,
        text: &str,
        metadata: &DocumentMetadata,
        elements: Vec<StructureElement>,
    ) -> Result<ProcessingReport> {
        self.run(text, metadata, elements, None).await
    }

    /// Process with a forced chunking strategy, bypassing quality
    /// assessment.
    pub async fn process_forced(
        &mut self,
        text: &str,
        metadata: &DocumentMetadata,
        strategy: ChunkingStrategy,
    ) -> Result<ProcessingReport> {
        let elements = self.detector.detect(text);
        self.run(text, metadata, elements, Some(strategy)).await
    }

    async fn run(
        &mut self,
        text: &str,
        metadata: &DocumentMetadata,
        elements: Vec<StructureElement>,
        forced: Option<ChunkingStrategy>,
    ) -> Result<ProcessingReport> {
        if text.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "document text is empty".to_string(),
            ));
        }

        let started = Instant::now();
        let textbook_id = metadata.resolve_textbook_id();

        let mut request = ChunkRequest::new(text, textbook_id.clone())
            .with_elements(elements.clone());
        request.metadata = metadata.as_map();
        if let Some(strategy) = forced {
            request = request.with_forced_strategy(strategy);
        }

        let mut outcome = self.chunker.chunk_content(request).await?;
        if outcome.chunks.is_empty() {
            log::warn!("'{}' produced no chunks", metadata.title);
            return Ok(ProcessingReport {
                textbook_id,
                status: ProcessingStatus::Failed,
                strategy_used: outcome.strategy_used,
                quality: outcome.quality_assessment,
                counts: IngestionCounts::default(),
                embedding: tome_embeddings::EmbeddingReport::default(),
                processing_time_ms: started.elapsed().as_millis() as u64,
            });
        }

        let embedding = self.embedder.embed_chunks(&mut outcome.chunks).await;
        self.index.ensure().await?;

        let document = ProcessedDocument {
            textbook_id: textbook_id.clone(),
            title: metadata.title.clone(),
            subject: metadata.subject.clone(),
            authors: metadata.authors.clone(),
            source_file: metadata.source_file.clone(),
            elements,
            chunks: outcome.chunks,
            prerequisites: Vec::new(),
        };
        let counts = self.ingestion.ingest(&document).await?;

        let status = if embedding.is_complete() {
            ProcessingStatus::Success
        } else {
            ProcessingStatus::PartialSuccess
        };

        let report = ProcessingReport {
            textbook_id,
            status,
            strategy_used: outcome.strategy_used,
            quality: outcome.quality_assessment,
            counts,
            embedding,
            processing_time_ms: started.elapsed().as_millis() as u64,
        };
        log::info!("Processed '{}': {}", metadata.title, report.summary());
        Ok(report)
    }

    /// Embed the query text and run a similarity search over ingested
    /// chunks.
    pub async fn search_similar(
        &mut self,
        query: &str,
        min_score: f32,
        limit: usize,
    ) -> Result<VectorSearchResult> {
        let embedding = self.embedder.embed_query(query).await?;
        Ok(self.search.vector_search(&embedding, min_score, limit).await?)
    }

    /// Read-only graph query layer for traversal callers
    #[must_use]
    pub const fn graph_search(&self) -> &GraphSearch {
        &self.search
    }

    /// Running chunking statistics for this processor instance
    #[must_use]
    pub const fn chunking_statistics(&self) -> &ChunkingStats {
        self.chunker.statistics()
    }
}
