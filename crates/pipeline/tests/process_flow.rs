use std::sync::Arc;
use tome_embeddings::{EmbeddingProvider, HashEmbedder};
use tome_graph::{EdgeType, GraphStore, InMemoryGraphStore, NodeKind};
use tome_pipeline::{
    DocumentMetadata, DocumentProcessor, PipelineConfig, PipelineError, ProcessingStatus,
};
use tome_structure::ChunkingStrategy;

/// Delegates to the hash embedder but fails any batch containing the
/// poison token, so exactly one chunk ends a run unembedded.
struct PoisonGuard {
    inner: HashEmbedder,
    token: &'static str,
}

#[async_trait::async_trait]
impl EmbeddingProvider for PoisonGuard {
    async fn embed_batch(&self, texts: &[String]) -> tome_embeddings::Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.contains(self.token)) {
            return Err(tome_embeddings::EmbeddingError::Terminal(
                "unembeddable content".to_string(),
            ));
        }
        self.inner.embed_batch(texts).await
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_id(&self) -> &str {
        "poison-guard"
    }
}

fn structured_text(chapters: u32) -> String {
    let mut text = String::new();
    for chapter in 1..=chapters {
        text.push_str(&format!("Chapter {chapter}: Topic {chapter}\n\n"));
        for i in 0..8 {
            text.push_str(&format!(
                "Sentence {i} of chapter {chapter} explains the material step by step. "
            ));
        }
        text.push_str("\n\n");
    }
    text
}

fn processor_with_store(
    provider: Arc<dyn EmbeddingProvider>,
) -> (DocumentProcessor, Arc<InMemoryGraphStore>) {
    let store = Arc::new(InMemoryGraphStore::new());
    let processor =
        DocumentProcessor::new(provider, store.clone(), PipelineConfig::default())
            .expect("processor");
    (processor, store)
}

#[tokio::test]
async fn two_chapter_document_builds_content_aware_graph() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (mut processor, store) = processor_with_store(Arc::new(HashEmbedder::new(64)));
    let metadata = DocumentMetadata::new("Intro Course").with_subject("math");

    let report = processor
        .process(&structured_text(2), &metadata)
        .await
        .expect("process");

    assert_eq!(report.status, ProcessingStatus::Success);
    assert_eq!(report.strategy_used, ChunkingStrategy::ContentAware);
    assert_eq!(report.counts.chapters, 2);
    assert!(report.counts.chunks > 0);
    assert_eq!(report.counts.vectors_indexed, report.counts.chunks);
    assert!(report.quality.expect("quality").overall_quality_score >= 0.3);

    assert_eq!(
        store.node_count(Some(NodeKind::Chapter)).await.expect("count"),
        2
    );
    assert_eq!(
        store.edge_count(Some(EdgeType::Precedes)).await.expect("count"),
        1
    );
}

#[tokio::test]
async fn unstructured_document_falls_back_to_overlap_windows() {
    let (mut processor, _store) = processor_with_store(Arc::new(HashEmbedder::new(64)));

    // 2000 chars, no sentence terminators, no structure markers
    let text = "abcde ".repeat(334)[..2000].to_string();
    let report = processor
        .process(&text, &DocumentMetadata::new("Notes"))
        .await
        .expect("process");

    assert_eq!(report.status, ProcessingStatus::Success);
    assert_eq!(report.strategy_used, ChunkingStrategy::Fallback);
    // Windows of 400 stepping by 200: starts at 0, 200, ..., 1600
    assert_eq!(report.counts.chunks, 9);
    assert_eq!(report.counts.chapters, 0);
    assert_eq!(report.counts.sections, 0);
}

#[tokio::test]
async fn one_failed_embedding_degrades_to_partial_success() {
    let provider = Arc::new(PoisonGuard {
        inner: HashEmbedder::new(64),
        token: "zzquarantinezz",
    });
    let (mut processor, store) = processor_with_store(provider);

    let mut text = structured_text(10);
    text = text.replace(
        "Sentence 3 of chapter 7",
        "Sentence 3 zzquarantinezz of chapter 7",
    );

    let report = processor
        .process(&text, &DocumentMetadata::new("Big Course"))
        .await
        .expect("process");

    assert_eq!(report.status, ProcessingStatus::PartialSuccess);
    assert_eq!(report.embedding.failed, 1);
    assert_eq!(report.unembedded_chunks(), 1);
    assert_eq!(report.counts.vectors_indexed, report.counts.chunks - 1);

    // The unembedded chunk is still in the graph
    assert_eq!(
        store.node_count(Some(NodeKind::Chunk)).await.expect("count"),
        report.counts.chunks
    );
}

#[tokio::test]
async fn reprocessing_same_textbook_is_idempotent() {
    let (mut processor, store) = processor_with_store(Arc::new(HashEmbedder::new(64)));
    let metadata = DocumentMetadata::new("Stable Book").with_textbook_id("book-stable");
    let text = structured_text(3);

    let first = processor.process(&text, &metadata).await.expect("first");
    let nodes = store.node_count(None).await.expect("count");
    let edges = store.edge_count(None).await.expect("count");

    let second = processor.process(&text, &metadata).await.expect("second");

    assert_eq!(first.counts, second.counts);
    assert_eq!(store.node_count(None).await.expect("count"), nodes);
    assert_eq!(store.edge_count(None).await.expect("count"), edges);
}

#[tokio::test]
async fn search_returns_ranked_filtered_hits() {
    let (mut processor, _store) = processor_with_store(Arc::new(HashEmbedder::new(64)));
    let metadata = DocumentMetadata::new("Searchable").with_subject("physics");

    processor
        .process(&structured_text(3), &metadata)
        .await
        .expect("process");

    let result = processor
        .search_similar("chapter 2 explains the material", 0.1, 5)
        .await
        .expect("search");

    assert!(!result.hits.is_empty());
    assert!(result.hits.iter().all(|h| h.score >= 0.1));
    for pair in result.hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    assert_eq!(result.hits[0].subject.as_deref(), Some("physics"));
}

#[tokio::test]
async fn forced_strategy_bypasses_assessment() {
    let (mut processor, _store) = processor_with_store(Arc::new(HashEmbedder::new(64)));

    let report = processor
        .process_forced(
            &structured_text(3),
            &DocumentMetadata::new("Forced"),
            ChunkingStrategy::Fallback,
        )
        .await
        .expect("process");

    assert_eq!(report.strategy_used, ChunkingStrategy::Fallback);
    assert!(report.quality.is_none());
}

#[tokio::test]
async fn empty_text_is_rejected() {
    let (mut processor, _store) = processor_with_store(Arc::new(HashEmbedder::new(64)));
    let result = processor
        .process("   \n  ", &DocumentMetadata::new("Empty"))
        .await;
    assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
}
