use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tome_embeddings::EmbeddingReport;
use tome_graph::IngestionCounts;
use tome_structure::{ChunkingStrategy, QualityAssessment};

/// Caller-supplied description of the document being processed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub subject: Option<String>,
    pub authors: Vec<String>,
    pub source_file: Option<String>,

    /// Stable textbook id for re-ingestion; generated once when absent
    pub textbook_id: Option<String>,
}

impl DocumentMetadata {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Builder: set the subject
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Builder: pin the textbook id (re-ingestion of a known book)
    #[must_use]
    pub fn with_textbook_id(mut self, id: impl Into<String>) -> Self {
        self.textbook_id = Some(id.into());
        self
    }

    /// The id to ingest under; a fresh UUID when the caller did not pin
    /// one
    #[must_use]
    pub fn resolve_textbook_id(&self) -> String {
        self.textbook_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }

    /// Flatten into the free-form metadata map the chunker carries
    #[must_use]
    pub fn as_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("title".to_string(), self.title.clone());
        if let Some(subject) = &self.subject {
            map.insert("subject".to_string(), subject.clone());
        }
        if let Some(source_file) = &self.source_file {
            map.insert("source_file".to_string(), source_file.clone());
        }
        if !self.authors.is_empty() {
            map.insert("authors".to_string(), self.authors.join(", "));
        }
        map
    }
}

/// Overall outcome of one processing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingStatus {
    /// Every chunk embedded and ingested
    Success,
    /// Ingested, but some chunks lack embeddings and sit outside the
    /// vector index until re-embedded
    PartialSuccess,
    /// Nothing usable was produced
    Failed,
}

impl ProcessingStatus {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialSuccess => "partial_success",
            Self::Failed => "failed",
        }
    }
}

/// What one document-processing run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub textbook_id: String,
    pub status: ProcessingStatus,
    pub strategy_used: ChunkingStrategy,

    /// Absent when the caller forced a strategy
    pub quality: Option<QualityAssessment>,

    pub counts: IngestionCounts,
    pub embedding: EmbeddingReport,
    pub processing_time_ms: u64,
}

impl ProcessingReport {
    /// Chunks that ended the run without an embedding
    #[must_use]
    pub const fn unembedded_chunks(&self) -> usize {
        self.embedding.failed + self.embedding.skipped
    }

    /// One-line human-readable summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {} chapters, {} sections, {} concepts, {} chunks ({} indexed, {} unembedded) via {} in {} ms",
            self.status.as_str(),
            self.counts.chapters,
            self.counts.sections,
            self.counts.concepts,
            self.counts.chunks,
            self.counts.vectors_indexed,
            self.unembedded_chunks(),
            self.strategy_used.as_str(),
            self.processing_time_ms,
        )
    }
}
