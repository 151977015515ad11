use serde::{Deserialize, Serialize};
use tome_structure::ChunkingStrategy;

/// Running statistics for one chunker instance.
///
/// Single-writer per instance: batch workers fill their own accumulator
/// and the orchestrator merges them after the batch completes, so no
/// counter is ever incremented from two tasks at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingStats {
    /// Documents processed
    pub total_documents: usize,

    /// Chunks produced across all documents
    pub total_chunks_created: usize,

    /// Documents chunked with the content-aware strategy
    pub content_aware_used: usize,

    /// Documents chunked with the fallback strategy
    pub fallback_used: usize,
}

impl ChunkingStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one document's outcome
    pub fn record(&mut self, strategy: ChunkingStrategy, chunks: usize) {
        self.total_documents += 1;
        self.total_chunks_created += chunks;
        match strategy {
            ChunkingStrategy::ContentAware => self.content_aware_used += 1,
            ChunkingStrategy::Fallback => self.fallback_used += 1,
            // Hybrid resolves to one of the two before recording; seeing
            // it here means the caller recorded the selection itself
            ChunkingStrategy::Hybrid => {}
        }
    }

    /// Merge another accumulator into this one
    pub fn merge(&mut self, other: &Self) {
        self.total_documents += other.total_documents;
        self.total_chunks_created += other.total_chunks_created;
        self.content_aware_used += other.content_aware_used;
        self.fallback_used += other.fallback_used;
    }

    /// Clear all counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_and_reset() {
        let mut stats = ChunkingStats::new();
        stats.record(ChunkingStrategy::ContentAware, 12);
        stats.record(ChunkingStrategy::Fallback, 9);

        assert_eq!(stats.total_documents, 2);
        assert_eq!(stats.total_chunks_created, 21);
        assert_eq!(stats.content_aware_used, 1);
        assert_eq!(stats.fallback_used, 1);

        stats.reset();
        assert_eq!(stats, ChunkingStats::default());
    }

    #[test]
    fn test_merge() {
        let mut a = ChunkingStats::new();
        a.record(ChunkingStrategy::ContentAware, 5);

        let mut b = ChunkingStats::new();
        b.record(ChunkingStrategy::Fallback, 7);
        b.record(ChunkingStrategy::Fallback, 3);

        a.merge(&b);
        assert_eq!(a.total_documents, 3);
        assert_eq!(a.total_chunks_created, 15);
        assert_eq!(a.fallback_used, 2);
    }
}
