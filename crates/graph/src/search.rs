use crate::error::{GraphError, Result};
use crate::store::GraphStore;
use crate::traversal::{prerequisite_traversal, TraversalHop};
use crate::types::{Direction, EdgeType, IndexStatus, NodeKey, SearchHit, VectorSearchResult};
use std::sync::Arc;

/// Read-only query layer: similarity search plus prerequisite traversal.
///
/// A missing vector index degrades to an empty result with
/// [`IndexStatus::Unavailable`] rather than an error, so callers can fall
/// back to lexical search.
pub struct GraphSearch {
    store: Arc<dyn GraphStore>,
}

impl GraphSearch {
    #[must_use]
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Top-`limit` chunks by embedding similarity, filtered by
    /// `score >= min_score`, ranked descending with chunk-id tie-break.
    pub async fn vector_search(
        &self,
        query: &[f32],
        min_score: f32,
        limit: usize,
    ) -> Result<VectorSearchResult> {
        let ranked = match self.store.vector_query(query, limit).await {
            Ok(ranked) => ranked,
            Err(GraphError::IndexUnavailable) => {
                log::warn!("Vector index unavailable; returning degraded result");
                return Ok(VectorSearchResult::unavailable());
            }
            Err(e) => return Err(e),
        };

        let mut hits = Vec::with_capacity(ranked.len());
        for (chunk_id, score) in ranked {
            if score < min_score {
                continue;
            }
            hits.push(self.hydrate_hit(&chunk_id, score).await?);
        }
        Ok(VectorSearchResult {
            status: IndexStatus::Ready,
            hits,
        })
    }

    /// Run [`Self::vector_search`] once per query embedding. Results are
    /// independent of ordering among queries.
    pub async fn bulk_vector_search(
        &self,
        queries: &[Vec<f32>],
        min_score: f32,
        limit_per_query: usize,
    ) -> Result<Vec<VectorSearchResult>> {
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            results.push(self.vector_search(query, min_score, limit_per_query).await?);
        }
        Ok(results)
    }

    /// Everything `start` requires first: bounded-depth backward walk
    /// over HAS_PREREQUISITE edges
    pub async fn get_prerequisite_chain(
        &self,
        start: &NodeKey,
        max_depth: usize,
    ) -> Result<Vec<TraversalHop>> {
        prerequisite_traversal(self.store.as_ref(), start, Direction::Outgoing, max_depth).await
    }

    /// Everything that requires `start`: the same walk forward
    pub async fn get_dependent_concepts(
        &self,
        start: &NodeKey,
        max_depth: usize,
    ) -> Result<Vec<TraversalHop>> {
        prerequisite_traversal(self.store.as_ref(), start, Direction::Incoming, max_depth).await
    }

    /// Build one hit from the chunk node's denormalized properties plus
    /// its direct prerequisites.
    async fn hydrate_hit(&self, chunk_id: &str, score: f32) -> Result<SearchHit> {
        let key = NodeKey::Chunk {
            chunk_id: chunk_id.to_string(),
        };
        let node = self
            .store
            .get_node(&key)
            .await?
            .ok_or_else(|| GraphError::NotFound(key.id()))?;

        let concept = node
            .properties
            .get("concepts")
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let mut prerequisites: Vec<String> = self
            .store
            .neighbors(&key, EdgeType::HasPrerequisite, Direction::Outgoing)
            .await?
            .into_iter()
            .map(|(neighbor, _)| match neighbor {
                NodeKey::Concept { name, .. } => name,
                NodeKey::Chunk { chunk_id } => chunk_id,
                other => other.id(),
            })
            .collect();
        prerequisites.sort();

        Ok(SearchHit {
            id: chunk_id.to_string(),
            content: node.get_str("text").unwrap_or_default().to_string(),
            score,
            subject: node.get_str("subject").map(str::to_string),
            concept,
            prerequisites,
        })
    }
}
