use crate::error::{GraphError, Result};
use crate::store::GraphStore;
use crate::types::{Direction, EdgeType, NodeKey, NodeKind, NodeRecord, Similarity};
use async_trait::async_trait;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction as PetDirection;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Edge payload in the in-memory graph
#[derive(Debug, Clone)]
struct EdgeRecord {
    edge_type: EdgeType,
    weight: f32,
}

/// Brute-force similarity index over chunk vectors.
///
/// O(n) per query, which is fine for the in-memory store; a server-side
/// store would declare a native index instead.
struct VectorIndex {
    dimension: usize,
    similarity: Similarity,
    vectors: HashMap<String, Vec<f32>>,
}

impl VectorIndex {
    fn new(dimension: usize, similarity: Similarity) -> Self {
        Self {
            dimension,
            similarity,
            vectors: HashMap::new(),
        }
    }

    fn add(&mut self, chunk_id: &str, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(GraphError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.insert(chunk_id.to_string(), vector.to_vec());
        Ok(())
    }

    fn search(&self, query: &[f32], limit: usize) -> Result<Vec<(String, f32)>> {
        if query.len() != self.dimension {
            return Err(GraphError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scores: Vec<(String, f32)> = self
            .vectors
            .iter()
            .map(|(id, vector)| (id.clone(), self.score(query, vector)))
            .collect();

        // Score descending, chunk id ascending on ties for determinism
        scores.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scores.truncate(limit);
        Ok(scores)
    }

    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        match self.similarity {
            Similarity::DotProduct => dot,
            Similarity::Cosine => {
                let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
                let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    0.0
                } else {
                    dot / (norm_a * norm_b)
                }
            }
        }
    }
}

#[derive(Default)]
struct GraphState {
    graph: DiGraph<NodeRecord, EdgeRecord>,
    key_index: HashMap<String, NodeIndex>,
    vector_index: Option<VectorIndex>,
}

/// In-memory property-graph store with a native vector index.
///
/// The reference implementation of [`GraphStore`]; all writes are merges
/// keyed on [`NodeKey::id`], so re-running ingestion against it is
/// additive-only.
#[derive(Default)]
pub struct InMemoryGraphStore {
    state: RwLock<GraphState>,
}

impl InMemoryGraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn merge_node(&self, record: NodeRecord) -> Result<()> {
        let mut state = self.state.write().await;
        let id = record.key.id();

        if let Some(&idx) = state.key_index.get(&id) {
            if let Some(existing) = state.graph.node_weight_mut(idx) {
                for (name, value) in record.properties {
                    existing.properties.insert(name, value);
                }
            }
            return Ok(());
        }

        let idx = state.graph.add_node(record);
        state.key_index.insert(id, idx);
        Ok(())
    }

    async fn merge_edge(
        &self,
        from: &NodeKey,
        to: &NodeKey,
        edge_type: EdgeType,
        weight: Option<f32>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let from_idx = *state
            .key_index
            .get(&from.id())
            .ok_or_else(|| GraphError::NotFound(from.id()))?;
        let to_idx = *state
            .key_index
            .get(&to.id())
            .ok_or_else(|| GraphError::NotFound(to.id()))?;

        let existing = state
            .graph
            .edges_connecting(from_idx, to_idx)
            .find(|e| e.weight().edge_type == edge_type)
            .map(|e| e.id());

        if let Some(edge_idx) = existing {
            if let (Some(weight), Some(record)) = (weight, state.graph.edge_weight_mut(edge_idx)) {
                record.weight = weight;
            }
            return Ok(());
        }

        state.graph.add_edge(
            from_idx,
            to_idx,
            EdgeRecord {
                edge_type,
                weight: weight.unwrap_or(1.0),
            },
        );
        Ok(())
    }

    async fn get_node(&self, key: &NodeKey) -> Result<Option<NodeRecord>> {
        let state = self.state.read().await;
        Ok(state
            .key_index
            .get(&key.id())
            .and_then(|&idx| state.graph.node_weight(idx))
            .cloned())
    }

    async fn node_count(&self, kind: Option<NodeKind>) -> Result<usize> {
        let state = self.state.read().await;
        Ok(match kind {
            None => state.graph.node_count(),
            Some(kind) => state
                .graph
                .node_weights()
                .filter(|n| n.key.kind() == kind)
                .count(),
        })
    }

    async fn edge_count(&self, edge_type: Option<EdgeType>) -> Result<usize> {
        let state = self.state.read().await;
        Ok(match edge_type {
            None => state.graph.edge_count(),
            Some(edge_type) => state
                .graph
                .edge_weights()
                .filter(|e| e.edge_type == edge_type)
                .count(),
        })
    }

    async fn neighbors(
        &self,
        key: &NodeKey,
        edge_type: EdgeType,
        direction: Direction,
    ) -> Result<Vec<(NodeKey, f32)>> {
        let state = self.state.read().await;
        let Some(&idx) = state.key_index.get(&key.id()) else {
            return Ok(Vec::new());
        };

        let pet_direction = match direction {
            Direction::Outgoing => PetDirection::Outgoing,
            Direction::Incoming => PetDirection::Incoming,
        };

        let mut out = Vec::new();
        for edge in state.graph.edges_directed(idx, pet_direction) {
            if edge.weight().edge_type != edge_type {
                continue;
            }
            let other = match direction {
                Direction::Outgoing => edge.target(),
                Direction::Incoming => edge.source(),
            };
            if let Some(node) = state.graph.node_weight(other) {
                out.push((node.key.clone(), edge.weight().weight));
            }
        }
        Ok(out)
    }

    async fn ensure_vector_index(&self, dimension: usize, similarity: Similarity) -> Result<()> {
        let mut state = self.state.write().await;
        match &state.vector_index {
            Some(index) if index.dimension == dimension && index.similarity == similarity => {}
            Some(_) => {
                log::warn!("Recreating vector index with dimension {dimension}");
                state.vector_index = Some(VectorIndex::new(dimension, similarity));
            }
            None => {
                log::info!("Creating vector index: dimension {dimension}");
                state.vector_index = Some(VectorIndex::new(dimension, similarity));
            }
        }
        Ok(())
    }

    async fn vector_index_ready(&self) -> bool {
        self.state.read().await.vector_index.is_some()
    }

    async fn upsert_vector(&self, chunk_id: &str, vector: &[f32]) -> Result<()> {
        let mut state = self.state.write().await;
        let index = state
            .vector_index
            .as_mut()
            .ok_or(GraphError::IndexUnavailable)?;
        index.add(chunk_id, vector)
    }

    async fn vector_query(&self, query: &[f32], limit: usize) -> Result<Vec<(String, f32)>> {
        let state = self.state.read().await;
        let index = state
            .vector_index
            .as_ref()
            .ok_or(GraphError::IndexUnavailable)?;
        index.search(query, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn textbook(id: &str) -> NodeKey {
        NodeKey::Textbook {
            book_id: id.to_string(),
        }
    }

    fn chapter(book: &str, number: u32) -> NodeKey {
        NodeKey::Chapter {
            book_id: book.to_string(),
            number,
        }
    }

    #[tokio::test]
    async fn test_merge_node_idempotent() {
        let store = InMemoryGraphStore::new();
        let record = NodeRecord::new(textbook("b1")).prop("title", "Algebra");

        store.merge_node(record.clone()).await.unwrap();
        store.merge_node(record).await.unwrap();

        assert_eq!(store.node_count(None).await.unwrap(), 1);
        let node = store.get_node(&textbook("b1")).await.unwrap().unwrap();
        assert_eq!(node.get_str("title"), Some("Algebra"));
    }

    #[tokio::test]
    async fn test_merge_node_refreshes_properties() {
        let store = InMemoryGraphStore::new();
        store
            .merge_node(NodeRecord::new(textbook("b1")).prop("title", "Old"))
            .await
            .unwrap();
        store
            .merge_node(NodeRecord::new(textbook("b1")).prop("title", "New").prop("year", 2024))
            .await
            .unwrap();

        let node = store.get_node(&textbook("b1")).await.unwrap().unwrap();
        assert_eq!(node.get_str("title"), Some("New"));
        assert_eq!(node.properties.get("year"), Some(&serde_json::json!(2024)));
    }

    #[tokio::test]
    async fn test_merge_edge_idempotent() {
        let store = InMemoryGraphStore::new();
        store.merge_node(NodeRecord::new(textbook("b1"))).await.unwrap();
        store.merge_node(NodeRecord::new(chapter("b1", 1))).await.unwrap();

        for _ in 0..3 {
            store
                .merge_edge(&textbook("b1"), &chapter("b1", 1), EdgeType::HasChapter, None)
                .await
                .unwrap();
        }
        assert_eq!(store.edge_count(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_parallel_edge_types_coexist() {
        let store = InMemoryGraphStore::new();
        store.merge_node(NodeRecord::new(chapter("b1", 1))).await.unwrap();
        store.merge_node(NodeRecord::new(chapter("b1", 2))).await.unwrap();

        store
            .merge_edge(&chapter("b1", 1), &chapter("b1", 2), EdgeType::Precedes, None)
            .await
            .unwrap();
        store
            .merge_edge(&chapter("b1", 1), &chapter("b1", 2), EdgeType::Next, None)
            .await
            .unwrap();

        assert_eq!(store.edge_count(None).await.unwrap(), 2);
        assert_eq!(store.edge_count(Some(EdgeType::Precedes)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_merge_edge_requires_endpoints() {
        let store = InMemoryGraphStore::new();
        store.merge_node(NodeRecord::new(textbook("b1"))).await.unwrap();
        let result = store
            .merge_edge(&textbook("b1"), &chapter("b1", 1), EdgeType::HasChapter, None)
            .await;
        assert!(matches!(result, Err(GraphError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_neighbors_by_direction() {
        let store = InMemoryGraphStore::new();
        store.merge_node(NodeRecord::new(textbook("b1"))).await.unwrap();
        store.merge_node(NodeRecord::new(chapter("b1", 1))).await.unwrap();
        store.merge_node(NodeRecord::new(chapter("b1", 2))).await.unwrap();
        store
            .merge_edge(&textbook("b1"), &chapter("b1", 1), EdgeType::HasChapter, None)
            .await
            .unwrap();
        store
            .merge_edge(&textbook("b1"), &chapter("b1", 2), EdgeType::HasChapter, None)
            .await
            .unwrap();

        let out = store
            .neighbors(&textbook("b1"), EdgeType::HasChapter, Direction::Outgoing)
            .await
            .unwrap();
        assert_eq!(out.len(), 2);

        let incoming = store
            .neighbors(&chapter("b1", 1), EdgeType::HasChapter, Direction::Incoming)
            .await
            .unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].0, textbook("b1"));

        // Wrong edge type filters everything out
        let none = store
            .neighbors(&textbook("b1"), EdgeType::Precedes, Direction::Outgoing)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_vector_index_lifecycle() {
        let store = InMemoryGraphStore::new();
        assert!(!store.vector_index_ready().await);
        assert!(matches!(
            store.vector_query(&[1.0, 0.0], 5).await,
            Err(GraphError::IndexUnavailable)
        ));

        store
            .ensure_vector_index(3, Similarity::Cosine)
            .await
            .unwrap();
        assert!(store.vector_index_ready().await);

        store.upsert_vector("c1", &[1.0, 0.0, 0.0]).await.unwrap();
        store.upsert_vector("c2", &[0.9, 0.1, 0.0]).await.unwrap();
        store.upsert_vector("c3", &[0.0, 1.0, 0.0]).await.unwrap();

        let hits = store.vector_query(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, "c1");
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
        assert_eq!(hits[1].0, "c2");
    }

    #[tokio::test]
    async fn test_vector_dimension_checked() {
        let store = InMemoryGraphStore::new();
        store
            .ensure_vector_index(3, Similarity::Cosine)
            .await
            .unwrap();
        assert!(matches!(
            store.upsert_vector("c1", &[1.0]).await,
            Err(GraphError::InvalidDimension { .. })
        ));
        assert!(matches!(
            store.vector_query(&[1.0], 5).await,
            Err(GraphError::InvalidDimension { .. })
        ));
    }

    #[tokio::test]
    async fn test_tie_break_by_chunk_id() {
        let store = InMemoryGraphStore::new();
        store
            .ensure_vector_index(2, Similarity::Cosine)
            .await
            .unwrap();
        // Identical vectors, identical scores
        store.upsert_vector("c-b", &[1.0, 0.0]).await.unwrap();
        store.upsert_vector("c-a", &[1.0, 0.0]).await.unwrap();
        store.upsert_vector("c-c", &[1.0, 0.0]).await.unwrap();

        let hits = store.vector_query(&[1.0, 0.0], 3).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["c-a", "c-b", "c-c"]);
    }
}
