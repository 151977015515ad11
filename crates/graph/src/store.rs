use crate::error::Result;
use crate::types::{Direction, EdgeType, NodeKey, NodeKind, NodeRecord, Similarity};
use async_trait::async_trait;

/// Property-graph store collaborator.
///
/// The pipeline only ever issues merge-style upserts and read-only
/// traversal/similarity queries, so the trait surface is deliberately
/// small. Every write must be idempotent with respect to the natural key:
/// merging the same node or edge twice leaves the store unchanged apart
/// from refreshed properties.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Create the node if absent, otherwise merge `record.properties`
    /// into the existing node (new keys added, existing keys refreshed).
    async fn merge_node(&self, record: NodeRecord) -> Result<()>;

    /// Create the edge if absent. A `weight` refreshes the stored weight
    /// on an existing edge. Both endpoints must already exist.
    async fn merge_edge(
        &self,
        from: &NodeKey,
        to: &NodeKey,
        edge_type: EdgeType,
        weight: Option<f32>,
    ) -> Result<()>;

    /// Fetch one node by natural key
    async fn get_node(&self, key: &NodeKey) -> Result<Option<NodeRecord>>;

    /// Count nodes, optionally restricted to one kind
    async fn node_count(&self, kind: Option<NodeKind>) -> Result<usize>;

    /// Count edges, optionally restricted to one type
    async fn edge_count(&self, edge_type: Option<EdgeType>) -> Result<usize>;

    /// Adjacent node keys along `edge_type` in `direction`, with edge
    /// weights
    async fn neighbors(
        &self,
        key: &NodeKey,
        edge_type: EdgeType,
        direction: Direction,
    ) -> Result<Vec<(NodeKey, f32)>>;

    /// Declare the similarity index over chunk embeddings. Safe to
    /// repeat; changing the dimension drops and recreates the index.
    async fn ensure_vector_index(&self, dimension: usize, similarity: Similarity) -> Result<()>;

    /// Whether the vector index exists and can answer queries
    async fn vector_index_ready(&self) -> bool;

    /// Insert or replace the vector for one chunk
    async fn upsert_vector(&self, chunk_id: &str, vector: &[f32]) -> Result<()>;

    /// Top-`limit` chunk ids by similarity, ranked descending, ties
    /// broken by chunk id ascending. Fails with `IndexUnavailable` when
    /// no index exists.
    async fn vector_query(&self, query: &[f32], limit: usize) -> Result<Vec<(String, f32)>>;
}
