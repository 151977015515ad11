//! # Tome Graph
//!
//! Knowledge-graph construction, indexing and query for processed
//! textbooks.
//!
//! ## Architecture
//!
//! ```text
//! ProcessedDocument (elements + chunks + embeddings)
//!     │
//!     ├──> GraphIngestion
//!     │      ├─> merge-on-natural-key upserts (idempotent, retryable)
//!     │      └─> Textbook→Chapter→Section→Concept→Chunk + edges
//!     │
//!     ├──> VectorIndexManager
//!     │      └─> similarity index over chunk embeddings
//!     │
//!     └──> GraphSearch
//!          ├─> vector_search / bulk_vector_search
//!          └─> prerequisite / dependent traversal (cycle-safe)
//! ```
//!
//! The property-graph store is a collaborator behind the [`GraphStore`]
//! trait; [`InMemoryGraphStore`] is the built-in implementation used by
//! tests and single-process deployments. Correctness under retry relies
//! on every write being an idempotent merge keyed by natural identifiers,
//! not on transactions or locking.

mod error;
mod index;
mod ingestion;
mod memory;
mod search;
mod store;
mod traversal;
mod types;

pub use error::{GraphError, Result};
pub use index::{IndexConfig, VectorIndexManager};
pub use ingestion::{
    GraphIngestion, IngestionConfig, IngestionCounts, PrerequisiteLink, ProcessedDocument,
};
pub use memory::InMemoryGraphStore;
pub use search::GraphSearch;
pub use store::GraphStore;
pub use traversal::TraversalHop;
pub use types::{
    Direction, EdgeType, IndexStatus, NodeKey, NodeKind, NodeRecord, SearchHit, Similarity,
    VectorSearchResult,
};
