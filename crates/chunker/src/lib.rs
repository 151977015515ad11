//! # Tome Chunker
//!
//! Quality-driven chunking of textbook text into bounded, classified
//! chunks — the unit of embedding and retrieval.
//!
//! ## Architecture
//!
//! ```text
//! Text + StructureElement[]
//!     │
//!     ├──> StructureQualityAssessor (tome-structure)
//!     │      └─> recommended strategy
//!     │
//!     ├──> ContentAwareChunker      (structural spans, sentence bounds)
//!     ├──> FallbackChunker          (overlapping windows, last resort)
//!     │
//!     └──> ContentChunker orchestrator
//!          ├─> strategy selection / forced strategy / hybrid
//!          ├─> bounded-concurrency batch processing
//!          └─> ChunkingOutcome + running ChunkingStats
//! ```
//!
//! Content-type classification (prose/math/definition/example) is shared
//! by both chunkers, so a strategy switch never changes how a chunk is
//! labeled.

mod classify;
mod config;
mod content_aware;
mod error;
mod fallback;
mod orchestrator;
mod stats;
mod types;

pub use classify::{classify_content, estimate_difficulty, extract_concepts};
pub use config::ChunkerConfig;
pub use content_aware::ContentAwareChunker;
pub use error::{ChunkerError, Result};
pub use fallback::FallbackChunker;
pub use orchestrator::{ChunkRequest, ChunkingOutcome, ContentChunker};
pub use stats::ChunkingStats;
pub use types::{make_chunk_id, Chunk, ContentType};

// Re-export the strategy enum for convenience; it is defined next to the
// assessor that recommends it.
pub use tome_structure::ChunkingStrategy;
