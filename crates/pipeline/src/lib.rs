//! # Tome Pipeline
//!
//! End-to-end textbook processing: raw text in, queryable knowledge
//! graph out.
//!
//! ## Flow
//!
//! ```text
//! text + metadata
//!     │
//!     ├──> StructureDetector        (tome-structure)
//!     ├──> ContentChunker           (tome-chunker)
//!     ├──> EmbeddingPipeline        (tome-embeddings)
//!     └──> VectorIndexManager + GraphIngestion + GraphSearch (tome-graph)
//!              │
//!              └─> ProcessingReport (status, quality, counts, summary)
//! ```
//!
//! Each stage degrades rather than aborts where the data allows it:
//! missing structure falls back to overlap chunking, failed embeddings
//! leave chunks out of the vector index but in the graph, and the whole
//! run is idempotent per textbook id.

mod error;
mod processor;
mod report;

pub use error::{PipelineError, Result};
pub use processor::{DocumentProcessor, PipelineConfig};
pub use report::{DocumentMetadata, ProcessingReport, ProcessingStatus};
