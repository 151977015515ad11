//! # Tome Embeddings
//!
//! Batched, cached, failure-tolerant embedding of chunk text.
//!
//! The embedding provider is an external collaborator behind the
//! [`EmbeddingProvider`] trait. The pipeline batches chunk text, applies
//! per-call timeouts and bounded retry with exponential backoff, and on
//! terminal failure leaves the affected chunks unembedded rather than
//! failing the document — ingestion proceeds with partial embeddings and
//! unembedded chunks stay out of the vector index until re-embedded.
//!
//! A shared [`CircuitBreaker`] lets collaborators short-circuit provider
//! calls during outages; when open, the pipeline skips calls entirely.

mod cache;
mod error;
mod pipeline;
mod provider;

pub use cache::EmbeddingCache;
pub use error::{EmbeddingError, Result};
pub use pipeline::{CircuitBreaker, EmbeddingConfig, EmbeddingPipeline, EmbeddingReport};
pub use provider::{EmbeddingProvider, HashEmbedder};
