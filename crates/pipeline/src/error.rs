use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Structure(#[from] tome_structure::StructureError),

    #[error(transparent)]
    Chunker(#[from] tome_chunker::ChunkerError),

    #[error(transparent)]
    Embedding(#[from] tome_embeddings::EmbeddingError),

    #[error(transparent)]
    Graph(#[from] tome_graph::GraphError),
}
