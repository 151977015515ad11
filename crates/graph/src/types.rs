use serde::{Deserialize, Serialize};
use std::fmt;

/// Node kinds in the textbook knowledge graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Textbook,
    Chapter,
    Section,
    Concept,
    Chunk,
}

impl NodeKind {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Textbook => "textbook",
            Self::Chapter => "chapter",
            Self::Section => "section",
            Self::Concept => "concept",
            Self::Chunk => "chunk",
        }
    }
}

/// Natural key of a graph node.
///
/// All merge operations are keyed by these: repeating an upsert with the
/// same key can never create a duplicate. Chapter numbers, section
/// numbers and concept names are scoped to their textbook.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKey {
    Textbook { book_id: String },
    Chapter { book_id: String, number: u32 },
    Section { book_id: String, number: String },
    Concept { book_id: String, name: String },
    Chunk { chunk_id: String },
}

impl NodeKey {
    /// Kind of node this key identifies
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Textbook { .. } => NodeKind::Textbook,
            Self::Chapter { .. } => NodeKind::Chapter,
            Self::Section { .. } => NodeKind::Section,
            Self::Concept { .. } => NodeKind::Concept,
            Self::Chunk { .. } => NodeKind::Chunk,
        }
    }

    /// Canonical string form, usable as a store-level unique id
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            Self::Textbook { book_id } => format!("textbook:{book_id}"),
            Self::Chapter { book_id, number } => format!("chapter:{book_id}:{number}"),
            Self::Section { book_id, number } => format!("section:{book_id}:{number}"),
            Self::Concept { book_id, name } => format!("concept:{book_id}:{name}"),
            Self::Chunk { chunk_id } => format!("chunk:{chunk_id}"),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// Directed relationship types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    /// Textbook → Chapter
    HasChapter,
    /// Chapter → Section
    HasSection,
    /// Section → Concept
    ContainsConcept,
    /// Chunk → Section (or Chunk → Textbook for unstructured documents)
    BelongsTo,
    /// Chapter → Chapter, reading order
    Precedes,
    /// Section/Concept/Chunk → same kind, reading order within one parent
    Next,
    /// Chunk → Concept
    MentionsConcept,
    /// Concept → Concept or Chunk → Chunk, weighted by strength
    HasPrerequisite,
}

impl EdgeType {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HasChapter => "HAS_CHAPTER",
            Self::HasSection => "HAS_SECTION",
            Self::ContainsConcept => "CONTAINS_CONCEPT",
            Self::BelongsTo => "BELONGS_TO",
            Self::Precedes => "PRECEDES",
            Self::Next => "NEXT",
            Self::MentionsConcept => "MENTIONS_CONCEPT",
            Self::HasPrerequisite => "HAS_PREREQUISITE",
        }
    }
}

/// Traversal direction relative to edge orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// Similarity function for the vector index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Similarity {
    Cosine,
    DotProduct,
}

impl Default for Similarity {
    fn default() -> Self {
        Self::Cosine
    }
}

/// A node with its merged property map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub key: NodeKey,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl NodeRecord {
    #[must_use]
    pub fn new(key: NodeKey) -> Self {
        Self {
            key,
            properties: serde_json::Map::new(),
        }
    }

    /// Builder: set a property
    #[must_use]
    pub fn prop(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    /// Read a string property
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(|v| v.as_str())
    }
}

/// Whether the vector index answered the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexStatus {
    Ready,
    /// The index is missing or degraded; results are empty and callers
    /// may fall back to lexical search
    Unavailable,
}

/// One vector-search hit, hydrated from the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub content: String,
    pub score: f32,
    pub subject: Option<String>,
    pub concept: Option<String>,
    pub prerequisites: Vec<String>,
}

/// Ranked result list for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSearchResult {
    pub status: IndexStatus,
    pub hits: Vec<SearchHit>,
}

impl VectorSearchResult {
    /// Empty result carrying the degraded-index status
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            status: IndexStatus::Unavailable,
            hits: Vec::new(),
        }
    }
}
