use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Classified kind of a chunk's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    /// Ordinary explanatory text
    Prose,
    /// Mathematical notation / formula-heavy text
    Math,
    /// Definition, theorem, lemma or similar statement
    Definition,
    /// Worked example or exercise
    Example,
}

impl ContentType {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prose => "prose",
            Self::Math => "math",
            Self::Definition => "definition",
            Self::Example => "example",
        }
    }
}

impl Default for ContentType {
    fn default() -> Self {
        Self::Prose
    }
}

/// A bounded span of document text, the unit of embedding and retrieval.
///
/// Created by a chunker; mutated only to attach an embedding; never edited
/// after ingestion except for re-embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier, derivable from textbook + chapter + section +
    /// ordinal (see [`make_chunk_id`])
    pub chunk_id: String,

    /// The chunk text
    pub text: String,

    /// Classified content type
    pub content_type: ContentType,

    /// Chapter number the chunk falls under, if structured
    pub chapter: Option<u32>,

    /// Section number ("3.2") the chunk falls under, if structured
    pub section: Option<String>,

    /// Concept tags mentioned in the chunk
    pub concepts: Vec<String>,

    /// Estimated difficulty in [0, 1]
    pub difficulty_score: f32,

    /// Chunking confidence in [0, 1]; reduced when the chunker had to
    /// force-split oversized content
    pub confidence_score: f32,

    /// Embedding vector, absent until the embedding stage attaches it
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    /// Check whether an embedding has been attached
    #[must_use]
    pub const fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    /// Character length of the chunk text
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Check whether the chunk is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Derive a stable chunk id from its natural coordinates.
///
/// The same (textbook, chapter, section, ordinal) always produces the same
/// id, which is what makes graph ingestion idempotent across retries.
#[must_use]
pub fn make_chunk_id(
    book_id: &str,
    chapter: Option<u32>,
    section: Option<&str>,
    ordinal: usize,
) -> String {
    let key = format!(
        "{book_id}:{}:{}:{ordinal}",
        chapter.map_or_else(|| "-".to_string(), |c| c.to_string()),
        section.unwrap_or("-"),
    );
    let digest = Sha256::digest(key.as_bytes());
    let mut hex = String::with_capacity(16);
    for byte in &digest[..8] {
        hex.push_str(&format!("{byte:02x}"));
    }
    format!("chunk-{hex}")
}
