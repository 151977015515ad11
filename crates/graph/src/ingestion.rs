use crate::error::Result;
use crate::store::GraphStore;
use crate::types::{EdgeType, NodeKey, NodeRecord};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tome_chunker::Chunk;
use tome_structure::StructureElement;

/// Ingestion policy knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Largest numeric gap between consecutive chapters that still gets a
    /// PRECEDES edge. Chapters 1 and 3 with the default of 1 stay
    /// unlinked rather than implying a reading order across the hole.
    pub max_precedes_gap: u32,

    /// Continue a concept NEXT chain across section boundaries within the
    /// same chapter. Off by default; the documented contract is that
    /// reading-order chains stay inside one parent scope.
    pub link_concepts_across_sections: bool,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_precedes_gap: 1,
            link_concepts_across_sections: false,
        }
    }
}

/// A prerequisite relationship supplied alongside the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrerequisiteLink {
    /// `concept` requires `prerequisite` first
    Concept {
        concept: String,
        prerequisite: String,
        strength: f32,
    },
    /// `chunk_id` requires `prerequisite_chunk_id` first
    Chunk {
        chunk_id: String,
        prerequisite_chunk_id: String,
        strength: f32,
    },
}

/// Everything the upstream pipeline produced for one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub textbook_id: String,
    pub title: String,
    pub subject: Option<String>,
    pub authors: Vec<String>,
    pub source_file: Option<String>,
    pub elements: Vec<StructureElement>,
    pub chunks: Vec<Chunk>,
    #[serde(default)]
    pub prerequisites: Vec<PrerequisiteLink>,
}

/// Structural numbers discovered in step 3. Level-2 sections get nodes
/// of their own; deeper numbers resolve to the enclosing section so
/// subsection content attaches to a node that actually exists.
#[derive(Debug, Default)]
struct SectionIndex {
    /// Section number -> chapter number
    chapters: HashMap<String, Option<u32>>,
    /// Subsection number -> enclosing section number
    parents: HashMap<String, String>,
}

impl SectionIndex {
    fn resolve<'a>(&'a self, number: &'a str) -> Option<&'a str> {
        if self.chapters.contains_key(number) {
            return Some(number);
        }
        self.parents.get(number).map(String::as_str)
    }
}

/// What one ingestion run touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionCounts {
    pub chapters: usize,
    pub sections: usize,
    pub concepts: usize,
    pub chunks: usize,
    pub vectors_indexed: usize,
}

/// Builds the textbook knowledge graph from a processed document.
///
/// Every write is a merge keyed by natural identifiers, composed into six
/// independently retryable steps:
///
/// 1. Textbook node
/// 2. Chapter nodes + HAS_CHAPTER + PRECEDES chain
/// 3. Section nodes + HAS_SECTION + intra-chapter NEXT chain
/// 4. Concept nodes + CONTAINS_CONCEPT + NEXT chain
/// 5. Chunk nodes + BELONGS_TO + intra-section NEXT + vector upserts
/// 6. MENTIONS_CONCEPT + HAS_PREREQUISITE edges
///
/// A failure mid-run leaves a valid partial graph; re-running for the same
/// textbook id is safe and additive-only.
pub struct GraphIngestion {
    store: Arc<dyn GraphStore>,
    config: IngestionConfig,
}

impl GraphIngestion {
    #[must_use]
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self::with_config(store, IngestionConfig::default())
    }

    #[must_use]
    pub fn with_config(store: Arc<dyn GraphStore>, config: IngestionConfig) -> Self {
        Self { store, config }
    }

    /// Run all six upsert steps for one document
    pub async fn ingest(&self, doc: &ProcessedDocument) -> Result<IngestionCounts> {
        let mut counts = IngestionCounts::default();

        self.upsert_textbook(doc).await?;
        counts.chapters = self.upsert_chapters(doc).await?;
        let sections = self.upsert_sections(doc).await?;
        counts.sections = sections.chapters.len();
        counts.concepts = self.upsert_concepts(doc, &sections).await?;
        let (chunks, vectors) = self.upsert_chunks(doc, &sections).await?;
        counts.chunks = chunks;
        counts.vectors_indexed = vectors;
        self.upsert_concept_edges(doc).await?;

        log::info!(
            "Ingested '{}': {} chapters, {} sections, {} concepts, {} chunks ({} indexed)",
            doc.title,
            counts.chapters,
            counts.sections,
            counts.concepts,
            counts.chunks,
            counts.vectors_indexed
        );
        Ok(counts)
    }

    fn textbook_key(&self, doc: &ProcessedDocument) -> NodeKey {
        NodeKey::Textbook {
            book_id: doc.textbook_id.clone(),
        }
    }

    async fn upsert_textbook(&self, doc: &ProcessedDocument) -> Result<()> {
        let mut record = NodeRecord::new(self.textbook_key(doc))
            .prop("title", doc.title.clone())
            .prop("authors", doc.authors.clone());
        if let Some(subject) = &doc.subject {
            record = record.prop("subject", subject.clone());
        }
        if let Some(source_file) = &doc.source_file {
            record = record.prop("source_file", source_file.clone());
        }
        self.store.merge_node(record).await
    }

    /// Step 2: chapters in numeric order, PRECEDES between neighbors
    /// unless the gap exceeds the configured maximum.
    async fn upsert_chapters(&self, doc: &ProcessedDocument) -> Result<usize> {
        let mut chapters: Vec<(u32, &StructureElement)> = doc
            .elements
            .iter()
            .filter(|e| e.is_chapter())
            .filter_map(|e| e.number.map(|n| (n, e)))
            .collect();
        chapters.sort_by_key(|(n, _)| *n);
        chapters.dedup_by_key(|(n, _)| *n);

        let textbook = self.textbook_key(doc);
        for (number, element) in &chapters {
            let key = NodeKey::Chapter {
                book_id: doc.textbook_id.clone(),
                number: *number,
            };
            self.store
                .merge_node(
                    NodeRecord::new(key.clone())
                        .prop("title", element.title.clone())
                        .prop("number", *number),
                )
                .await?;
            self.store
                .merge_edge(&textbook, &key, EdgeType::HasChapter, None)
                .await?;
        }

        for pair in chapters.windows(2) {
            let (prev, next) = (pair[0].0, pair[1].0);
            if next - prev > self.config.max_precedes_gap {
                log::debug!("Skipping PRECEDES across chapter gap {prev} -> {next}");
                continue;
            }
            self.store
                .merge_edge(
                    &NodeKey::Chapter {
                        book_id: doc.textbook_id.clone(),
                        number: prev,
                    },
                    &NodeKey::Chapter {
                        book_id: doc.textbook_id.clone(),
                        number: next,
                    },
                    EdgeType::Precedes,
                    None,
                )
                .await?;
        }
        Ok(chapters.len())
    }

    /// Step 3: sections under their chapters, NEXT chains that never
    /// cross a chapter boundary. Returns the number index the concept and
    /// chunk steps resolve attachments through.
    async fn upsert_sections(&self, doc: &ProcessedDocument) -> Result<SectionIndex> {
        let mut index = SectionIndex::default();
        let mut current_chapter: Option<u32> = None;
        let mut current_section: Option<String> = None;
        let mut prev_in_chapter: Option<NodeKey> = None;

        for element in &doc.elements {
            if element.is_chapter() {
                current_chapter = element.number;
                current_section = None;
                prev_in_chapter = None;
                continue;
            }
            if element.level < 2 {
                continue;
            }
            if element.level > 2 {
                // No node for a subsection; remember which section owns
                // it so its chunks and concepts attach there
                if let Some(section) = &current_section {
                    index
                        .parents
                        .entry(element.raw_number.clone())
                        .or_insert_with(|| section.clone());
                }
                continue;
            }

            let key = NodeKey::Section {
                book_id: doc.textbook_id.clone(),
                number: element.raw_number.clone(),
            };
            current_section = Some(element.raw_number.clone());
            if index
                .chapters
                .insert(element.raw_number.clone(), current_chapter)
                .is_some()
            {
                continue;
            }

            self.store
                .merge_node(
                    NodeRecord::new(key.clone())
                        .prop("title", element.title.clone())
                        .prop("number", element.raw_number.clone()),
                )
                .await?;

            if let Some(chapter) = current_chapter {
                self.store
                    .merge_edge(
                        &NodeKey::Chapter {
                            book_id: doc.textbook_id.clone(),
                            number: chapter,
                        },
                        &key,
                        EdgeType::HasSection,
                        None,
                    )
                    .await?;
            }

            if let Some(prev) = &prev_in_chapter {
                self.store
                    .merge_edge(prev, &key, EdgeType::Next, None)
                    .await?;
            }
            prev_in_chapter = Some(key);
        }
        Ok(index)
    }

    /// Step 4: concepts in first-appearance order, attached to the
    /// section that introduced them, chained by NEXT within one scope.
    async fn upsert_concepts(
        &self,
        doc: &ProcessedDocument,
        sections: &SectionIndex,
    ) -> Result<usize> {
        let mut seen: HashSet<&str> = HashSet::new();
        // (concept key, section scope, chapter scope) in appearance order
        let mut ordered: Vec<(NodeKey, Option<String>, Option<u32>)> = Vec::new();

        for chunk in &doc.chunks {
            for concept in &chunk.concepts {
                if !seen.insert(concept.as_str()) {
                    continue;
                }
                let scope = chunk
                    .section
                    .as_deref()
                    .and_then(|s| sections.resolve(s))
                    .map(str::to_string);
                ordered.push((
                    NodeKey::Concept {
                        book_id: doc.textbook_id.clone(),
                        name: concept.clone(),
                    },
                    scope,
                    chunk.chapter,
                ));
            }
        }

        for (key, section, _) in &ordered {
            self.store
                .merge_node(NodeRecord::new(key.clone()))
                .await?;
            if let Some(section) = section {
                self.store
                    .merge_edge(
                        &NodeKey::Section {
                            book_id: doc.textbook_id.clone(),
                            number: section.clone(),
                        },
                        key,
                        EdgeType::ContainsConcept,
                        None,
                    )
                    .await?;
            }
        }

        for pair in ordered.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let same_scope = if self.config.link_concepts_across_sections {
                prev.2 == next.2
            } else {
                prev.1 == next.1
            };
            if same_scope {
                self.store
                    .merge_edge(&prev.0, &next.0, EdgeType::Next, None)
                    .await?;
            }
        }
        Ok(ordered.len())
    }

    /// Step 5: chunk nodes, containment, reading order, vectors.
    ///
    /// A chunk labelled with a subsection number belongs to the enclosing
    /// section; chunks whose label resolves to nothing, and unstructured
    /// chunks, belong directly to the textbook. Only embedded chunks
    /// enter the vector index.
    async fn upsert_chunks(
        &self,
        doc: &ProcessedDocument,
        sections: &SectionIndex,
    ) -> Result<(usize, usize)> {
        let index_ready = self.store.vector_index_ready().await;
        let mut vectors = 0usize;
        let mut prev_in_scope: Option<(NodeKey, Option<String>)> = None;

        for chunk in &doc.chunks {
            let key = NodeKey::Chunk {
                chunk_id: chunk.chunk_id.clone(),
            };
            let mut record = NodeRecord::new(key.clone())
                .prop("text", chunk.text.clone())
                .prop("content_type", chunk.content_type.as_str())
                .prop("difficulty_score", chunk.difficulty_score as f64)
                .prop("confidence_score", chunk.confidence_score as f64)
                .prop("concepts", chunk.concepts.clone())
                .prop("has_embedding", chunk.has_embedding());
            if let Some(chapter) = chunk.chapter {
                record = record.prop("chapter", chapter);
            }
            if let Some(section) = &chunk.section {
                record = record.prop("section", section.clone());
            }
            // Denormalized so search hits can be hydrated from the chunk
            // node alone
            if let Some(subject) = &doc.subject {
                record = record.prop("subject", subject.clone());
            }
            self.store.merge_node(record).await?;

            let scope = chunk
                .section
                .as_deref()
                .and_then(|s| sections.resolve(s))
                .map(str::to_string);
            let parent = match &scope {
                Some(section) => NodeKey::Section {
                    book_id: doc.textbook_id.clone(),
                    number: section.clone(),
                },
                None => self.textbook_key(doc),
            };
            self.store
                .merge_edge(&key, &parent, EdgeType::BelongsTo, None)
                .await?;

            if let Some((prev, prev_scope)) = &prev_in_scope {
                if *prev_scope == scope {
                    self.store
                        .merge_edge(prev, &key, EdgeType::Next, None)
                        .await?;
                }
            }
            prev_in_scope = Some((key, scope));

            if let Some(embedding) = &chunk.embedding {
                if index_ready {
                    self.store.upsert_vector(&chunk.chunk_id, embedding).await?;
                    vectors += 1;
                } else {
                    log::warn!(
                        "Vector index not ready; chunk {} ingested without index membership",
                        chunk.chunk_id
                    );
                }
            }
        }
        Ok((doc.chunks.len(), vectors))
    }

    /// Step 6: concept mentions and weighted prerequisite edges.
    async fn upsert_concept_edges(&self, doc: &ProcessedDocument) -> Result<()> {
        for chunk in &doc.chunks {
            let chunk_key = NodeKey::Chunk {
                chunk_id: chunk.chunk_id.clone(),
            };
            for concept in &chunk.concepts {
                self.store
                    .merge_edge(
                        &chunk_key,
                        &NodeKey::Concept {
                            book_id: doc.textbook_id.clone(),
                            name: concept.clone(),
                        },
                        EdgeType::MentionsConcept,
                        None,
                    )
                    .await?;
            }
        }

        for link in &doc.prerequisites {
            let (from, to, strength) = match link {
                PrerequisiteLink::Concept {
                    concept,
                    prerequisite,
                    strength,
                } => (
                    NodeKey::Concept {
                        book_id: doc.textbook_id.clone(),
                        name: concept.clone(),
                    },
                    NodeKey::Concept {
                        book_id: doc.textbook_id.clone(),
                        name: prerequisite.clone(),
                    },
                    *strength,
                ),
                PrerequisiteLink::Chunk {
                    chunk_id,
                    prerequisite_chunk_id,
                    strength,
                } => (
                    NodeKey::Chunk {
                        chunk_id: chunk_id.clone(),
                    },
                    NodeKey::Chunk {
                        chunk_id: prerequisite_chunk_id.clone(),
                    },
                    *strength,
                ),
            };

            if self.store.get_node(&from).await?.is_none()
                || self.store.get_node(&to).await?.is_none()
            {
                log::warn!("Skipping prerequisite with unknown endpoint: {from} -> {to}");
                continue;
            }
            self.store
                .merge_edge(&from, &to, EdgeType::HasPrerequisite, Some(strength))
                .await?;
        }
        Ok(())
    }
}
