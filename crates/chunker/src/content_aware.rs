use crate::classify::{classify_content, estimate_difficulty, extract_concepts};
use crate::config::ChunkerConfig;
use crate::types::{make_chunk_id, Chunk};
use tome_structure::StructureElement;
use unicode_segmentation::UnicodeSegmentation;

/// One structural span to be chunked independently
#[derive(Debug, Clone)]
struct Span {
    chapter: Option<u32>,
    section: Option<String>,
    text: String,
}

/// Chunker that respects detected structural boundaries.
///
/// Each structural span is chunked to the target size at sentence
/// boundaries; a sentence that alone exceeds the target is force-split at
/// the size boundary and flagged with reduced confidence rather than
/// rejected. Independent spans run in parallel with bounded fan-out, and
/// results always come back in document order.
#[derive(Debug, Clone)]
pub struct ContentAwareChunker {
    config: ChunkerConfig,
}

impl ContentAwareChunker {
    #[must_use]
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Chunk `text` along the boundaries in `elements`.
    pub async fn chunk(
        &self,
        text: &str,
        book_id: &str,
        elements: &[StructureElement],
    ) -> Vec<Chunk> {
        let spans = Self::build_spans(text, elements);
        if spans.is_empty() {
            return Vec::new();
        }

        let max_concurrent = self.config.max_workers.max(1);
        let mut aggregated: Vec<Chunk> = Vec::new();

        for span_batch in spans.chunks(max_concurrent) {
            let mut tasks = Vec::with_capacity(span_batch.len());
            for span in span_batch {
                let span = span.clone();
                let config = self.config.clone();
                let book_id = book_id.to_string();
                tasks.push(tokio::spawn(async move {
                    Self::chunk_span(&config, &book_id, &span)
                }));
            }

            // Joining in submission order keeps document order regardless
            // of completion order
            for task in tasks {
                match task.await {
                    Ok(chunks) => aggregated.extend(chunks),
                    Err(e) => log::warn!("Span chunking task panicked: {e}"),
                }
            }
        }

        aggregated
    }

    /// Slice the document into per-element spans, plus a preamble span for
    /// text before the first marker. Each element's body runs to the start
    /// of the next element.
    fn build_spans(text: &str, elements: &[StructureElement]) -> Vec<Span> {
        let mut spans = Vec::new();

        let first_start = elements
            .first()
            .map_or(text.len(), |e| e.start_position.min(text.len()));
        if !text[..first_start].trim().is_empty() {
            spans.push(Span {
                chapter: None,
                section: None,
                text: text[..first_start].to_string(),
            });
        }

        let mut current_chapter: Option<u32> = None;
        for element in elements {
            let start = element.start_position.min(text.len());
            let end = element.end_position.clamp(start, text.len());

            let (chapter, section) = if element.is_chapter() {
                current_chapter = element.number;
                (current_chapter, None)
            } else {
                (current_chapter, Some(element.raw_number.clone()))
            };

            let body = &text[start..end];
            if body.trim().is_empty() {
                continue;
            }
            spans.push(Span {
                chapter,
                section,
                text: body.to_string(),
            });
        }

        spans
    }

    /// Chunk one span: greedy sentence accumulation up to the target size,
    /// force-splitting oversized sentences.
    fn chunk_span(config: &ChunkerConfig, book_id: &str, span: &Span) -> Vec<Chunk> {
        let target = config.content_aware_target_size;
        let mut pieces: Vec<(String, bool)> = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for sentence in span.text.split_sentence_bounds() {
            let sentence_len = sentence.chars().count();

            if sentence_len > target {
                if !current.trim().is_empty() {
                    pieces.push((std::mem::take(&mut current), false));
                }
                current_len = 0;
                for window in char_windows(sentence, target) {
                    pieces.push((window, true));
                }
                continue;
            }

            if current_len + sentence_len > target && current_len > 0 {
                if !current.trim().is_empty() {
                    pieces.push((std::mem::take(&mut current), false));
                }
                current_len = 0;
            }
            current.push_str(sentence);
            current_len += sentence_len;
        }
        if !current.trim().is_empty() {
            pieces.push((current, false));
        }

        // Fold a trailing fragment into its predecessor
        if pieces.len() >= 2 {
            let last_len = pieces[pieces.len() - 1].0.chars().count();
            if last_len < config.min_chunk_size {
                let (tail, tail_forced) = pieces.pop().unwrap_or_default();
                if let Some((prev, prev_forced)) = pieces.last_mut() {
                    prev.push_str(&tail);
                    *prev_forced = *prev_forced || tail_forced;
                }
            }
        }

        pieces
            .into_iter()
            .enumerate()
            .map(|(ordinal, (piece, forced))| {
                let trimmed = piece.trim().to_string();
                let content_type = classify_content(&trimmed);
                let difficulty_score = estimate_difficulty(&trimmed, content_type);
                let concepts = extract_concepts(&trimmed);
                Chunk {
                    chunk_id: make_chunk_id(
                        book_id,
                        span.chapter,
                        span.section.as_deref(),
                        ordinal,
                    ),
                    text: trimmed,
                    content_type,
                    chapter: span.chapter,
                    section: span.section.clone(),
                    concepts,
                    difficulty_score,
                    confidence_score: if forced {
                        config.force_split_confidence
                    } else {
                        1.0
                    },
                    embedding: None,
                }
            })
            .collect()
    }
}

/// Split text into windows of at most `size` characters, on char
/// boundaries
fn char_windows(text: &str, size: usize) -> Vec<String> {
    let mut windows = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;
    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == size {
            windows.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        windows.push(current);
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentType;
    use tome_structure::{DetectorConfig, StructureDetector};

    fn detect(text: &str) -> Vec<StructureElement> {
        StructureDetector::new(DetectorConfig::default()).detect(text)
    }

    fn sample_text() -> String {
        let mut text = String::from("Chapter 1: Groups\n\n");
        for i in 0..30 {
            text.push_str(&format!(
                "Sentence number {i} talks about group axioms in detail. "
            ));
        }
        text.push_str("\n\n1.1 Subgroups\n\n");
        for i in 0..30 {
            text.push_str(&format!("Subgroup fact {i} follows from closure. "));
        }
        text.push_str("\n\nChapter 2: Rings\n\n");
        for i in 0..30 {
            text.push_str(&format!("Ring sentence {i} builds on groups. "));
        }
        text
    }

    #[tokio::test]
    async fn test_chunk_respects_target_size() {
        let text = sample_text();
        let elements = detect(&text);
        assert!(elements.len() >= 3);

        let config = ChunkerConfig::default();
        let target = config.content_aware_target_size;
        let chunker = ContentAwareChunker::new(config);
        let chunks = chunker.chunk(&text, "book-1", &elements).await;

        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(
                chunk.len() <= target + 80,
                "chunk of {} chars exceeds target {}",
                chunk.len(),
                target
            );
        }
    }

    #[tokio::test]
    async fn test_chunks_in_document_order_with_attribution() {
        let text = sample_text();
        let elements = detect(&text);
        let chunker = ContentAwareChunker::new(ChunkerConfig::default());
        let chunks = chunker.chunk(&text, "book-1", &elements).await;

        // Chapter numbers never decrease along the chunk sequence
        let chapters: Vec<u32> = chunks.iter().filter_map(|c| c.chapter).collect();
        let mut sorted = chapters.clone();
        sorted.sort_unstable();
        assert_eq!(chapters, sorted);

        assert!(chunks.iter().any(|c| c.section.as_deref() == Some("1.1")));
        assert!(chunks.iter().any(|c| c.chapter == Some(2)));
    }

    #[tokio::test]
    async fn test_giant_sentence_force_split() {
        let long_sentence = "word ".repeat(300);
        let text = format!("Chapter 1: Long\n\n{long_sentence}\n");
        let elements = detect(&text);
        let config = ChunkerConfig::default();
        let force_conf = config.force_split_confidence;
        let chunker = ContentAwareChunker::new(config);
        let chunks = chunker.chunk(&text, "book-1", &elements).await;

        assert!(chunks.len() > 1);
        assert!(
            chunks.iter().any(|c| c.confidence_score == force_conf),
            "expected at least one force-split chunk"
        );
    }

    #[tokio::test]
    async fn test_preamble_without_structure_attribution() {
        let text = format!(
            "This preface precedes any chapter marker. It sets the stage nicely.\n\nChapter 1: Start\n\n{}",
            "Body sentence repeated a few times. ".repeat(10)
        );
        let elements = detect(&text);
        let chunker = ContentAwareChunker::new(ChunkerConfig::default());
        let chunks = chunker.chunk(&text, "book-1", &elements).await;

        assert!(chunks[0].chapter.is_none());
        assert!(chunks[0].section.is_none());
        assert!(chunks.iter().any(|c| c.chapter == Some(1)));
    }

    #[tokio::test]
    async fn test_no_elements_no_chunks_only_preamble() {
        let text = "Loose text with no markers at all. Two sentences here.";
        let chunker = ContentAwareChunker::new(ChunkerConfig::default());
        let chunks = chunker.chunk(text, "book-1", &[]).await;
        // Without structure the whole text is one preamble span
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].chapter.is_none());
    }

    #[tokio::test]
    async fn test_definition_chunks_classified() {
        let text = format!(
            "Chapter 1: Algebra\n\nDefinition 1.1: A monoid is a set with an associative operation and identity.\n\n{}",
            "Plain prose follows the definition here. ".repeat(15)
        );
        let elements = detect(&text);
        let chunker = ContentAwareChunker::new(ChunkerConfig::default());
        let chunks = chunker.chunk(&text, "book-1", &elements).await;
        assert!(chunks
            .iter()
            .any(|c| c.content_type == ContentType::Definition));
    }

    #[test]
    fn test_char_windows() {
        let windows = char_windows("abcdefghij", 4);
        assert_eq!(windows, vec!["abcd", "efgh", "ij"]);
        assert!(char_windows("", 4).is_empty());
    }
}
