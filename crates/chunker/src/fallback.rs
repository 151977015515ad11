use crate::classify::{classify_content, estimate_difficulty, extract_concepts};
use crate::config::ChunkerConfig;
use crate::types::{make_chunk_id, Chunk};
use unicode_segmentation::UnicodeSegmentation;

/// Strategy of last resort: overlapping windows over the whole text.
///
/// No structural awareness. Windows end at a sentence boundary when one
/// falls inside the window, and the next window always starts exactly
/// `fallback_overlap` characters before the previous one ended, so
/// consecutive chunks share a fixed-size context tail for embedding and
/// retrieval. Never fails on well-formed text; empty input yields zero
/// chunks.
#[derive(Debug, Clone)]
pub struct FallbackChunker {
    config: ChunkerConfig,
}

impl FallbackChunker {
    #[must_use]
    pub fn new(config: ChunkerConfig) -> Self {
        debug_assert!(
            config.fallback_overlap < config.fallback_target_size,
            "fallback_overlap ({}) must be smaller than fallback_target_size ({})",
            config.fallback_overlap,
            config.fallback_target_size
        );
        Self { config }
    }

    /// Chunk `text` into overlapping windows.
    #[must_use]
    pub fn chunk(&self, text: &str, book_id: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let target = self.config.fallback_target_size;
        let overlap = self.config.fallback_overlap;

        // Char-index machinery: windows are measured in characters, never
        // splitting inside a UTF-8 sequence
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total_chars = offsets.len() - 1;

        // Sentence boundaries as char indices, ascending
        let boundaries: Vec<usize> = text
            .split_sentence_bound_indices()
            .skip(1)
            .map(|(byte_idx, _)| {
                offsets
                    .binary_search(&byte_idx)
                    .unwrap_or_else(|insert| insert)
            })
            .collect();

        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut ordinal = 0usize;

        while start < total_chars {
            let hard_end = (start + target).min(total_chars);
            let end = if hard_end < total_chars {
                // Prefer the last sentence boundary inside the window, as
                // long as it still makes forward progress past the overlap
                let floor = start + overlap;
                boundaries
                    .iter()
                    .rev()
                    .find(|&&b| b > floor && b <= hard_end)
                    .copied()
                    .unwrap_or(hard_end)
            } else {
                total_chars
            };

            let piece = &text[offsets[start]..offsets[end]];
            if !piece.trim().is_empty() {
                let trimmed_view = piece.trim();
                let content_type = classify_content(trimmed_view);
                chunks.push(Chunk {
                    chunk_id: make_chunk_id(book_id, None, None, ordinal),
                    text: piece.to_string(),
                    content_type,
                    chapter: None,
                    section: None,
                    concepts: extract_concepts(trimmed_view),
                    difficulty_score: estimate_difficulty(trimmed_view, content_type),
                    confidence_score: 1.0,
                    embedding: None,
                });
                ordinal += 1;
            }

            if end >= total_chars {
                break;
            }
            // Always advances, even if an unvalidated config slipped past
            // the constructor in a release build
            start = (end - overlap).max(start + 1);
        }

        log::debug!(
            "Fallback chunking produced {} chunks ({} chars, target {target}, overlap {overlap})",
            chunks.len(),
            total_chars
        );

        chunks
    }
}
