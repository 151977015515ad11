use crate::patterns::{default_families, PatternFamily};
use crate::types::StructureElement;
use serde::{Deserialize, Serialize};

/// Configuration for structure detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Candidates below this confidence are discarded
    pub min_confidence: f32,

    /// Lines longer than this are never heading candidates
    pub max_marker_line_len: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            max_marker_line_len: 120,
        }
    }
}

/// Scans normalized document text and emits ordered structural markers.
///
/// Multiple pattern families vote on each line; overlapping candidates are
/// resolved by highest confidence. Finding nothing is a valid outcome, not
/// an error — downstream quality assessment treats it as a signal.
pub struct StructureDetector {
    families: Vec<Box<dyn PatternFamily>>,
    config: DetectorConfig,
}

impl StructureDetector {
    #[must_use]
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            families: default_families(),
            config,
        }
    }

    /// Build a detector with a custom family set (families are evaluated
    /// in order; confidence decides ties, not order)
    #[must_use]
    pub fn with_families(config: DetectorConfig, families: Vec<Box<dyn PatternFamily>>) -> Self {
        Self { families, config }
    }

    /// Detect structural elements in `text`, ordered by position.
    ///
    /// Each element's `end_position` is the start of the next element (or
    /// the end of the document), so element spans tile the text from the
    /// first marker onward.
    #[must_use]
    pub fn detect(&self, text: &str) -> Vec<StructureElement> {
        let mut elements = Vec::new();
        let mut offset = 0usize;
        let mut prev_line_blank = true;
        let mut prev_line_terminated = true;
        let mut page: u32 = 1;

        for line in text.split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();

            // Form feeds mark page breaks in normalized extractor output
            page += line.matches('\u{0c}').count() as u32;

            let trimmed = line.trim_end_matches(['\n', '\r']).trim_start_matches('\u{0c}');
            let stripped = trimmed.trim();

            if stripped.is_empty() {
                prev_line_blank = true;
                prev_line_terminated = true;
                continue;
            }

            if stripped.len() <= self.config.max_marker_line_len {
                if let Some(element) = self.best_candidate(
                    stripped,
                    line_start,
                    page,
                    prev_line_blank,
                    prev_line_terminated,
                ) {
                    if element.confidence >= self.config.min_confidence {
                        elements.push(element);
                    }
                }
            }

            prev_line_blank = false;
            prev_line_terminated = stripped.ends_with(['.', '!', '?', ':', ';']);
        }

        // Close spans against the following element
        let len = text.len();
        let starts: Vec<usize> = elements.iter().map(|e| e.start_position).collect();
        for (i, element) in elements.iter_mut().enumerate() {
            element.end_position = starts.get(i + 1).copied().unwrap_or(len);
        }

        log::debug!(
            "Structure detection found {} elements ({} chapters)",
            elements.len(),
            elements.iter().filter(|e| e.is_chapter()).count()
        );

        elements
    }

    /// Run all families against one line, keep the highest-confidence vote
    fn best_candidate(
        &self,
        line: &str,
        start: usize,
        page: u32,
        prev_blank: bool,
        prev_terminated: bool,
    ) -> Option<StructureElement> {
        let mut best: Option<StructureElement> = None;

        for family in &self.families {
            let Some(m) = family.match_line(line) else {
                continue;
            };

            let mut confidence = m.specificity;
            if prev_blank {
                confidence += 0.1;
            } else if !prev_terminated {
                // Marker-looking text continuing a paragraph is suspect
                confidence -= 0.3;
            }
            if line.len() <= 80 {
                confidence += 0.05;
            }
            if !m.title.is_empty() {
                confidence += 0.05;
            }
            let confidence = confidence.clamp(0.0, 1.0);

            let candidate = StructureElement {
                element_type: m.element_type,
                title: m.title,
                number: m.number,
                raw_number: m.raw_number,
                level: m.element_type.level(),
                numbering_style: m.numbering_style,
                start_position: start,
                end_position: start,
                page_number: Some(page),
                confidence,
                raw_text: line.to_string(),
            };

            match &best {
                Some(current) if current.confidence >= candidate.confidence => {}
                _ => best = Some(candidate),
            }
        }

        best
    }
}

impl Default for StructureDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ElementType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_two_chapters() {
        let text = "Chapter 1: Intro\n\nSome prose about things.\n\nChapter 2: Basics\n\nMore prose.\n";
        let detector = StructureDetector::default();
        let elements = detector.detect(text);

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].number, Some(1));
        assert_eq!(elements[1].number, Some(2));
        assert_eq!(elements[0].end_position, elements[1].start_position);
        assert_eq!(elements[1].end_position, text.len());
        assert!(elements.iter().all(|e| e.confidence >= 0.3));
    }

    #[test]
    fn test_detect_mixed_levels() {
        let text = "Chapter 1: Algebra\n\n1.1 Groups\n\ngroup prose\n\n1.1.1 Abelian groups\n\nmore\n\n1.2 Rings\n\nring prose\n";
        let detector = StructureDetector::default();
        let elements = detector.detect(text);

        let types: Vec<ElementType> = elements.iter().map(|e| e.element_type).collect();
        assert_eq!(
            types,
            vec![
                ElementType::Chapter,
                ElementType::Section,
                ElementType::Subsection,
                ElementType::Section,
            ]
        );
    }

    #[test]
    fn test_empty_and_unstructured_text() {
        let detector = StructureDetector::default();
        assert!(detector.detect("").is_empty());
        assert!(detector
            .detect("Just ordinary prose without any headings.\nAnother line here.\n")
            .is_empty());
    }

    #[test]
    fn test_mid_paragraph_marker_penalized() {
        // Same marker text, once after unterminated prose, once after a blank
        let inline = "some prose that keeps going\nChapter 2: Basics\n";
        let standalone = "some prose that ends.\n\nChapter 2: Basics\n";
        let detector = StructureDetector::default();

        let inline_conf = detector
            .detect(inline)
            .first()
            .map(|e| e.confidence)
            .unwrap_or(0.0);
        let standalone_conf = detector.detect(standalone)[0].confidence;
        assert!(standalone_conf > inline_conf);
    }

    #[test]
    fn test_overlap_resolved_by_confidence() {
        // "Chapter 3: ..." is matched by the arabic chapter pattern at high
        // specificity; the bare-number family must not shadow it.
        let detector = StructureDetector::default();
        let elements = detector.detect("Chapter 3: Vector Spaces\n");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].number, Some(3));
        assert!(elements[0].confidence > 0.8);
    }

    #[test]
    fn test_page_numbers_from_form_feeds() {
        let text = "Chapter 1: One\n\nbody\n\u{0c}\nChapter 2: Two\n";
        let detector = StructureDetector::default();
        let elements = detector.detect(text);
        assert_eq!(elements[0].page_number, Some(1));
        assert_eq!(elements[1].page_number, Some(2));
    }

    #[test]
    fn test_min_confidence_filters_bare_numbers() {
        // A bare numbered list mid-paragraph should fall under the default
        // threshold once the mid-paragraph penalty applies.
        let text = "Consider the following\n1. first item continues the sentence\n";
        let detector = StructureDetector::default();
        assert!(detector.detect(text).is_empty());
    }
}
