use serde::{Deserialize, Serialize};

/// Kind of structural marker detected in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    /// Top-level chapter heading
    Chapter,
    /// Section within a chapter
    Section,
    /// Subsection within a section
    Subsection,
}

impl ElementType {
    /// Nesting level (chapters are shallowest)
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Chapter => 1,
            Self::Section => 2,
            Self::Subsection => 3,
        }
    }

    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chapter => "chapter",
            Self::Section => "section",
            Self::Subsection => "subsection",
        }
    }
}

/// Numbering convention a marker was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberingStyle {
    /// "1", "1.2", "1.2.3"
    Arabic,
    /// "IV", "Chapter XII"
    Roman,
    /// "A", "Appendix B", "A.1"
    Lettered,
    /// "Chapter One"
    Word,
}

impl NumberingStyle {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Arabic => "arabic",
            Self::Roman => "roman",
            Self::Lettered => "lettered",
            Self::Word => "word",
        }
    }
}

/// A detected structural marker with position and confidence.
///
/// Immutable once produced by the detector; consumed by the chunkers and
/// the quality assessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureElement {
    /// Kind of marker (chapter/section/subsection)
    pub element_type: ElementType,

    /// Title text following the marker, if any
    pub title: String,

    /// Normalized numeric value of the marker ("IV" -> 4, "One" -> 1).
    /// The leading component for dotted numbers ("3.2" -> 3 is the
    /// chapter; the full form is kept in `raw_number`).
    pub number: Option<u32>,

    /// Marker number exactly as written ("3.2", "IV", "A.1")
    pub raw_number: String,

    /// Nesting level (1 = chapter)
    pub level: u8,

    /// Numbering convention the marker used
    pub numbering_style: NumberingStyle,

    /// Byte offset of the marker line in the document
    pub start_position: usize,

    /// Byte offset where this element's span ends (start of the next
    /// element, or end of document)
    pub end_position: usize,

    /// Page the marker fell on, when page breaks are present in the text
    pub page_number: Option<u32>,

    /// Detection confidence in [0, 1]
    pub confidence: f32,

    /// The raw marker line
    pub raw_text: String,
}

impl StructureElement {
    /// Check whether this is a chapter-level marker
    #[must_use]
    pub const fn is_chapter(&self) -> bool {
        matches!(self.element_type, ElementType::Chapter)
    }

    /// Byte length of the span this element covers
    #[must_use]
    pub const fn span_len(&self) -> usize {
        self.end_position.saturating_sub(self.start_position)
    }
}
