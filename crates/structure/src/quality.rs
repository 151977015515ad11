use crate::error::{Result, StructureError};
use crate::types::StructureElement;
use serde::{Deserialize, Serialize};

/// Chunking strategy recommended by the assessor (and executed downstream)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkingStrategy {
    /// Split along detected structural boundaries
    ContentAware,
    /// Paragraph/sentence windows with overlap, no structural awareness
    Fallback,
    /// Run both and keep the one with better chunk-size variance
    Hybrid,
}

impl ChunkingStrategy {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContentAware => "content_aware",
            Self::Fallback => "fallback",
            Self::Hybrid => "hybrid",
        }
    }
}

/// Fixed weights for combining the four sub-scores.
///
/// These are configuration, not derived quantities; they must sum to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualityWeights {
    pub extraction: f32,
    pub structure: f32,
    pub retention: f32,
    pub validity: f32,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            extraction: 0.3,
            structure: 0.3,
            retention: 0.2,
            validity: 0.2,
        }
    }
}

/// Configuration for structure quality assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessorConfig {
    pub weights: QualityWeights,

    /// Minimum chapter count for a document to look like a textbook
    pub min_chapter_count: usize,

    /// Overall score at or above this recommends content-aware chunking
    pub structure_quality_threshold: f32,
}

impl Default for AssessorConfig {
    fn default() -> Self {
        Self {
            weights: QualityWeights::default(),
            min_chapter_count: 3,
            structure_quality_threshold: 0.3,
        }
    }
}

impl AssessorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let sum = self.weights.extraction
            + self.weights.structure
            + self.weights.retention
            + self.weights.validity;
        if (sum - 1.0).abs() > 1e-3 {
            return Err(StructureError::InvalidConfig(format!(
                "quality weights must sum to 1.0, got {sum}"
            )));
        }
        if !(0.0..=1.0).contains(&self.structure_quality_threshold) {
            return Err(StructureError::InvalidConfig(format!(
                "structure_quality_threshold must be in [0, 1], got {}",
                self.structure_quality_threshold
            )));
        }
        Ok(())
    }
}

/// Quality scores for one detection run. Derived data, not persisted
/// beyond the processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// Mean element confidence
    pub extraction_confidence: f32,

    /// Density and level-consistency of the detected elements
    pub structure_detection_score: f32,

    /// cleaned length / original length, capped at 1
    pub retention_ratio: f32,

    /// How close the chapter count comes to a plausible textbook
    pub textbook_validity: f32,

    /// Weighted combination in [0, 1]
    pub overall_quality_score: f32,

    /// Strategy the decision rule picked
    pub recommended_strategy: ChunkingStrategy,
}

/// Scores a detected structure set and recommends a chunking strategy.
pub struct StructureQualityAssessor {
    config: AssessorConfig,
}

impl StructureQualityAssessor {
    #[must_use]
    pub fn new(config: AssessorConfig) -> Self {
        Self { config }
    }

    /// Assess `elements` detected from a document whose original text was
    /// `original_len` bytes and whose cleaned text is `cleaned_len` bytes.
    #[must_use]
    pub fn assess(
        &self,
        elements: &[StructureElement],
        original_len: usize,
        cleaned_len: usize,
    ) -> QualityAssessment {
        let extraction_confidence = if elements.is_empty() {
            0.0
        } else {
            elements.iter().map(|e| e.confidence).sum::<f32>() / elements.len() as f32
        };

        let structure_detection_score = Self::structure_score(elements, cleaned_len);
        let retention_ratio = Self::retention_score(original_len, cleaned_len);

        let chapters = elements.iter().filter(|e| e.is_chapter()).count();
        let textbook_validity = if self.config.min_chapter_count == 0 {
            1.0
        } else {
            (chapters as f32 / self.config.min_chapter_count as f32).min(1.0)
        };

        let w = self.config.weights;
        let overall_quality_score = (w.extraction * extraction_confidence
            + w.structure * structure_detection_score
            + w.retention * retention_ratio
            + w.validity * textbook_validity)
            .clamp(0.0, 1.0);

        let recommended_strategy =
            if overall_quality_score >= self.config.structure_quality_threshold {
                ChunkingStrategy::ContentAware
            } else {
                ChunkingStrategy::Fallback
            };

        log::debug!(
            "Quality assessment: overall={overall_quality_score:.3} (extraction={extraction_confidence:.3} structure={structure_detection_score:.3} retention={retention_ratio:.3} validity={textbook_validity:.3}) -> {}",
            recommended_strategy.as_str()
        );

        QualityAssessment {
            extraction_confidence,
            structure_detection_score,
            retention_ratio,
            textbook_validity,
            overall_quality_score,
            recommended_strategy,
        }
    }

    /// Element density per 10k chars plus level consistency.
    fn structure_score(elements: &[StructureElement], cleaned_len: usize) -> f32 {
        if elements.is_empty() || cleaned_len == 0 {
            return 0.0;
        }

        // One heading per 2000 chars saturates the density component
        let per_10k = elements.len() as f32 * 10_000.0 / cleaned_len as f32;
        let density = (per_10k / 5.0).min(1.0);

        // Sections/subsections appearing before any chapter are orphans
        let mut seen_chapter = false;
        let mut orphans = 0usize;
        for element in elements {
            if element.is_chapter() {
                seen_chapter = true;
            } else if !seen_chapter {
                orphans += 1;
            }
        }
        let consistency = 1.0 - orphans as f32 / elements.len() as f32;

        0.6 * density + 0.4 * consistency
    }

    /// Retention of cleaned text relative to the original. Over-aggressive
    /// cleaning (under half the original surviving) is penalized twice as
    /// steeply.
    fn retention_score(original_len: usize, cleaned_len: usize) -> f32 {
        if original_len == 0 {
            return 0.0;
        }
        let ratio = (cleaned_len as f32 / original_len as f32).min(1.0);
        if ratio < 0.5 {
            ratio * 0.5
        } else {
            ratio
        }
    }
}

impl Default for StructureQualityAssessor {
    fn default() -> Self {
        Self::new(AssessorConfig::default())
    }
}
