//! # Tome Structure
//!
//! Heuristic structure detection and quality assessment for long-form
//! technical documents (textbooks).
//!
//! ## Philosophy
//!
//! There is no formal grammar for textbook layout. Instead of one
//! authoritative regex, several small pattern families (arabic, roman,
//! lettered, word-based numbering) each vote on line-level candidates,
//! and every match carries a confidence combining pattern specificity
//! with position plausibility. Absence of structure is a legitimate,
//! quality-bearing signal, never an error.
//!
//! ## Architecture
//!
//! ```text
//! Normalized Text
//!     │
//!     ├──> Pattern Families (arabic / roman / lettered / word)
//!     │      └─> line-level candidates with confidence
//!     │
//!     ├──> StructureDetector
//!     │      ├─> overlap resolution (highest confidence wins)
//!     │      └─> ordered StructureElement[]
//!     │
//!     └──> StructureQualityAssessor
//!            └─> QualityAssessment + recommended chunking strategy
//! ```

mod detector;
mod error;
mod patterns;
mod quality;
mod types;

pub use detector::{DetectorConfig, StructureDetector};
pub use error::{Result, StructureError};
pub use patterns::{
    ArabicFamily, LetteredFamily, PatternFamily, PatternMatch, RomanFamily, WordFamily,
};
pub use quality::{
    AssessorConfig, ChunkingStrategy, QualityAssessment, QualityWeights, StructureQualityAssessor,
};
pub use types::{ElementType, NumberingStyle, StructureElement};
