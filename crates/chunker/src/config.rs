use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for chunking behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Target chunk size in characters for content-aware chunking
    pub content_aware_target_size: usize,

    /// Target chunk size in characters for fallback chunking
    pub fallback_target_size: usize,

    /// Fixed character overlap between consecutive fallback chunks
    pub fallback_overlap: usize,

    /// Minimum useful chunk size; trailing fragments below this are
    /// merged into the previous chunk
    pub min_chunk_size: usize,

    /// Bounded worker count for parallel span/batch processing
    pub max_workers: usize,

    /// Confidence assigned to force-split chunks
    pub force_split_confidence: f32,

    /// Run both strategies and keep the better one when the caller
    /// forces neither
    pub enable_hybrid: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            content_aware_target_size: 500,
            fallback_target_size: 400,
            fallback_overlap: 200,
            min_chunk_size: 40,
            max_workers: 4,
            force_split_confidence: 0.5,
            enable_hybrid: false,
        }
    }
}

impl ChunkerConfig {
    /// Create config optimized for embedding quality (smaller chunks)
    #[must_use]
    pub fn for_embeddings() -> Self {
        Self {
            content_aware_target_size: 400,
            fallback_target_size: 320,
            fallback_overlap: 160,
            ..Default::default()
        }
    }

    /// Create config optimized for throughput (bigger windows, no hybrid)
    #[must_use]
    pub fn for_speed() -> Self {
        Self {
            content_aware_target_size: 800,
            fallback_target_size: 800,
            fallback_overlap: 100,
            enable_hybrid: false,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.content_aware_target_size == 0 || self.fallback_target_size == 0 {
            return Err(ChunkerError::InvalidConfig(
                "target sizes must be > 0".to_string(),
            ));
        }
        if self.fallback_overlap >= self.fallback_target_size {
            return Err(ChunkerError::InvalidConfig(format!(
                "fallback_overlap ({}) must be smaller than fallback_target_size ({})",
                self.fallback_overlap, self.fallback_target_size
            )));
        }
        if self.min_chunk_size > self.fallback_target_size {
            return Err(ChunkerError::InvalidConfig(format!(
                "min_chunk_size ({}) cannot exceed fallback_target_size ({})",
                self.min_chunk_size, self.fallback_target_size
            )));
        }
        if self.max_workers == 0 {
            return Err(ChunkerError::InvalidConfig(
                "max_workers must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.force_split_confidence) {
            return Err(ChunkerError::InvalidConfig(
                "force_split_confidence must be in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(ChunkerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_preset_configs_valid() {
        assert!(ChunkerConfig::for_embeddings().validate().is_ok());
        assert!(ChunkerConfig::for_speed().validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ChunkerConfig::default();

        // Invalid: overlap >= target
        config.fallback_overlap = 400;
        config.fallback_target_size = 400;
        assert!(config.validate().is_err());

        // Invalid: zero workers
        config = ChunkerConfig::default();
        config.max_workers = 0;
        assert!(config.validate().is_err());

        // Invalid: zero target
        config = ChunkerConfig::default();
        config.content_aware_target_size = 0;
        assert!(config.validate().is_err());

        // Valid again
        config = ChunkerConfig::default();
        assert!(config.validate().is_ok());
    }
}
