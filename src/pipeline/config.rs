/*!
 * Pipeline configuration.
 */

use crate::detection::DetectorConfig;
use crate::document::SegmentationConfig;
use crate::scripture::NormalizerConfig;

/// Configuration for the sermon pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Reference normalization before anything else
    pub normalizer: NormalizerConfig,

    /// Quote boundary detection
    pub detector: DetectorConfig,

    /// Topic segmentation (Pass B)
    pub segmentation: SegmentationConfig,

    /// Translation requested when a candidate names none
    pub translation: Option<String>,

    /// Deadline for one verse lookup
    pub lookup_timeout_ms: u64,

    /// Deadline for one similarity request
    pub scorer_timeout_ms: u64,

    /// Similarity requests in flight at once
    pub max_concurrent_requests: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            detector: DetectorConfig::default(),
            segmentation: SegmentationConfig::default(),
            translation: None,
            lookup_timeout_ms: 30_000,
            scorer_timeout_ms: 5_000,
            max_concurrent_requests: 8,
        }
    }
}

impl PipelineConfig {
    /// Passages only; no topic segmentation.
    pub fn passages_only() -> Self {
        let mut config = Self::default();
        config.segmentation.enabled = false;
        config
    }

    /// Fewer, longer paragraphs.
    pub fn coarse() -> Self {
        Self {
            segmentation: SegmentationConfig::coarse(),
            ..Self::default()
        }
    }

    /// More, shorter paragraphs.
    pub fn detailed() -> Self {
        Self {
            segmentation: SegmentationConfig::detailed(),
            ..Self::default()
        }
    }

    pub fn with_normalizer(mut self, config: NormalizerConfig) -> Self {
        self.normalizer = config;
        self
    }

    pub fn with_detector(mut self, config: DetectorConfig) -> Self {
        self.detector = config;
        self
    }

    pub fn with_segmentation(mut self, config: SegmentationConfig) -> Self {
        self.segmentation = config;
        self
    }

    pub fn with_translation(mut self, translation: Option<String>) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_timeouts(mut self, lookup_timeout_ms: u64, scorer_timeout_ms: u64) -> Self {
        self.lookup_timeout_ms = lookup_timeout_ms;
        self.scorer_timeout_ms = scorer_timeout_ms;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.detector.validate()?;
        self.segmentation.validate()?;
        if self.lookup_timeout_ms == 0 || self.scorer_timeout_ms == 0 {
            return Err("Timeouts must be greater than zero".to_string());
        }
        if self.max_concurrent_requests == 0 {
            return Err("max_concurrent_requests must be at least 1".to_string());
        }
        Ok(())
    }
}
