//! Extraction pipeline configuration.

use std::path::PathBuf;

use scholia_core::defaults;

/// Tuning knobs for rubric selection, reasoning, and tag canonicalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// Directory holding `<id>.yaml` rubric files.
    pub rubrics_dir: PathBuf,
    /// Run the five-step chain before falling back to single-shot extraction.
    pub chain_of_thought: bool,
    /// Characters of full text included in the reasoning input.
    pub content_max_chars: usize,
    /// Run supporting rules concurrently in single-shot mode.
    pub parallel_legacy: bool,
    /// Similarity settings for label canonicalization.
    pub similarity: SimilarityConfig,
    /// Confidence recorded on derived paper-tag associations.
    pub paper_tag_confidence: f32,
}

/// Thresholds and sizes for the similarity index.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityConfig {
    /// Inclusive floor for a label to count as similar.
    pub threshold: f32,
    /// Inclusive floor for reusing an existing label outright.
    pub reuse_threshold: f32,
    /// Default result cap for similarity lookups.
    pub similar_limit: usize,
    /// Similar labels shown to the generator as examples.
    pub suggestion_examples: usize,
    /// Entries held in the embedding cache.
    pub cache_capacity: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: defaults::SIMILARITY_THRESHOLD,
            reuse_threshold: defaults::REUSE_THRESHOLD,
            similar_limit: defaults::SIMILAR_LIMIT,
            suggestion_examples: defaults::SUGGESTION_EXAMPLES,
            cache_capacity: defaults::EMBEDDING_CACHE_CAPACITY,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            rubrics_dir: PathBuf::from(defaults::RUBRICS_DIR),
            chain_of_thought: true,
            content_max_chars: defaults::CONTENT_MAX_CHARS,
            parallel_legacy: false,
            similarity: SimilarityConfig::default(),
            paper_tag_confidence: defaults::PAPER_TAG_CONFIDENCE,
        }
    }
}

impl ExtractionConfig {
    /// Load configuration from environment variables with fallback to defaults.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `SCHOLIA_RUBRICS_DIR` | `rubrics_dir` |
    /// | `SCHOLIA_CHAIN_OF_THOUGHT` | `chain_of_thought` |
    /// | `SCHOLIA_CONTENT_MAX_CHARS` | `content_max_chars` |
    /// | `SCHOLIA_PARALLEL_LEGACY` | `parallel_legacy` |
    /// | `SCHOLIA_SIMILARITY_THRESHOLD` | `similarity.threshold` |
    /// | `SCHOLIA_REUSE_THRESHOLD` | `similarity.reuse_threshold` |
    /// | `SCHOLIA_EMBEDDING_CACHE_CAPACITY` | `similarity.cache_capacity` |
    /// | `SCHOLIA_PAPER_TAG_CONFIDENCE` | `paper_tag_confidence` |
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("SCHOLIA_RUBRICS_DIR") {
            if !dir.trim().is_empty() {
                config.rubrics_dir = PathBuf::from(dir);
            }
        }

        if let Ok(val) = std::env::var("SCHOLIA_CHAIN_OF_THOUGHT") {
            config.chain_of_thought = val != "false" && val != "0";
        }

        if let Ok(val) = std::env::var("SCHOLIA_CONTENT_MAX_CHARS") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.content_max_chars = n,
                _ => tracing::warn!(
                    value = %val,
                    "Invalid SCHOLIA_CONTENT_MAX_CHARS, using default"
                ),
            }
        }

        if let Ok(val) = std::env::var("SCHOLIA_PARALLEL_LEGACY") {
            config.parallel_legacy = val == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("SCHOLIA_SIMILARITY_THRESHOLD") {
            match val.parse::<f32>() {
                Ok(t) => config.similarity.threshold = t.clamp(0.0, 1.0),
                Err(_) => {
                    tracing::warn!(
                        value = %val,
                        "Invalid SCHOLIA_SIMILARITY_THRESHOLD, using default"
                    )
                }
            }
        }

        if let Ok(val) = std::env::var("SCHOLIA_REUSE_THRESHOLD") {
            match val.parse::<f32>() {
                Ok(t) => config.similarity.reuse_threshold = t.clamp(0.0, 1.0),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid SCHOLIA_REUSE_THRESHOLD, using default")
                }
            }
        }

        if let Ok(val) = std::env::var("SCHOLIA_EMBEDDING_CACHE_CAPACITY") {
            if let Ok(n) = val.parse::<usize>() {
                config.similarity.cache_capacity = n.max(1);
            }
        }

        if let Ok(val) = std::env::var("SCHOLIA_PAPER_TAG_CONFIDENCE") {
            match val.parse::<f32>() {
                Ok(c) => config.paper_tag_confidence = c.clamp(0.0, 1.0),
                Err(_) => {
                    tracing::warn!(
                        value = %val,
                        "Invalid SCHOLIA_PAPER_TAG_CONFIDENCE, using default"
                    )
                }
            }
        }

        config
    }
}
