//! Centralized default constants for scholia.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// TEXT PREPARATION
// =============================================================================

/// Maximum characters of full text passed to the reasoning service.
pub const CONTENT_MAX_CHARS: usize = 8000;

// =============================================================================
// CONFIDENCE
// =============================================================================

/// Multiplier applied once when an extraction violates any validation predicate.
pub const VALIDATION_PENALTY: f32 = 0.7;

/// Multiplier applied to the mean step confidence of a completed reasoning chain.
pub const CHAIN_CONFIDENCE_BONUS: f32 = 1.1;

/// Minimum confidence when a rule does not specify one.
pub const RULE_MIN_CONFIDENCE: f32 = 0.5;

/// Insights at or above this confidence count as high-confidence.
pub const HIGH_CONFIDENCE: f32 = 0.8;

/// Default completeness target for structure-completeness scoring.
pub const STRUCTURE_TARGET: f32 = 0.5;

/// Default target for coverage-analysis scoring.
pub const COVERAGE_TARGET: f32 = 0.7;

/// Default target for application-completeness scoring.
pub const APPLICATION_TARGET: f32 = 0.75;

/// Default target for benchmark-completeness scoring.
pub const BENCHMARK_TARGET: f32 = 0.6;

/// Default target for tutorial-completeness scoring.
pub const TUTORIAL_TARGET: f32 = 0.7;

/// Default target for content-completeness scoring.
pub const CONTENT_TARGET: f32 = 0.7;

// =============================================================================
// SIMILARITY
// =============================================================================

/// Minimum cosine similarity for a label to appear in similarity results.
pub const SIMILARITY_THRESHOLD: f32 = 0.85;

/// Similarity at which an existing label is reused instead of creating one.
pub const REUSE_THRESHOLD: f32 = 0.9;

/// Default number of similar labels returned by a search.
pub const SIMILAR_LIMIT: usize = 5;

/// Number of similar labels offered to the generator as examples.
pub const SUGGESTION_EXAMPLES: usize = 3;

/// Embedding cache capacity (labels).
pub const EMBEDDING_CACHE_CAPACITY: usize = 10_000;

// =============================================================================
// TAGS
// =============================================================================

/// Maximum characters in a tag name.
pub const TAG_NAME_MAX_CHARS: usize = 50;

/// Maximum hyphen-separated words in a canonical label.
pub const TAG_MAX_WORDS: usize = 3;

/// Confidence recorded on automatically derived paper-tag associations.
pub const PAPER_TAG_CONFIDENCE: f32 = 0.8;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default OpenAI-compatible endpoint.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default generation model.
pub const GEN_MODEL: &str = "gpt-4o-mini";

/// Default embedding model.
pub const EMBED_MODEL: &str = "text-embedding-3-small";

/// Embedding dimension for text-embedding-3-small.
pub const EMBED_DIMENSION: usize = 1536;

/// Sampling temperature for structured extraction.
pub const EXTRACT_TEMPERATURE: f32 = 0.1;

/// Token ceiling for structured extraction responses.
pub const EXTRACT_MAX_TOKENS: u32 = 2000;

/// Sampling temperature for free-form generation.
pub const GENERATE_TEMPERATURE: f32 = 0.7;

/// Token ceiling for free-form generation.
pub const GENERATE_MAX_TOKENS: u32 = 1000;

// =============================================================================
// RESILIENCE
// =============================================================================

/// Per-call deadline for reasoning and embedding calls.
pub const CALL_TIMEOUT_SECS: u64 = 120;

/// Retries after the first attempt for transient failures.
pub const MAX_RETRIES: u32 = 2;

/// Delay before the first retry.
pub const INITIAL_BACKOFF_MS: u64 = 500;

/// Upper bound for any single retry delay.
pub const MAX_BACKOFF_MS: u64 = 8_000;

/// Growth factor between successive retry delays.
pub const BACKOFF_MULTIPLIER: f64 = 2.0;

// =============================================================================
// RUBRICS
// =============================================================================

/// Directory holding `<id>.yaml` rubric files.
pub const RUBRICS_DIR: &str = "rubrics";
