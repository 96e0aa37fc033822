//! # scholia-extract
//!
//! Rubric-driven insight extraction for research papers.
//!
//! - [`rubric`]: YAML rubrics, the default set, and the [`RuleCatalog`].
//! - [`reasoning`]: the five-step chain and the single-shot fallback.
//! - [`confidence`] and [`validation`]: scoring and penalties.
//! - [`similarity`]: embedding-backed label canonicalization.
//! - [`pipeline`]: the [`ReasoningPipeline`] tying it together.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scholia_extract::{ExtractionConfig, InMemoryTagRepository, ReasoningPipeline, RuleCatalog};
//!
//! let config = ExtractionConfig::from_env();
//! let catalog = Arc::new(RuleCatalog::yaml(&config.rubrics_dir));
//! catalog.bootstrap()?;
//!
//! let backend = Arc::new(scholia_inference::InferenceConfig::load()?.build_backend()?);
//! let pipeline = ReasoningPipeline::new(
//!     backend.clone(),
//!     backend,
//!     Arc::new(InMemoryTagRepository::new()),
//!     catalog,
//!     config,
//! );
//! let output = pipeline.process(&paper).await;
//! ```

pub mod confidence;
pub mod config;
pub mod memory;
pub mod pipeline;
pub mod reasoning;
pub mod rubric;
pub mod similarity;
pub mod tagging;
pub mod validation;

pub use confidence::ConfidenceStrategy;
pub use config::{ExtractionConfig, SimilarityConfig};
pub use memory::InMemoryTagRepository;
pub use pipeline::{PipelineOutput, ReasoningPipeline, TagDerivation};
pub use reasoning::{prepare_text, ChainOutcome, ReasoningContext, ReasoningStep};
pub use rubric::{
    ExtractionRule, InMemoryRubricStore, QualityThresholds, ReviewDecision, Rubric, RubricStore,
    RuleCatalog, YamlRubricStore,
};
pub use similarity::{Recommendation, SimilarMatch, SimilarityIndex, SimilarityVerdict};
pub use tagging::{candidate_terms, CandidateTerm};
pub use validation::{Check, ValidationPredicate};
