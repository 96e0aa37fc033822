//! End-to-end extraction: rubric selection, reasoning, and tag derivation.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::instrument;
use uuid::Uuid;

use scholia_core::{
    EmbeddingBackend, Insight, Paper, PaperTag, ReasoningBackend, Tag, TagRepository,
};

use crate::config::ExtractionConfig;
use crate::reasoning::{ChainOfThought, ChainOutcome, LegacyExtractor};
use crate::rubric::{ReviewDecision, Rubric, RuleCatalog};
use crate::similarity::SimilarityIndex;
use crate::tagging::candidate_terms;

/// Canonical labels derived from a batch of insights.
#[derive(Debug, Clone, Default)]
pub struct TagDerivation {
    /// Distinct labels, in first-seen order.
    pub tags: Vec<Tag>,
    /// One association per (paper, label).
    pub associations: Vec<PaperTag>,
}

/// Everything produced for one paper.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub rubric: Arc<Rubric>,
    pub insights: Vec<Insight>,
    pub tags: Vec<Tag>,
    pub associations: Vec<PaperTag>,
}

impl PipelineOutput {
    /// Review routing for one of this output's insights.
    pub fn review(&self, insight: &Insight) -> ReviewDecision {
        self.rubric.review(insight.confidence)
    }
}

/// Paper to insights and labels.
pub struct ReasoningPipeline {
    reasoning: Arc<dyn ReasoningBackend>,
    catalog: Arc<RuleCatalog>,
    similarity: SimilarityIndex,
    config: ExtractionConfig,
}

impl ReasoningPipeline {
    pub fn new(
        reasoning: Arc<dyn ReasoningBackend>,
        embedder: Arc<dyn EmbeddingBackend>,
        tags: Arc<dyn TagRepository>,
        catalog: Arc<RuleCatalog>,
        config: ExtractionConfig,
    ) -> Self {
        let similarity = SimilarityIndex::new(
            embedder,
            Arc::clone(&reasoning),
            tags,
            config.similarity.clone(),
        );
        Self {
            reasoning,
            catalog,
            similarity,
            config,
        }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn similarity(&self) -> &SimilarityIndex {
        &self.similarity
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn legacy(&self) -> LegacyExtractor<'_> {
        LegacyExtractor::new(&*self.reasoning, self.config.content_max_chars)
            .parallel(self.config.parallel_legacy)
    }

    /// Insights for a paper under the rubric its classification selects.
    #[instrument(
        skip(self, paper),
        fields(subsystem = "pipeline", op = "extract", paper_id = %paper.id)
    )]
    pub async fn extract(&self, paper: &Paper) -> Vec<Insight> {
        let rubric = self.catalog.select_for(paper.paper_type);
        self.extract_with_rubric(paper, &rubric).await
    }

    /// Chain first; single-shot when the chain yields no key finding.
    ///
    /// A chain key finding is followed by the supporting rules that still add
    /// value next to it.
    pub async fn extract_with_rubric(&self, paper: &Paper, rubric: &Rubric) -> Vec<Insight> {
        if self.config.chain_of_thought {
            let outcome = self.extract_chain_of_thought(paper, rubric).await;
            if !outcome.insights.is_empty() {
                let mut insights = outcome.insights;
                insights.extend(self.legacy().supporting(paper, rubric, true).await);
                return insights;
            }
            tracing::warn!(
                subsystem = "pipeline",
                paper_id = %paper.id,
                rubric_id = %rubric.id,
                "Chain produced no key finding, falling back to single-shot extraction"
            );
        }
        self.extract_legacy(paper, rubric).await
    }

    pub async fn extract_chain_of_thought(&self, paper: &Paper, rubric: &Rubric) -> ChainOutcome {
        ChainOfThought::new(&*self.reasoning, self.config.content_max_chars)
            .run(paper, rubric)
            .await
    }

    pub async fn extract_legacy(&self, paper: &Paper, rubric: &Rubric) -> Vec<Insight> {
        self.legacy().run(paper, rubric).await
    }

    /// Canonicalize each insight's candidate terms and link them to papers.
    ///
    /// A term that fails canonicalization is logged and skipped.
    #[instrument(skip(self, insights), fields(subsystem = "pipeline", op = "derive_tags"))]
    pub async fn derive_tags(&self, insights: &[Insight]) -> TagDerivation {
        let mut derivation = TagDerivation::default();
        let mut seen_tags: HashSet<Uuid> = HashSet::new();
        let mut seen_links: HashSet<(Uuid, Uuid)> = HashSet::new();

        for insight in insights {
            for candidate in candidate_terms(insight) {
                let tag = match self
                    .similarity
                    .canonicalize(&candidate.term, candidate.category, &candidate.description)
                    .await
                {
                    Ok(Some(tag)) => tag,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::warn!(
                            term = %candidate.term,
                            error = %e,
                            "Canonicalization failed, term skipped"
                        );
                        continue;
                    }
                };

                if seen_links.insert((insight.paper_id, tag.id)) {
                    derivation.associations.push(PaperTag {
                        confidence: self.config.paper_tag_confidence,
                        ..PaperTag::automatic(insight.paper_id, tag.id)
                    });
                }
                if seen_tags.insert(tag.id) {
                    derivation.tags.push(tag);
                }
            }
        }

        tracing::debug!(
            result_count = derivation.tags.len(),
            associations = derivation.associations.len(),
            "Tags derived"
        );
        derivation
    }

    /// Extract insights and derive labels for one paper.
    #[instrument(
        skip(self, paper),
        fields(subsystem = "pipeline", op = "process", paper_id = %paper.id)
    )]
    pub async fn process(&self, paper: &Paper) -> PipelineOutput {
        let start = Instant::now();
        let rubric = self.catalog.select_for(paper.paper_type);
        let insights = self.extract_with_rubric(paper, &rubric).await;
        let TagDerivation { tags, associations } = self.derive_tags(&insights).await;

        tracing::info!(
            rubric_id = %rubric.id,
            model = self.reasoning.model_name(),
            result_count = insights.len(),
            tags = tags.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Paper processed"
        );

        PipelineOutput {
            rubric,
            insights,
            tags,
            associations,
        }
    }
}

impl std::fmt::Debug for ReasoningPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningPipeline")
            .field("model", &self.reasoning.model_name())
            .field("config", &self.config)
            .finish()
    }
}
