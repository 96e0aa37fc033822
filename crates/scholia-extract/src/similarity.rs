//! Embedding-based label similarity and canonicalization.
//!
//! Label embeddings are cached per label string in a shared LRU. Any
//! embedding failure degrades to "no similar labels" rather than an error.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::instrument;

use scholia_core::{
    clean_label, cosine_similarity, validate_label, ChatMessage, EmbeddingBackend, Error,
    ReasoningBackend, Result, Tag, TagCategory, TagRepository, Vector,
};

use crate::config::SimilarityConfig;

const SUGGESTION_SYSTEM_PROMPT: &str = "You are a research paper tagging expert. Your job is to \
convert specific, paper-specific terms into generalized tags that can be reused across many \
different papers.";

const SUGGESTION_GUIDELINES: &str = "\
CRITICAL GUIDELINES:
1. ALWAYS generalize - never use paper-specific terms
2. Use lowercase with hyphens: \"machine-learning\", \"neural-networks\"
3. Use standard, widely-recognized terminology from the field
4. Keep it concise (2-3 words maximum)
5. The tag should be applicable to HUNDREDS of papers, not just this one
6. If the input is a specific action or analysis, convert it to a general methodology or concept
7. NEVER include specific paper details, model names, or dataset names
8. Focus on the BROADER concept or methodology

EXAMPLES OF GENERALIZATION:
- \"Analyze the relationship between model size and dataset size\" -> \"scaling-analysis\"
- \"Derive equations for overfitting\" -> \"overfitting-analysis\"
- \"Train transformer model on large dataset\" -> \"model-training\"
- \"Evaluate performance on benchmark tasks\" -> \"benchmark-evaluation\"
- \"Implement attention mechanism\" -> \"attention-mechanism\"";

/// An existing label and its similarity to a query term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarMatch {
    pub tag: Tag,
    pub similarity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Proceed,
    MergeOrReuse,
}

/// Whether a new label would duplicate an existing one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityVerdict {
    pub is_too_similar: bool,
    pub similar: Vec<SimilarMatch>,
    pub recommendation: Recommendation,
    /// Best existing label to reuse instead.
    pub suggested_reuse: Option<Tag>,
}

impl SimilarityVerdict {
    fn proceed() -> Self {
        Self {
            is_too_similar: false,
            similar: Vec::new(),
            recommendation: Recommendation::Proceed,
            suggested_reuse: None,
        }
    }
}

/// Keep scores at or above `threshold`, best first, at most `limit`.
pub fn rank_matches(scored: Vec<(Tag, f32)>, threshold: f32, limit: usize) -> Vec<SimilarMatch> {
    let mut matches: Vec<SimilarMatch> = scored
        .into_iter()
        .filter(|(_, similarity)| *similarity >= threshold)
        .map(|(tag, similarity)| SimilarMatch { tag, similarity })
        .collect();
    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    matches.truncate(limit);
    matches
}

/// Pull a label out of free-form generator output.
pub fn parse_suggestion(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let lowered = line.to_lowercase();
    let stripped = lowered
        .strip_prefix("suggested tag:")
        .map(str::trim)
        .unwrap_or(&lowered);
    let unquoted = stripped.trim_matches(|c| c == '"' || c == '\'' || c == '`');
    let label = clean_label(unquoted);
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

/// Similarity search, label suggestion, and get-or-create over a tag repository.
pub struct SimilarityIndex {
    embedder: Arc<dyn EmbeddingBackend>,
    reasoning: Arc<dyn ReasoningBackend>,
    tags: Arc<dyn TagRepository>,
    cache: Arc<Mutex<LruCache<String, Vector>>>,
    config: SimilarityConfig,
}

impl SimilarityIndex {
    pub fn new(
        embedder: Arc<dyn EmbeddingBackend>,
        reasoning: Arc<dyn ReasoningBackend>,
        tags: Arc<dyn TagRepository>,
        config: SimilarityConfig,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            embedder,
            reasoning,
            tags,
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            config,
        }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    pub fn tags(&self) -> &Arc<dyn TagRepository> {
        &self.tags
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
        tracing::info!(subsystem = "similarity", "Embedding cache cleared");
    }

    pub async fn cached_embeddings(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Embeddings for `texts` in order, embedding only cache misses.
    async fn embeddings(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let mut found: Vec<Option<Vector>> = Vec::with_capacity(texts.len());
        let mut missing: Vec<String> = Vec::new();
        {
            let mut cache = self.cache.lock().await;
            for text in texts {
                let hit = cache.get(text).cloned();
                if hit.is_none() && !missing.contains(text) {
                    missing.push(text.clone());
                }
                found.push(hit);
            }
        }

        if missing.is_empty() {
            return Ok(found.into_iter().flatten().collect());
        }

        let vectors = self.embedder.embed_texts(&missing).await?;
        if vectors.len() != missing.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                missing.len(),
                vectors.len()
            )));
        }
        let fresh: HashMap<String, Vector> = missing.into_iter().zip(vectors).collect();
        {
            let mut cache = self.cache.lock().await;
            for (text, vector) in &fresh {
                cache.put(text.clone(), vector.clone());
            }
        }

        found
            .into_iter()
            .zip(texts)
            .map(|(hit, text)| match hit {
                Some(vector) => Ok(vector),
                None => fresh
                    .get(text)
                    .cloned()
                    .ok_or_else(|| Error::Embedding(format!("no embedding for {:?}", text))),
            })
            .collect()
    }

    /// Score `term` against `candidates`; `None` when embedding fails.
    async fn score(&self, term: &str, candidates: Vec<Tag>) -> Option<Vec<(Tag, f32)>> {
        if candidates.is_empty() {
            return Some(Vec::new());
        }
        let mut texts = Vec::with_capacity(candidates.len() + 1);
        texts.push(term.to_string());
        texts.extend(candidates.iter().map(|t| t.name.clone()));

        match self.embeddings(&texts).await {
            Ok(vectors) => {
                let query = &vectors[0];
                Some(
                    candidates
                        .into_iter()
                        .zip(&vectors[1..])
                        .map(|(tag, vector)| {
                            let similarity = cosine_similarity(query, vector);
                            tracing::trace!(
                                subsystem = "similarity",
                                term = %term,
                                candidate = %tag.name,
                                similarity,
                                "Scored candidate"
                            );
                            (tag, similarity)
                        })
                        .collect(),
                )
            }
            Err(e) => {
                tracing::error!(
                    subsystem = "similarity",
                    term = %term,
                    error = %e,
                    "Embedding failed, treating as no similar labels"
                );
                None
            }
        }
    }

    /// Existing labels in `category` at or above the similarity threshold.
    #[instrument(skip(self), fields(subsystem = "similarity", op = "find_similar"))]
    pub async fn find_similar(
        &self,
        term: &str,
        category: TagCategory,
        limit: usize,
    ) -> Result<Vec<SimilarMatch>> {
        let existing = self.tags.list_by_category(category).await?;
        let scored = self.score(term, existing).await.unwrap_or_default();
        let matches = rank_matches(scored, self.config.threshold, limit);
        tracing::debug!(result_count = matches.len(), "Similarity search complete");
        Ok(matches)
    }

    /// Ask the generator for a reusable label for `term`.
    pub async fn suggest_canonical(&self, term: &str, category: TagCategory) -> Option<String> {
        let similar = match self
            .find_similar(term, category, self.config.suggestion_examples)
            .await
        {
            Ok(similar) => similar,
            Err(e) => {
                tracing::warn!(
                    subsystem = "similarity",
                    term = %term,
                    error = %e,
                    "Could not list labels for suggestion"
                );
                Vec::new()
            }
        };
        self.suggest_with(term, category, &similar).await
    }

    async fn suggest_with(
        &self,
        term: &str,
        category: TagCategory,
        similar: &[SimilarMatch],
    ) -> Option<String> {
        let examples: Vec<&str> = similar
            .iter()
            .take(self.config.suggestion_examples)
            .map(|m| m.tag.name.as_str())
            .collect();
        let examples = if examples.is_empty() {
            "None found".to_string()
        } else {
            examples.join(", ")
        };

        let prompt = format!(
            "{}\n\nInput term: \"{}\"\nCategory: {}\nSimilar existing tags: {}\n\n\
             Convert the input term into a generalized tag that follows the guidelines above. \
             Return only the tag name, no explanation.\n\nSuggested tag:",
            SUGGESTION_GUIDELINES, term, category, examples
        );
        let messages = [
            ChatMessage::system(SUGGESTION_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];

        match self.reasoning.generate(&messages).await {
            Ok(raw) => {
                let label = parse_suggestion(&raw);
                tracing::debug!(
                    subsystem = "similarity",
                    term = %term,
                    suggestion = ?label,
                    "Label suggested"
                );
                label
            }
            Err(e) => {
                tracing::warn!(
                    subsystem = "similarity",
                    term = %term,
                    error = %e,
                    "Label suggestion failed"
                );
                None
            }
        }
    }

    /// Compare a proposed label with `existing` at the reuse threshold.
    pub async fn validate_similarity(
        &self,
        candidate: &str,
        existing: &[Tag],
    ) -> SimilarityVerdict {
        let Some(scored) = self.score(candidate, existing.to_vec()).await else {
            return SimilarityVerdict::proceed();
        };
        let similar = rank_matches(scored, self.config.reuse_threshold, usize::MAX);
        match similar.first() {
            Some(best) => SimilarityVerdict {
                is_too_similar: true,
                suggested_reuse: Some(best.tag.clone()),
                recommendation: Recommendation::MergeOrReuse,
                similar,
            },
            None => SimilarityVerdict::proceed(),
        }
    }

    /// Resolve `term` to a canonical label, reusing before creating.
    ///
    /// `Ok(None)` means the term was abandoned: no usable suggestion, or the
    /// suggestion failed label validation.
    #[instrument(
        skip(self, description),
        fields(subsystem = "similarity", op = "canonicalize")
    )]
    pub async fn canonicalize(
        &self,
        term: &str,
        category: TagCategory,
        description: &str,
    ) -> Result<Option<Tag>> {
        let similar = self
            .find_similar(term, category, self.config.similar_limit)
            .await?;
        if let Some(best) = similar.first() {
            if best.similarity >= self.config.reuse_threshold {
                tracing::info!(
                    tag = %best.tag.name,
                    similarity = best.similarity,
                    "Reusing similar label"
                );
                return Ok(Some(best.tag.clone()));
            }
        }

        let Some(label) = self.suggest_with(term, category, &similar).await else {
            tracing::debug!("No usable suggestion, term abandoned");
            return Ok(None);
        };

        if let Err(rejection) = validate_label(&label, category) {
            tracing::debug!(label = %label, reason = %rejection, "Suggested label rejected");
            return Ok(None);
        }

        let existing = self.tags.list_by_category(category).await?;
        let verdict = self.validate_similarity(&label, &existing).await;
        if let Some(reuse) = verdict.suggested_reuse {
            tracing::info!(
                label = %label,
                tag = %reuse.name,
                "Suggested label duplicates existing, reusing"
            );
            return Ok(Some(reuse));
        }

        // Names are unique across categories: an existing tag is reused even
        // when it was filed under another category.
        if let Some(tag) = self.tags.get_by_name(&label).await? {
            if tag.category != category {
                tracing::debug!(
                    subsystem = "similarity",
                    label = %label,
                    requested = %category,
                    existing = %tag.category,
                    "Label exists under another category, reusing"
                );
            }
            return Ok(Some(tag));
        }

        let created = self
            .tags
            .create(Tag::new(label, category, description))
            .await?;
        tracing::info!(tag = %created.name, "Created canonical label");
        Ok(Some(created))
    }
}

impl std::fmt::Debug for SimilarityIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityIndex")
            .field("embedding_model", &self.embedder.model_name())
            .field("config", &self.config)
            .finish()
    }
}
