//! Single-shot extraction: one backend call per rubric rule.

use std::time::Instant;

use futures::future::join_all;

use scholia_core::{Insight, InsightCategory, Paper, ReasoningBackend, Result};

use super::{finalize, prepare_text, rule_method, METHOD_KEY_FINDING_ENHANCED};
use crate::rubric::{ExtractionRule, Rubric};

/// Whether a supporting rule is still worth a call.
///
/// Without a key finding every rule is. With one, only the rubric's
/// independent categories are.
pub fn would_add_unique_value(
    category: InsightCategory,
    key_finding_present: bool,
    rubric: &Rubric,
) -> bool {
    !key_finding_present || rubric.is_independent(category)
}

/// Synthesis prompt widened with the supporting rules' topics.
pub fn enhanced_prompt(rubric: &Rubric, synthesis: &ExtractionRule) -> String {
    let topics: Vec<String> = rubric
        .supporting_rules()
        .map(|rule| format!("- {}", rule.topic()))
        .collect();
    if topics.is_empty() {
        return synthesis.prompt.clone();
    }
    format!(
        "{}\n\nWhere relevant, also draw on these aspects of the paper:\n{}",
        synthesis.prompt,
        topics.join("\n")
    )
}

pub struct LegacyExtractor<'a> {
    backend: &'a dyn ReasoningBackend,
    content_max_chars: usize,
    parallel: bool,
}

impl<'a> LegacyExtractor<'a> {
    pub fn new(backend: &'a dyn ReasoningBackend, content_max_chars: usize) -> Self {
        Self {
            backend,
            content_max_chars,
            parallel: false,
        }
    }

    /// Run supporting rules concurrently. Results keep rubric order.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Synthesis rule first, then the supporting rules that still add value.
    ///
    /// A rubric without a key-finding rule is synthesized with the generic one.
    pub async fn run(&self, paper: &Paper, rubric: &Rubric) -> Vec<Insight> {
        let start = Instant::now();
        let text = prepare_text(paper, self.content_max_chars);
        let mut insights = Vec::new();

        let synthesis = rubric.synthesis_or_generic();
        let prompt = enhanced_prompt(rubric, &synthesis);
        if let Some(insight) = self
            .attempt(paper, &synthesis, &prompt, METHOD_KEY_FINDING_ENHANCED, &text)
            .await
        {
            insights.push(insight);
        }

        let key_finding_present = !insights.is_empty();
        insights.extend(
            self.supporting_with_text(paper, rubric, key_finding_present, &text)
                .await,
        );

        tracing::info!(
            subsystem = "pipeline",
            component = "legacy",
            paper_id = %paper.id,
            rubric_id = %rubric.id,
            result_count = insights.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Single-shot extraction complete"
        );
        insights
    }

    /// Supporting rules that pass [`would_add_unique_value`], in rubric order.
    pub async fn supporting(
        &self,
        paper: &Paper,
        rubric: &Rubric,
        key_finding_present: bool,
    ) -> Vec<Insight> {
        let text = prepare_text(paper, self.content_max_chars);
        self.supporting_with_text(paper, rubric, key_finding_present, &text)
            .await
    }

    async fn supporting_with_text(
        &self,
        paper: &Paper,
        rubric: &Rubric,
        key_finding_present: bool,
        text: &str,
    ) -> Vec<Insight> {
        let rules: Vec<&ExtractionRule> = rubric
            .supporting_rules()
            .filter(|rule| {
                let keep = would_add_unique_value(rule.category, key_finding_present, rubric);
                if !keep {
                    tracing::debug!(
                        subsystem = "pipeline",
                        component = "legacy",
                        paper_id = %paper.id,
                        category = %rule.category,
                        "Skipping rule redundant with key finding"
                    );
                }
                keep
            })
            .collect();

        let methods: Vec<String> = rules.iter().map(|r| rule_method(r.category)).collect();

        if self.parallel {
            let calls = rules
                .iter()
                .zip(&methods)
                .map(|(rule, method)| self.attempt(paper, rule, &rule.prompt, method, text));
            join_all(calls).await.into_iter().flatten().collect()
        } else {
            let mut insights = Vec::new();
            for (rule, method) in rules.iter().zip(&methods) {
                if let Some(insight) = self.attempt(paper, rule, &rule.prompt, method, text).await {
                    insights.push(insight);
                }
            }
            insights
        }
    }

    /// One rule, with failures logged and dropped.
    async fn attempt(
        &self,
        paper: &Paper,
        rule: &ExtractionRule,
        prompt: &str,
        method: &str,
        text: &str,
    ) -> Option<Insight> {
        match self.extract_rule(paper, rule, prompt, method, text).await {
            Ok(insight) => insight,
            Err(e) => {
                tracing::warn!(
                    subsystem = "pipeline",
                    component = "legacy",
                    paper_id = %paper.id,
                    category = %rule.category,
                    error = %e,
                    "Rule extraction failed, insight omitted"
                );
                None
            }
        }
    }

    /// Extract, score, and threshold one rule.
    pub async fn extract_rule(
        &self,
        paper: &Paper,
        rule: &ExtractionRule,
        prompt: &str,
        method: &str,
        text: &str,
    ) -> Result<Option<Insight>> {
        let content = self
            .backend
            .extract(prompt, text, &rule.expected_schema)
            .await?;
        let confidence = rule.confidence.score(&content, text);
        tracing::trace!(
            subsystem = "pipeline",
            component = "legacy",
            paper_id = %paper.id,
            category = %rule.category,
            method = rule.confidence.method(),
            confidence,
            "Rule scored"
        );
        finalize(paper.id, rule, content, confidence, method)
    }
}
