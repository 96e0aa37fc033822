//! Turning a paper and a rubric into scored insights.
//!
//! Two strategies share the scoring tail in [`finalize`]:
//!
//! - [`chain`]: a five-step reasoning chain ending in one key finding.
//! - [`legacy`]: one extraction call per rubric rule.

pub mod chain;
pub mod context;
pub mod legacy;

use serde_json::Value as JsonValue;
use uuid::Uuid;

use scholia_core::{Insight, InsightCategory, JsonMap, Paper, Result};

use crate::rubric::ExtractionRule;
use crate::validation::{apply_penalty, validate};

pub use chain::{ChainOutcome, ChainOfThought, STEP_COUNT};
pub use context::{ReasoningContext, ReasoningStep};
pub use legacy::{would_add_unique_value, LegacyExtractor};

/// Method label recorded on chain-of-thought insights.
pub const METHOD_CHAIN: &str = "chain_of_thought";

/// Method label for the legacy synthesis rule.
pub const METHOD_KEY_FINDING_ENHANCED: &str = "rubric_key_finding_enhanced";

/// Method label for a legacy rule of `category`.
pub fn rule_method(category: InsightCategory) -> String {
    format!("rubric_{}", category)
}

/// Build the reasoning input for a paper.
///
/// Parts are joined by a blank line; absent or empty parts are left out and
/// full text is cut to `max_chars` characters.
pub fn prepare_text(paper: &Paper, max_chars: usize) -> String {
    let mut parts = Vec::with_capacity(4);

    if !paper.title.trim().is_empty() {
        parts.push(format!("Title: {}", paper.title));
    }
    if let Some(abstract_text) = paper.abstract_text.as_deref().filter(|t| !t.trim().is_empty()) {
        parts.push(format!("Abstract: {}", abstract_text));
    }
    if !paper.categories.is_empty() {
        parts.push(format!("Categories: {}", paper.categories.join(", ")));
    }
    if let Some(full_text) = paper.full_text.as_deref().filter(|t| !t.trim().is_empty()) {
        let content: String = full_text.chars().take(max_chars).collect();
        parts.push(format!("Content: {}", content));
    }

    parts.join("\n\n")
}

fn text_field<'a>(content: &'a JsonMap, field: &str) -> Option<&'a str> {
    content
        .get(field)
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn list_len(content: &JsonMap, field: &str) -> usize {
    content
        .get(field)
        .and_then(JsonValue::as_array)
        .map(Vec::len)
        .unwrap_or(0)
}

/// Display title for an insight.
pub fn insight_title(category: InsightCategory, content: &JsonMap) -> String {
    match category {
        InsightCategory::Framework => {
            format!("Framework: {}", text_field(content, "name").unwrap_or("Framework"))
        }
        InsightCategory::Methodology => "Implementation Methodology".to_string(),
        InsightCategory::Concept => format!(
            "Key Concepts in {}",
            text_field(content, "research_domain").unwrap_or("Research")
        ),
        InsightCategory::DataPoint => {
            format!("Experimental Results ({} metrics)", list_len(content, "metrics"))
        }
        InsightCategory::Application => format!(
            "Application: {}",
            text_field(content, "problem_domain").unwrap_or("Application")
        ),
        other => format!("{} Insight", other.title_case()),
    }
}

/// One-line description for an insight.
pub fn insight_description(category: InsightCategory, content: &JsonMap) -> String {
    match category {
        InsightCategory::Framework => format!(
            "Framework analysis: {}",
            text_field(content, "core_concept").unwrap_or_default()
        ),
        InsightCategory::Methodology => {
            let steps = list_len(content, "steps").max(list_len(content, "methodology_steps"));
            format!("Implementation methodology with {} steps", steps)
        }
        InsightCategory::Concept => format!(
            "Comprehensive analysis covering {} key concepts",
            list_len(content, "key_concepts")
        ),
        InsightCategory::DataPoint => {
            "Quantitative results and performance metrics from experiments".to_string()
        }
        InsightCategory::Application => format!(
            "Real-world application addressing: {}",
            text_field(content, "specific_challenge").unwrap_or_default()
        ),
        InsightCategory::KeyFinding => match text_field(content, "main_contribution") {
            Some(contribution) => contribution.to_string(),
            None => "Structured key finding extracted from paper".to_string(),
        },
        other => format!(
            "Structured {} extracted from paper",
            other.as_str().replace('_', " ")
        ),
    }
}

/// Validate, penalize, and threshold a scored extraction.
///
/// Returns `Ok(None)` when the final confidence falls below the rule minimum.
pub fn finalize(
    paper_id: Uuid,
    rule: &ExtractionRule,
    content: JsonMap,
    raw_confidence: f32,
    method: &str,
) -> Result<Option<Insight>> {
    let violations = validate(&content, &rule.predicates);
    let confidence = apply_penalty(raw_confidence, &violations);

    if !violations.is_empty() {
        tracing::debug!(
            subsystem = "pipeline",
            paper_id = %paper_id,
            category = %rule.category,
            violations = ?violations,
            confidence,
            "Validation penalty applied"
        );
    }

    if confidence < rule.minimum_confidence {
        tracing::debug!(
            subsystem = "pipeline",
            paper_id = %paper_id,
            category = %rule.category,
            confidence,
            minimum = rule.minimum_confidence,
            "Insight below rule minimum, discarded"
        );
        return Ok(None);
    }

    let title = insight_title(rule.category, &content);
    let description = insight_description(rule.category, &content);
    Insight::new(
        paper_id,
        rule.category,
        title,
        description,
        content,
        confidence,
        method,
    )
    .map(Some)
}
