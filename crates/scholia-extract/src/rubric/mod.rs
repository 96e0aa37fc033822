//! Rubrics: named, versioned bundles of extraction rules.
//!
//! The serialized layout is the human-editable YAML kept in the rubric
//! directory, one `<id>.yaml` per rubric.

pub mod catalog;
pub mod defaults;
pub mod store;

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use scholia_core::{defaults as consts, Error, InsightCategory, PaperType, Result};

use crate::confidence::ConfidenceStrategy;
use crate::validation::ValidationPredicate;

pub use catalog::RuleCatalog;
pub use store::{InMemoryRubricStore, RubricStore, YamlRubricStore};

/// Categories that stay worth extracting after a key finding exists.
pub const DEFAULT_INDEPENDENT_CATEGORIES: [InsightCategory; 2] =
    [InsightCategory::Methodology, InsightCategory::Framework];

fn default_minimum_confidence() -> f32 {
    consts::RULE_MIN_CONFIDENCE
}

/// One prompt/schema/scoring bundle targeting an insight category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRule {
    #[serde(rename = "insight_type")]
    pub category: InsightCategory,
    pub prompt: String,
    /// Field name to `"string"` or `[...]`.
    #[serde(rename = "expected_structure")]
    pub expected_schema: JsonValue,
    #[serde(rename = "confidence_calculation", default)]
    pub confidence: ConfidenceStrategy,
    #[serde(rename = "validation_rules", default)]
    pub predicates: Vec<ValidationPredicate>,
    #[serde(default = "default_minimum_confidence")]
    pub minimum_confidence: f32,
}

impl ExtractionRule {
    /// Short topic line for folding this rule into another prompt.
    pub fn topic(&self) -> String {
        self.prompt
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(|l| l.trim_end_matches('.').to_string())
            .unwrap_or_else(|| self.category.title_case())
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.minimum_confidence) {
            return Err(Error::Config(format!(
                "{} rule minimum_confidence must be within [0, 1], got {}",
                self.category, self.minimum_confidence
            )));
        }
        if !self.expected_schema.is_object() {
            return Err(Error::Config(format!(
                "{} rule expected_structure must be a mapping",
                self.category
            )));
        }
        if self.prompt.trim().is_empty() {
            return Err(Error::Config(format!(
                "{} rule prompt cannot be empty",
                self.category
            )));
        }
        Ok(())
    }
}

/// Review outcome implied by an insight's confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    AutoApprove,
    ManualReview,
    Pending,
    AutoReject,
}

/// Confidence cut-offs for review routing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub auto_approve: f32,
    pub manual_review: f32,
    pub auto_reject: f32,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            auto_approve: 0.8,
            manual_review: 0.6,
            auto_reject: 0.3,
        }
    }
}

impl QualityThresholds {
    pub fn classify(&self, confidence: f32) -> ReviewDecision {
        if confidence >= self.auto_approve {
            ReviewDecision::AutoApprove
        } else if confidence >= self.manual_review {
            ReviewDecision::ManualReview
        } else if confidence < self.auto_reject {
            ReviewDecision::AutoReject
        } else {
            ReviewDecision::Pending
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("auto_approve", self.auto_approve),
            ("manual_review", self.manual_review),
            ("auto_reject", self.auto_reject),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "quality threshold {} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.auto_reject > self.manual_review || self.manual_review > self.auto_approve {
            return Err(Error::Config(
                "quality thresholds must satisfy auto_reject <= manual_review <= auto_approve"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// A named, versioned bundle of extraction rules for some paper types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    pub id: String,
    pub name: String,
    pub version: String,
    pub paper_types: Vec<PaperType>,
    #[serde(default)]
    pub domains: Vec<String>,
    pub extraction_rules: Vec<ExtractionRule>,
    #[serde(default)]
    pub quality_thresholds: QualityThresholds,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    /// Categories still extracted once a key finding exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub independent_categories: Option<Vec<InsightCategory>>,
}

impl Rubric {
    /// Check the structural invariants a loaded rubric must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Config("rubric id cannot be empty".to_string()));
        }
        if self.extraction_rules.is_empty() {
            return Err(Error::Config(format!(
                "rubric {} has no extraction rules",
                self.id
            )));
        }
        for rule in &self.extraction_rules {
            rule.validate()
                .map_err(|e| Error::Config(format!("rubric {}: {}", self.id, e)))?;
        }
        let key_findings = self
            .extraction_rules
            .iter()
            .filter(|r| r.category == InsightCategory::KeyFinding)
            .count();
        if key_findings > 1 {
            return Err(Error::Config(format!(
                "rubric {} has {} key_finding rules, at most one allowed",
                self.id, key_findings
            )));
        }
        self.quality_thresholds
            .validate()
            .map_err(|e| Error::Config(format!("rubric {}: {}", self.id, e)))
    }

    pub fn applies_to(&self, paper_type: PaperType) -> bool {
        self.paper_types.contains(&paper_type)
    }

    /// The key-finding rule, if the rubric has one.
    pub fn synthesis_rule(&self) -> Option<&ExtractionRule> {
        self.synthesis_index().map(|i| &self.extraction_rules[i])
    }

    /// The synthesis rule, or the generic key-finding rule for rubrics
    /// that do not declare one.
    pub fn synthesis_or_generic(&self) -> Cow<'_, ExtractionRule> {
        match self.synthesis_rule() {
            Some(rule) => Cow::Borrowed(rule),
            None => Cow::Owned(defaults::generic_key_finding_rule()),
        }
    }

    /// Every rule other than the synthesis rule, in rubric order.
    pub fn supporting_rules(&self) -> impl Iterator<Item = &ExtractionRule> {
        let synthesis = self.synthesis_index();
        self.extraction_rules
            .iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != synthesis)
            .map(|(_, rule)| rule)
    }

    fn synthesis_index(&self) -> Option<usize> {
        self.extraction_rules
            .iter()
            .position(|r| r.category == InsightCategory::KeyFinding)
    }

    /// Whether `category` stays valuable alongside a key finding.
    pub fn is_independent(&self, category: InsightCategory) -> bool {
        match &self.independent_categories {
            Some(categories) => categories.contains(&category),
            None => DEFAULT_INDEPENDENT_CATEGORIES.contains(&category),
        }
    }

    /// Review routing for a confidence under this rubric's thresholds.
    pub fn review(&self, confidence: f32) -> ReviewDecision {
        self.quality_thresholds.classify(confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_bands() {
        let t = QualityThresholds {
            auto_approve: 0.8,
            manual_review: 0.6,
            auto_reject: 0.3,
        };
        assert_eq!(t.classify(0.8), ReviewDecision::AutoApprove);
        assert_eq!(t.classify(0.7), ReviewDecision::ManualReview);
        assert_eq!(t.classify(0.45), ReviewDecision::Pending);
        assert_eq!(t.classify(0.3), ReviewDecision::Pending);
        assert_eq!(t.classify(0.29), ReviewDecision::AutoReject);
    }

    #[test]
    fn test_thresholds_must_be_ordered() {
        let t = QualityThresholds {
            auto_approve: 0.5,
            manual_review: 0.6,
            auto_reject: 0.3,
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_synthesis_and_supporting_rules() {
        let rubric = defaults::framework_default();
        assert_eq!(
            rubric.synthesis_rule().map(|r| r.category),
            Some(InsightCategory::KeyFinding)
        );
        let supporting: Vec<_> = rubric.supporting_rules().map(|r| r.category).collect();
        assert_eq!(
            supporting,
            vec![InsightCategory::Framework, InsightCategory::Methodology]
        );
    }

    #[test]
    fn test_rubric_without_key_finding_uses_generic_rule() {
        let mut rubric = defaults::framework_default();
        rubric.extraction_rules.pop();
        assert!(rubric.validate().is_ok());
        assert!(rubric.synthesis_rule().is_none());

        let synthesis = rubric.synthesis_or_generic();
        assert_eq!(*synthesis, defaults::generic_key_finding_rule());
        assert_eq!(rubric.supporting_rules().count(), 2);
    }

    #[test]
    fn test_validate_rejects_second_key_finding_rule() {
        let mut rubric = defaults::survey_default();
        rubric
            .extraction_rules
            .push(defaults::generic_key_finding_rule());
        let err = rubric.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("2 key_finding rules"));
    }

    #[test]
    fn test_independent_categories_default_and_override() {
        let mut rubric = defaults::survey_default();
        assert!(rubric.is_independent(InsightCategory::Methodology));
        assert!(rubric.is_independent(InsightCategory::Framework));
        assert!(!rubric.is_independent(InsightCategory::Concept));

        rubric.independent_categories = Some(vec![InsightCategory::Concept]);
        assert!(rubric.is_independent(InsightCategory::Concept));
        assert!(!rubric.is_independent(InsightCategory::Framework));
    }

    #[test]
    fn test_rule_topic_is_first_prompt_line() {
        let rubric = defaults::framework_default();
        let rule = &rubric.extraction_rules[0];
        assert_eq!(
            rule.topic(),
            "Identify the main framework or methodology introduced in this paper"
        );
    }

    #[test]
    fn test_validate_rejects_out_of_range_minimum() {
        let mut rubric = defaults::empirical_default();
        rubric.extraction_rules[0].minimum_confidence = 1.5;
        let err = rubric.validate().unwrap_err();
        assert!(err.to_string().contains("minimum_confidence"));
    }

    #[test]
    fn test_yaml_round_trip_keeps_legacy_keys() {
        let rubric = defaults::case_study_default();
        let yaml = serde_yaml::to_string(&rubric).unwrap();
        assert!(yaml.contains("insight_type: application"));
        assert!(yaml.contains("expected_structure"));
        assert!(yaml.contains("method: application_completeness"));
        assert!(yaml.contains("- problem_domain must not be empty"));

        let parsed: Rubric = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, rubric);
    }
}
