//! Accumulated state of a reasoning chain.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scholia_core::{defaults, JsonMap};

use crate::confidence::clamp_unit;

/// Key under which a step returns its free-text rationale.
pub const REASONING_KEY: &str = "reasoning";

/// One recorded step of the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub name: String,
    pub rationale: String,
    pub output: JsonMap,
    pub confidence: f32,
}

/// Ordered steps plus the merged elements they have produced so far.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReasoningContext {
    pub paper_id: Uuid,
    steps: Vec<ReasoningStep>,
    elements: JsonMap,
}

impl ReasoningContext {
    pub fn new(paper_id: Uuid) -> Self {
        Self {
            paper_id,
            steps: Vec::new(),
            elements: JsonMap::new(),
        }
    }

    /// Record a completed step. Its non-rationale fields join the elements.
    pub fn record(&mut self, name: impl Into<String>, output: JsonMap, confidence: f32) {
        let rationale = output
            .get(REASONING_KEY)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        for (key, value) in &output {
            if key != REASONING_KEY {
                self.elements.insert(key.clone(), value.clone());
            }
        }

        self.steps.push(ReasoningStep {
            name: name.into(),
            rationale,
            output,
            confidence: clamp_unit(confidence),
        });
    }

    /// Record a failed step at zero confidence with the error as rationale.
    pub fn record_failure(&mut self, name: impl Into<String>, error: impl std::fmt::Display) {
        self.steps.push(ReasoningStep {
            name: name.into(),
            rationale: format!("Step failed: {}", error),
            output: JsonMap::new(),
            confidence: 0.0,
        });
    }

    pub fn steps(&self) -> &[ReasoningStep] {
        &self.steps
    }

    pub fn elements(&self) -> &JsonMap {
        &self.elements
    }

    pub fn mean_confidence(&self) -> f32 {
        if self.steps.is_empty() {
            return 0.0;
        }
        let total: f32 = self.steps.iter().map(|s| s.confidence).sum();
        total / self.steps.len() as f32
    }

    /// `min(1, mean × 1.1)` over every recorded step.
    pub fn final_confidence(&self) -> f32 {
        clamp_unit(self.mean_confidence() * defaults::CHAIN_CONFIDENCE_BONUS)
    }

    /// Prior steps rendered for inclusion in the next prompt.
    pub fn previous_reasoning(&self) -> String {
        if self.steps.is_empty() {
            return "No prior steps.".to_string();
        }
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let output = serde_json::to_string_pretty(&step.output)
                    .unwrap_or_else(|_| "{}".to_string());
                format!(
                    "Step {} ({}):\nReasoning: {}\nOutput: {}",
                    i + 1,
                    step.name,
                    step.rationale,
                    output
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output(value: serde_json::Value) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_record_merges_elements_without_reasoning() {
        let mut ctx = ReasoningContext::new(Uuid::now_v7());
        ctx.record(
            "structural_analysis",
            output(json!({"reasoning": "Looked at sections", "domain": "NLP"})),
            0.9,
        );
        assert_eq!(ctx.steps()[0].rationale, "Looked at sections");
        assert_eq!(ctx.elements().get("domain"), Some(&json!("NLP")));
        assert!(ctx.elements().get("reasoning").is_none());
    }

    #[test]
    fn test_final_confidence_law() {
        let mut ctx = ReasoningContext::new(Uuid::now_v7());
        for name in ["a", "b", "c", "d"] {
            ctx.record(name, JsonMap::new(), 0.8);
        }
        ctx.record_failure("e", "timeout");
        assert!((ctx.mean_confidence() - 0.64).abs() < 1e-6);
        assert!((ctx.final_confidence() - 0.704).abs() < 1e-5);
    }

    #[test]
    fn test_final_confidence_is_capped() {
        let mut ctx = ReasoningContext::new(Uuid::now_v7());
        ctx.record("a", JsonMap::new(), 1.0);
        assert_eq!(ctx.final_confidence(), 1.0);
    }

    #[test]
    fn test_previous_reasoning_includes_failures() {
        let mut ctx = ReasoningContext::new(Uuid::now_v7());
        assert_eq!(ctx.previous_reasoning(), "No prior steps.");
        ctx.record_failure("research_elements", "bad json");
        let rendered = ctx.previous_reasoning();
        assert!(rendered.starts_with("Step 1 (research_elements):"));
        assert!(rendered.contains("Step failed: bad json"));
    }
}
