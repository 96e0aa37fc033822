//! Five-step chain-of-thought extraction.
//!
//! Steps run strictly in order. Every prompt carries the rationale and
//! output of the steps before it. Steps one to four build context; step five
//! writes a single key finding in the rubric's synthesis schema. A failed
//! step is recorded at zero confidence and the chain moves on, except that a
//! failed synthesis step yields no insight at all.

use std::time::Instant;

use serde_json::{json, Value as JsonValue};

use scholia_core::{Insight, Paper, ReasoningBackend, Result};

use super::context::{ReasoningContext, REASONING_KEY};
use super::{finalize, prepare_text, METHOD_CHAIN};
use crate::confidence::ConfidenceStrategy;
use crate::rubric::{ExtractionRule, Rubric};

/// Steps in a full chain, including synthesis.
pub const STEP_COUNT: usize = 5;

const SYNTHESIS_STEP: &str = "executive_synthesis";

struct StepSpec {
    name: &'static str,
    heading: &'static str,
    task: &'static str,
    /// `(field, is_list)`; `reasoning` is added to every step.
    fields: &'static [(&'static str, bool)],
}

const CONTEXT_STEPS: [StepSpec; 4] = [
    StepSpec {
        name: "structural_analysis",
        heading: "Structural analysis",
        task: "Identify the research domain, the scope of the work, and the main topics it covers.",
        fields: &[("domain", false), ("scope", false), ("topics", true)],
    },
    StepSpec {
        name: "research_elements",
        heading: "Research elements",
        task: "Identify the problem statement, the hypotheses or research questions, \
               and the methodology used.",
        fields: &[
            ("problem_statement", false),
            ("hypotheses", true),
            ("methodology", false),
        ],
    },
    StepSpec {
        name: "contribution_synthesis",
        heading: "Contribution synthesis",
        task: "Identify the main contributions, the key findings, and any novel techniques.",
        fields: &[
            ("main_contributions", true),
            ("key_findings", true),
            ("novel_techniques", true),
        ],
    },
    StepSpec {
        name: "practical_implications",
        heading: "Practical implications",
        task: "Identify practical applications, the audiences who benefit, \
               and implementation considerations.",
        fields: &[
            ("applications", true),
            ("target_audiences", true),
            ("implementation_considerations", true),
        ],
    },
];

impl StepSpec {
    fn schema(&self) -> JsonValue {
        let mut schema = serde_json::Map::new();
        schema.insert(REASONING_KEY.to_string(), json!("string"));
        for (field, is_list) in self.fields {
            let shape = if *is_list { json!(["string"]) } else { json!("string") };
            schema.insert(field.to_string(), shape);
        }
        JsonValue::Object(schema)
    }

    fn scoring(&self) -> ConfidenceStrategy {
        ConfidenceStrategy::full_structure(self.fields.iter().map(|(f, _)| *f))
    }
}

fn step_header(index: usize, heading: &str) -> String {
    format!("Step {} of {}: {}", index + 1, STEP_COUNT, heading)
}

/// Result of a chain run: the insights (zero or one) and the full trace.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    pub insights: Vec<Insight>,
    pub context: ReasoningContext,
}

/// Runs the five-step chain against a reasoning backend.
pub struct ChainOfThought<'a> {
    backend: &'a dyn ReasoningBackend,
    content_max_chars: usize,
}

impl<'a> ChainOfThought<'a> {
    pub fn new(backend: &'a dyn ReasoningBackend, content_max_chars: usize) -> Self {
        Self {
            backend,
            content_max_chars,
        }
    }

    pub async fn run(&self, paper: &Paper, rubric: &Rubric) -> ChainOutcome {
        let start = Instant::now();
        let text = prepare_text(paper, self.content_max_chars);
        let mut context = ReasoningContext::new(paper.id);

        for (index, spec) in CONTEXT_STEPS.iter().enumerate() {
            let prompt = format!(
                "{}\n\nYou are analyzing a research paper step by step. Build on the \
                 previous steps.\n\nPrevious reasoning:\n{}\n\nTask: {}\n\n\
                 Explain your thinking in the \"{}\" field.",
                step_header(index, spec.heading),
                context.previous_reasoning(),
                spec.task,
                REASONING_KEY,
            );

            match self.backend.extract(&prompt, &text, &spec.schema()).await {
                Ok(output) => {
                    let confidence = spec.scoring().score(&output, &text);
                    tracing::trace!(
                        subsystem = "pipeline",
                        component = "chain",
                        paper_id = %paper.id,
                        step = spec.name,
                        confidence,
                        "Step recorded"
                    );
                    context.record(spec.name, output, confidence);
                }
                Err(e) => {
                    tracing::warn!(
                        subsystem = "pipeline",
                        component = "chain",
                        paper_id = %paper.id,
                        step = spec.name,
                        error = %e,
                        "Reasoning step failed, continuing at zero confidence"
                    );
                    context.record_failure(spec.name, &e);
                }
            }
        }

        let rule = rubric.synthesis_or_generic();
        let insights = match self.synthesize(paper, &rule, &text, &mut context).await {
            Ok(Some(insight)) => vec![insight],
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    subsystem = "pipeline",
                    component = "chain",
                    paper_id = %paper.id,
                    rubric_id = %rubric.id,
                    error = %e,
                    "Synthesis step failed, chain yields no insight"
                );
                Vec::new()
            }
        };

        tracing::info!(
            subsystem = "pipeline",
            component = "chain",
            paper_id = %paper.id,
            rubric_id = %rubric.id,
            confidence = context.final_confidence(),
            result_count = insights.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Chain-of-thought extraction complete"
        );

        ChainOutcome { insights, context }
    }

    async fn synthesize(
        &self,
        paper: &Paper,
        rule: &ExtractionRule,
        text: &str,
        context: &mut ReasoningContext,
    ) -> Result<Option<Insight>> {
        let elements = serde_json::to_string_pretty(context.elements())?;
        let prompt = format!(
            "{}\n\nYou have analyzed this paper in {} prior steps.\n\nPrevious reasoning:\n{}\n\n\
             Accumulated elements:\n{}\n\nTask: {}",
            step_header(STEP_COUNT - 1, "Executive synthesis"),
            context.steps().len(),
            context.previous_reasoning(),
            elements,
            rule.prompt,
        );

        let output = match self
            .backend
            .extract(&prompt, text, &rule.expected_schema)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                context.record_failure(SYNTHESIS_STEP, &e);
                return Err(e);
            }
        };

        let step_confidence = rule.confidence.score(&output, text);
        let mut record = output.clone();
        record.insert(
            REASONING_KEY.to_string(),
            json!(format!("Synthesized from {} prior steps", context.steps().len())),
        );
        context.record(SYNTHESIS_STEP, record, step_confidence);

        finalize(
            paper.id,
            rule,
            output,
            context.final_confidence(),
            METHOD_CHAIN,
        )
    }
}
