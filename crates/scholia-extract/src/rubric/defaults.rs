//! Built-in rubrics written by [`RuleCatalog::bootstrap`](super::RuleCatalog::bootstrap).

use serde_json::{json, Value as JsonValue};

use scholia_core::{InsightCategory, PaperType};

use super::{ExtractionRule, QualityThresholds, Rubric};
use crate::confidence::ConfidenceStrategy;
use crate::validation::ValidationPredicate;

/// Ids of the built-in rubrics, in bootstrap order.
pub const DEFAULT_RUBRIC_IDS: [&str; 6] = [
    "framework_default",
    "survey_default",
    "empirical_default",
    "case_study_default",
    "benchmark_default",
    "tutorial_default",
];

/// All built-in rubrics.
pub fn all() -> Vec<Rubric> {
    vec![
        framework_default(),
        survey_default(),
        empirical_default(),
        case_study_default(),
        benchmark_default(),
        tutorial_default(),
    ]
}

/// Built-in rubric by id.
pub fn by_id(id: &str) -> Option<Rubric> {
    all().into_iter().find(|r| r.id == id)
}

/// The shared seven-field key-finding schema.
pub fn key_finding_schema() -> JsonValue {
    json!({
        "main_contribution": "string",
        "significance": "string",
        "practical_impact": "string",
        "surprising_insight": "string",
        "problem_solved": "string",
        "audience_hook": "string",
        "field_advancement": "string"
    })
}

/// Fields the key-finding rule scores and validates.
pub const KEY_FINDING_REQUIRED: [&str; 3] =
    ["main_contribution", "significance", "practical_impact"];

/// Key-finding rule used when a rubric carries none of its own.
pub fn generic_key_finding_rule() -> ExtractionRule {
    key_finding_rule(
        "\
Extract the key finding and main contribution of this paper for content generation.
Focus on what makes this work significant and attention-worthy:
- The central contribution and why it matters
- The problem it solves and for whom
- Surprising or counterintuitive insights
- Practical impact and how it advances the field

Write for an intelligent but non-expert audience. Make it compelling and clear.",
    )
}

fn key_finding_rule(prompt: &str) -> ExtractionRule {
    ExtractionRule {
        category: InsightCategory::KeyFinding,
        prompt: prompt.to_string(),
        expected_schema: key_finding_schema(),
        confidence: ConfidenceStrategy::content_completeness(KEY_FINDING_REQUIRED),
        predicates: KEY_FINDING_REQUIRED
            .iter()
            .map(|f| ValidationPredicate::not_empty(*f))
            .collect(),
        minimum_confidence: 0.6,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn thresholds(auto_approve: f32, manual_review: f32, auto_reject: f32) -> QualityThresholds {
    QualityThresholds {
        auto_approve,
        manual_review,
        auto_reject,
    }
}

fn rubric(
    id: &str,
    name: &str,
    paper_types: Vec<PaperType>,
    domains: &[&str],
    extraction_rules: Vec<ExtractionRule>,
    quality_thresholds: QualityThresholds,
    description: &str,
) -> Rubric {
    Rubric {
        id: id.to_string(),
        name: name.to_string(),
        version: "1.0".to_string(),
        paper_types,
        domains: strings(domains),
        extraction_rules,
        quality_thresholds,
        created_at: None,
        description: Some(description.to_string()),
        independent_categories: None,
    }
}

pub fn framework_default() -> Rubric {
    rubric(
        "framework_default",
        "Conceptual Framework Analysis",
        vec![PaperType::ConceptualFramework],
        &["machine-learning", "natural-language-processing", "computer-vision"],
        vec![
            ExtractionRule {
                category: InsightCategory::Framework,
                prompt: "\
Identify the main framework or methodology introduced in this paper.
Extract the following information:
- Framework name and core concept
- Key components and their relationships
- Novel innovations compared to existing approaches
- Technical architecture or design principles

Focus on the technical contribution and architectural details."
                    .to_string(),
                expected_schema: json!({
                    "name": "string",
                    "core_concept": "string",
                    "components": ["string"],
                    "innovations": ["string"],
                    "architecture": "string",
                    "comparison_to_existing": "string"
                }),
                confidence: ConfidenceStrategy::KeywordDensity {
                    required_keywords: strings(&[
                        "framework",
                        "architecture",
                        "component",
                        "design",
                    ]),
                    min_keyword_count: 3,
                },
                predicates: vec![
                    ValidationPredicate::not_empty("name"),
                    ValidationPredicate::min_items("components", 2),
                    ValidationPredicate::min_items("innovations", 1),
                ],
                minimum_confidence: 0.6,
            },
            ExtractionRule {
                category: InsightCategory::Methodology,
                prompt: "\
Describe the step-by-step methodology or process outlined in this framework.
Extract:
- Implementation steps or workflow
- Input requirements and data formats
- Output specifications
- Validation or evaluation approach

Focus on actionable implementation details."
                    .to_string(),
                expected_schema: json!({
                    "steps": [{"step": "string", "description": "string"}],
                    "inputs": ["string"],
                    "outputs": ["string"],
                    "validation_approach": "string"
                }),
                confidence: ConfidenceStrategy::StructureCompleteness {
                    required_fields: Some(strings(&["steps", "inputs", "outputs"])),
                    min_completeness: 0.7,
                },
                predicates: vec![
                    ValidationPredicate::min_items("steps", 3),
                    ValidationPredicate::not_empty("inputs"),
                    ValidationPredicate::not_empty("outputs"),
                ],
                minimum_confidence: 0.5,
            },
            key_finding_rule(
                "\
Extract the key finding and main contribution of this framework paper for content generation.
Focus on what makes this significant and attention-worthy:
- The breakthrough or innovation that changes how we think
- Why this matters to practitioners and researchers
- The \"aha moment\" or surprising insight
- Practical impact and real-world implications
- What problem this solves that people care about

Write for an intelligent but non-expert audience. Make it compelling and clear.",
            ),
        ],
        thresholds(0.8, 0.6, 0.3),
        "Extracts framework components, innovations, and implementation methodology",
    )
}

pub fn survey_default() -> Rubric {
    rubric(
        "survey_default",
        "Survey Paper Analysis",
        vec![PaperType::SurveyReview, PaperType::PositionPaper],
        &["general"],
        vec![
            ExtractionRule {
                category: InsightCategory::Concept,
                prompt: "\
Identify the key concepts, trends, and research areas covered in this survey.
Extract:
- Main research domain and scope
- Key concepts and terminology definitions
- Major research trends identified
- Gaps in current research
- Future research directions

Focus on the comprehensive coverage and synthesis of the field."
                    .to_string(),
                expected_schema: json!({
                    "research_domain": "string",
                    "scope": "string",
                    "key_concepts": [{"concept": "string", "definition": "string"}],
                    "research_trends": ["string"],
                    "research_gaps": ["string"],
                    "future_directions": ["string"]
                }),
                confidence: ConfidenceStrategy::CoverageAnalysis {
                    required_elements: strings(&[
                        "research_domain",
                        "key_concepts",
                        "research_trends",
                    ]),
                    min_coverage: 0.8,
                },
                predicates: vec![
                    ValidationPredicate::not_empty("research_domain"),
                    ValidationPredicate::min_items("key_concepts", 2),
                    ValidationPredicate::min_items("research_trends", 1),
                ],
                minimum_confidence: 0.7,
            },
            key_finding_rule(
                "\
Extract the key finding and main insights from this survey paper for content generation.
Focus on what makes this survey valuable and attention-worthy:
- The most important synthesis or meta-insight across the field
- Surprising patterns or trends discovered in the literature
- Critical gaps that practitioners should know about
- The \"state of the field\" summary that matters most
- Future opportunities that excite researchers and practitioners

Write for an intelligent audience who wants to understand the field landscape.",
            ),
        ],
        thresholds(0.85, 0.65, 0.4),
        "Extracts comprehensive coverage analysis and research synthesis",
    )
}

pub fn empirical_default() -> Rubric {
    rubric(
        "empirical_default",
        "Empirical Study Analysis",
        vec![PaperType::EmpiricalStudy, PaperType::BenchmarkComparison],
        &["general"],
        vec![
            ExtractionRule {
                category: InsightCategory::DataPoint,
                prompt: "\
Extract quantitative results, performance metrics, and statistical findings.
Extract:
- Performance metrics and their values
- Experimental results and comparisons
- Statistical significance indicators
- Dataset information and sizes
- Baseline comparisons

Focus on concrete, measurable outcomes and data points."
                    .to_string(),
                expected_schema: json!({
                    "metrics": [{"name": "string", "value": "string", "unit": "string"}],
                    "results": [{"experiment": "string", "outcome": "string"}],
                    "statistical_significance": "string",
                    "datasets": [{"name": "string", "size": "string", "description": "string"}],
                    "baseline_comparisons": [{"baseline": "string", "improvement": "string"}]
                }),
                confidence: ConfidenceStrategy::DataDensity {
                    required_metrics: 3,
                    required_results: 2,
                },
                predicates: vec![
                    ValidationPredicate::min_items("metrics", 1),
                    ValidationPredicate::min_items("results", 1),
                ],
                minimum_confidence: 0.6,
            },
            key_finding_rule(
                "\
Extract the key finding and main results from this empirical study for content generation.
Focus on what makes this research significant and attention-worthy:
- The most important experimental result or discovery
- What this proves or disproves that matters to the field
- Surprising or counterintuitive findings
- Practical implications for practitioners
- How this changes what we thought we knew

Write for an audience interested in evidence-based insights and practical applications.",
            ),
        ],
        thresholds(0.8, 0.6, 0.3),
        "Extracts experimental results, metrics, and statistical findings",
    )
}

pub fn case_study_default() -> Rubric {
    rubric(
        "case_study_default",
        "Case Study Analysis",
        vec![PaperType::CaseStudy],
        &["general"],
        vec![
            ExtractionRule {
                category: InsightCategory::Application,
                prompt: "\
Identify the specific application or use case being demonstrated.
Extract:
- Problem domain and specific challenge addressed
- Solution approach and implementation details
- Real-world deployment context
- Practical outcomes and lessons learned
- Scalability and generalizability insights

Focus on practical implementation and real-world applicability."
                    .to_string(),
                expected_schema: json!({
                    "problem_domain": "string",
                    "specific_challenge": "string",
                    "solution_approach": "string",
                    "implementation_details": ["string"],
                    "deployment_context": "string",
                    "outcomes": ["string"],
                    "lessons_learned": ["string"],
                    "scalability_insights": "string"
                }),
                confidence: ConfidenceStrategy::ApplicationCompleteness {
                    required_fields: strings(&["problem_domain", "solution_approach", "outcomes"]),
                    min_completeness: 0.75,
                },
                predicates: vec![
                    ValidationPredicate::not_empty("problem_domain"),
                    ValidationPredicate::not_empty("solution_approach"),
                    ValidationPredicate::min_items("outcomes", 2),
                ],
                minimum_confidence: 0.6,
            },
            key_finding_rule(
                "\
Extract the key finding and main lessons from this case study for content generation.
Focus on what makes this case study valuable and attention-worthy:
- The most important lesson learned from this real-world application
- What worked (or didn't work) that others should know about
- Surprising challenges or unexpected successes
- Practical insights that practitioners can apply immediately
- How this changes best practices or conventional wisdom

Write for practitioners who want actionable insights from real-world implementations.",
            ),
        ],
        thresholds(0.8, 0.6, 0.3),
        "Extracts practical applications, implementations, and real-world outcomes",
    )
}

pub fn benchmark_default() -> Rubric {
    rubric(
        "benchmark_default",
        "Benchmark Comparison Analysis",
        vec![PaperType::BenchmarkComparison],
        &["general"],
        vec![
            ExtractionRule {
                category: InsightCategory::DataPoint,
                prompt: "\
Extract benchmark results, performance comparisons, and evaluation metrics.
Extract:
- Benchmark datasets and their characteristics
- Performance metrics and comparative results
- Baseline methods and their performance
- Statistical analysis and significance testing
- Key findings from the comparison

Focus on quantitative comparisons and performance analysis."
                    .to_string(),
                expected_schema: json!({
                    "benchmarks": [{"name": "string", "description": "string", "size": "string"}],
                    "metrics": [{"name": "string", "value": "string", "unit": "string"}],
                    "baselines": [{"method": "string", "performance": "string"}],
                    "comparisons": [
                        {"method_a": "string", "method_b": "string", "result": "string"}
                    ],
                    "statistical_analysis": "string",
                    "key_findings": ["string"]
                }),
                confidence: ConfidenceStrategy::BenchmarkCompleteness {
                    required_fields: strings(&["benchmarks", "metrics", "comparisons"]),
                    min_completeness: 0.6,
                },
                predicates: vec![
                    ValidationPredicate::min_items("benchmarks", 1),
                    ValidationPredicate::min_items("metrics", 1),
                    ValidationPredicate::min_items("comparisons", 1),
                ],
                minimum_confidence: 0.5,
            },
            key_finding_rule(
                "\
Extract the key finding and main insights from this benchmark comparison for content generation.
Focus on what makes this comparison significant and attention-worthy:
- The most important performance insight or ranking result
- Which method won and why it matters
- Surprising performance differences or unexpected results
- Practical implications for choosing between methods
- What this settles or reveals about the state of the field

Write for practitioners who need to make informed decisions about methods and tools.",
            ),
        ],
        thresholds(0.75, 0.5, 0.3),
        "Extracts benchmark results, performance comparisons, and evaluation metrics",
    )
}

pub fn tutorial_default() -> Rubric {
    rubric(
        "tutorial_default",
        "Tutorial Methodology Analysis",
        vec![PaperType::TutorialMethodology],
        &["general"],
        vec![
            ExtractionRule {
                category: InsightCategory::Methodology,
                prompt: "\
Extract the tutorial content, step-by-step methodology, and learning objectives.
Extract:
- Learning objectives and target audience
- Step-by-step methodology or tutorial steps
- Prerequisites and required knowledge
- Practical examples and use cases
- Tools and resources mentioned
- Expected outcomes and skills gained

Focus on educational content and practical implementation guidance."
                    .to_string(),
                expected_schema: json!({
                    "learning_objectives": ["string"],
                    "target_audience": "string",
                    "methodology_steps": [
                        {"step": "string", "description": "string", "example": "string"}
                    ],
                    "prerequisites": ["string"],
                    "tools_resources": ["string"],
                    "use_cases": ["string"],
                    "expected_outcomes": ["string"]
                }),
                confidence: ConfidenceStrategy::TutorialCompleteness {
                    required_fields: strings(&[
                        "learning_objectives",
                        "methodology_steps",
                        "expected_outcomes",
                    ]),
                    min_completeness: 0.7,
                },
                predicates: vec![
                    ValidationPredicate::min_items("learning_objectives", 1),
                    ValidationPredicate::min_items("methodology_steps", 2),
                    ValidationPredicate::min_items("expected_outcomes", 1),
                ],
                minimum_confidence: 0.6,
            },
            key_finding_rule(
                "\
Extract the key finding and main value from this tutorial/methodology paper for content generation.
Focus on what makes this tutorial significant and attention-worthy:
- The most important skill or capability this teaches
- Why this approach is better than existing methods
- What practical problem this solves for practitioners
- The \"aha moment\" or key insight that makes this valuable
- How this empowers people to do something they couldn't before

Write for learners and practitioners who want to improve their skills and capabilities.",
            ),
        ],
        thresholds(0.8, 0.6, 0.4),
        "Extracts tutorial methodology, learning objectives, and practical guidance",
    )
}
