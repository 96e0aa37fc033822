//! Candidate label terms pulled from insight content.

use serde_json::Value as JsonValue;

use scholia_core::{normalize_term, Insight, InsightCategory, JsonMap, TagCategory};

/// Technical terms recognized in a key finding's main contribution.
const KEY_FINDING_TERMS: [(&str, &str); 5] = [
    ("transformer", "transformer"),
    ("attention", "attention-mechanism"),
    ("neural", "neural-networks"),
    ("benchmark", "benchmarking"),
    ("agent", "ai-agents"),
];

/// A normalized term awaiting canonicalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTerm {
    pub term: String,
    pub category: TagCategory,
    pub description: String,
}

impl CandidateTerm {
    fn new(raw: &str, category: TagCategory, description: String) -> Option<Self> {
        let term = normalize_term(raw);
        if term.is_empty() {
            return None;
        }
        Some(Self {
            term,
            category,
            description,
        })
    }
}

fn text<'a>(content: &'a JsonMap, field: &str) -> Option<&'a str> {
    content
        .get(field)
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn strings<'a>(content: &'a JsonMap, field: &str, limit: usize) -> Vec<&'a str> {
    content
        .get(field)
        .and_then(JsonValue::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(JsonValue::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .take(limit)
                .collect()
        })
        .unwrap_or_default()
}

/// `(key value, whole object)` for list-of-object fields like `metrics[].name`.
fn keyed<'a>(
    content: &'a JsonMap,
    field: &str,
    key: &str,
    limit: usize,
) -> Vec<(&'a str, &'a JsonMap)> {
    content
        .get(field)
        .and_then(JsonValue::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(JsonValue::as_object)
                .filter_map(|obj| {
                    obj.get(key)
                        .and_then(JsonValue::as_str)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(|v| (v, obj))
                })
                .take(limit)
                .collect()
        })
        .unwrap_or_default()
}

fn title_case(term: &str) -> String {
    term.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Candidate terms for one insight, by category.
pub fn candidate_terms(insight: &Insight) -> Vec<CandidateTerm> {
    let content = &insight.content;
    let mut terms = Vec::new();

    match insight.category {
        InsightCategory::Framework => {
            if let Some(name) = text(content, "name") {
                terms.extend(CandidateTerm::new(
                    name,
                    TagCategory::Concept,
                    format!("Framework: {}", name),
                ));
            }
            for component in strings(content, "components", 3) {
                terms.extend(CandidateTerm::new(
                    component,
                    TagCategory::Methodology,
                    format!("Component: {}", component),
                ));
            }
        }
        InsightCategory::Concept => {
            if let Some(domain) = text(content, "research_domain") {
                terms.extend(CandidateTerm::new(
                    domain,
                    TagCategory::ResearchDomain,
                    format!("Research domain: {}", domain),
                ));
            }
            for (concept, obj) in keyed(content, "key_concepts", "concept", 5) {
                let definition = obj
                    .get("definition")
                    .and_then(JsonValue::as_str)
                    .unwrap_or_default()
                    .to_string();
                terms.extend(CandidateTerm::new(concept, TagCategory::Concept, definition));
            }
        }
        InsightCategory::Application => {
            if let Some(domain) = text(content, "problem_domain") {
                terms.extend(CandidateTerm::new(
                    domain,
                    TagCategory::Application,
                    format!("Application domain: {}", domain),
                ));
            }
        }
        InsightCategory::KeyFinding => {
            if let Some(contribution) = text(content, "main_contribution") {
                let lowered = contribution.to_lowercase();
                for (needle, term) in KEY_FINDING_TERMS {
                    if lowered.contains(needle) {
                        terms.extend(CandidateTerm::new(
                            term,
                            TagCategory::Concept,
                            format!("Key concept: {}", title_case(term)),
                        ));
                    }
                }
            }
        }
        InsightCategory::Methodology => {
            let mut steps = keyed(content, "steps", "step", 2);
            if steps.is_empty() {
                steps = keyed(content, "methodology_steps", "step", 2);
            }
            for (step, _) in steps {
                terms.extend(CandidateTerm::new(
                    step,
                    TagCategory::Methodology,
                    format!("Methodology step: {}", step),
                ));
            }
        }
        InsightCategory::DataPoint => {
            for (metric, _) in keyed(content, "metrics", "name", 2) {
                terms.extend(CandidateTerm::new(
                    metric,
                    TagCategory::Concept,
                    format!("Performance metric: {}", metric),
                ));
            }
            for (benchmark, _) in keyed(content, "benchmarks", "name", 2) {
                terms.extend(CandidateTerm::new(
                    benchmark,
                    TagCategory::Application,
                    format!("Benchmark: {}", benchmark),
                ));
            }
        }
        InsightCategory::Limitation | InsightCategory::FutureWork => {}
    }

    tracing::trace!(
        subsystem = "pipeline",
        component = "tagging",
        category = %insight.category,
        result_count = terms.len(),
        "Candidate terms extracted"
    );
    terms
}
