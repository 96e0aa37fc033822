//! Confidence scoring strategies for extracted content.
//!
//! A rule names its strategy with a `method` key; parameters sit beside it:
//!
//! ```yaml
//! confidence_calculation:
//!   method: structure_completeness
//!   required_fields: [steps, inputs, outputs]
//!   min_completeness: 0.7
//! ```
//!
//! Unknown methods fail deserialization, so a rubric with a typo never loads.
//! Every score is clamped to `[0, 1]`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use scholia_core::{defaults, JsonMap};

fn structure_target() -> f32 {
    defaults::STRUCTURE_TARGET
}
fn coverage_target() -> f32 {
    defaults::COVERAGE_TARGET
}
fn application_target() -> f32 {
    defaults::APPLICATION_TARGET
}
fn benchmark_target() -> f32 {
    defaults::BENCHMARK_TARGET
}
fn tutorial_target() -> f32 {
    defaults::TUTORIAL_TARGET
}
fn content_target() -> f32 {
    defaults::CONTENT_TARGET
}
fn one() -> usize {
    1
}

/// How a rule's extracted content is scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ConfidenceStrategy {
    /// Fraction of required fields filled, divided by the target.
    ///
    /// Without `required_fields`, every key of the content is required.
    StructureCompleteness {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        required_fields: Option<Vec<String>>,
        #[serde(default = "structure_target")]
        min_completeness: f32,
    },
    /// Mean of keyword hit ratio in the source text and filled-value ratio.
    KeywordDensity {
        #[serde(default)]
        required_keywords: Vec<String>,
        /// Not used in scoring.
        #[serde(default = "one")]
        min_keyword_count: usize,
    },
    /// Fraction of required elements present, divided by the target.
    CoverageAnalysis {
        #[serde(default)]
        required_elements: Vec<String>,
        #[serde(default = "coverage_target")]
        min_coverage: f32,
    },
    ApplicationCompleteness {
        #[serde(default)]
        required_fields: Vec<String>,
        #[serde(default = "application_target")]
        min_completeness: f32,
    },
    BenchmarkCompleteness {
        #[serde(default)]
        required_fields: Vec<String>,
        #[serde(default = "benchmark_target")]
        min_completeness: f32,
    },
    TutorialCompleteness {
        #[serde(default)]
        required_fields: Vec<String>,
        #[serde(default = "tutorial_target")]
        min_completeness: f32,
    },
    ContentCompleteness {
        #[serde(default)]
        required_fields: Vec<String>,
        #[serde(default = "content_target")]
        min_completeness: f32,
    },
    /// Mean of metric and result counts against their required minimums.
    DataDensity {
        #[serde(default = "one")]
        required_metrics: usize,
        #[serde(default = "one")]
        required_results: usize,
    },
}

impl Default for ConfidenceStrategy {
    fn default() -> Self {
        Self::StructureCompleteness {
            required_fields: None,
            min_completeness: defaults::STRUCTURE_TARGET,
        }
    }
}

impl ConfidenceStrategy {
    /// Content-completeness over `fields` at the default target.
    pub fn content_completeness<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ContentCompleteness {
            required_fields: fields.into_iter().map(Into::into).collect(),
            min_completeness: defaults::CONTENT_TARGET,
        }
    }

    /// Strict completeness: every listed field must be filled for a score of 1.
    pub fn full_structure<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::StructureCompleteness {
            required_fields: Some(fields.into_iter().map(Into::into).collect()),
            min_completeness: 1.0,
        }
    }

    /// The `method` identifier this strategy serializes under.
    pub fn method(&self) -> &'static str {
        match self {
            Self::StructureCompleteness { .. } => "structure_completeness",
            Self::KeywordDensity { .. } => "keyword_density",
            Self::CoverageAnalysis { .. } => "coverage_analysis",
            Self::ApplicationCompleteness { .. } => "application_completeness",
            Self::BenchmarkCompleteness { .. } => "benchmark_completeness",
            Self::TutorialCompleteness { .. } => "tutorial_completeness",
            Self::ContentCompleteness { .. } => "content_completeness",
            Self::DataDensity { .. } => "data_density",
        }
    }

    /// Score `content` extracted from `source_text`, in `[0, 1]`.
    pub fn score(&self, content: &JsonMap, source_text: &str) -> f32 {
        let raw = match self {
            Self::StructureCompleteness {
                required_fields,
                min_completeness,
            } => match required_fields {
                Some(fields) => completeness(content, fields, *min_completeness),
                None => {
                    let keys: Vec<String> = content.keys().cloned().collect();
                    completeness(content, &keys, *min_completeness)
                }
            },
            Self::KeywordDensity {
                required_keywords, ..
            } => keyword_density(content, required_keywords, source_text),
            Self::CoverageAnalysis {
                required_elements,
                min_coverage,
            } => coverage(content, required_elements, *min_coverage),
            Self::ApplicationCompleteness {
                required_fields,
                min_completeness,
            }
            | Self::BenchmarkCompleteness {
                required_fields,
                min_completeness,
            }
            | Self::TutorialCompleteness {
                required_fields,
                min_completeness,
            }
            | Self::ContentCompleteness {
                required_fields,
                min_completeness,
            } => completeness(content, required_fields, *min_completeness),
            Self::DataDensity {
                required_metrics,
                required_results,
            } => data_density(content, *required_metrics, *required_results),
        };

        clamp_unit(raw)
    }
}

/// Clamp into `[0, 1]`; NaN scores as 0.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Whether a value counts as present: non-null, non-false, non-zero, non-empty.
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(map) => !map.is_empty(),
    }
}

/// Like [`is_truthy`], but whitespace-only strings count as empty.
fn is_filled(value: &JsonValue) -> bool {
    match value {
        JsonValue::String(s) => !s.trim().is_empty(),
        other => is_truthy(other),
    }
}

fn ratio_against_target(ratio: f32, target: f32) -> f32 {
    if target <= 0.0 {
        ratio
    } else {
        (ratio / target).min(1.0)
    }
}

fn completeness(content: &JsonMap, fields: &[String], target: f32) -> f32 {
    if fields.is_empty() {
        return 0.0;
    }
    let filled = fields
        .iter()
        .filter(|f| content.get(f.as_str()).map(is_filled).unwrap_or(false))
        .count();
    ratio_against_target(filled as f32 / fields.len() as f32, target)
}

fn coverage(content: &JsonMap, elements: &[String], target: f32) -> f32 {
    if elements.is_empty() {
        return 0.0;
    }
    let covered = elements
        .iter()
        .filter(|e| content.get(e.as_str()).map(is_truthy).unwrap_or(false))
        .count();
    ratio_against_target(covered as f32 / elements.len() as f32, target)
}

fn keyword_density(content: &JsonMap, keywords: &[String], source_text: &str) -> f32 {
    let source = source_text.to_lowercase();
    let keyword_ratio = if keywords.is_empty() {
        0.0
    } else {
        let hits = keywords
            .iter()
            .filter(|k| source.contains(&k.to_lowercase()))
            .count();
        hits as f32 / keywords.len() as f32
    };

    let structure_ratio = if content.is_empty() {
        0.0
    } else {
        content.values().filter(|v| is_truthy(v)).count() as f32 / content.len() as f32
    };

    ((keyword_ratio + structure_ratio) / 2.0).min(1.0)
}

fn data_density(content: &JsonMap, required_metrics: usize, required_results: usize) -> f32 {
    let count = |key: &str| {
        content
            .get(key)
            .and_then(JsonValue::as_array)
            .map(Vec::len)
            .unwrap_or(0)
    };
    let part = |have: usize, need: usize| {
        if need == 0 {
            1.0
        } else {
            (have as f32 / need as f32).min(1.0)
        }
    };

    (part(count("metrics"), required_metrics) + part(count("results"), required_results)) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: JsonValue) -> JsonMap {
        match value {
            JsonValue::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    fn all_strategies() -> Vec<ConfidenceStrategy> {
        vec![
            ConfidenceStrategy::default(),
            ConfidenceStrategy::full_structure(["a", "b"]),
            ConfidenceStrategy::KeywordDensity {
                required_keywords: vec!["framework".into(), "design".into()],
                min_keyword_count: 3,
            },
            ConfidenceStrategy::CoverageAnalysis {
                required_elements: vec!["a".into()],
                min_coverage: 0.8,
            },
            ConfidenceStrategy::ApplicationCompleteness {
                required_fields: vec!["a".into()],
                min_completeness: 0.75,
            },
            ConfidenceStrategy::BenchmarkCompleteness {
                required_fields: vec![],
                min_completeness: 0.0,
            },
            ConfidenceStrategy::TutorialCompleteness {
                required_fields: vec!["a".into(), "c".into()],
                min_completeness: 0.7,
            },
            ConfidenceStrategy::content_completeness(["a"]),
            ConfidenceStrategy::DataDensity {
                required_metrics: 0,
                required_results: 2,
            },
        ]
    }

    #[test]
    fn test_every_strategy_stays_in_unit_range() {
        let shapes = vec![
            json!({}),
            json!({"a": "", "b": []}),
            json!({"a": "x", "b": ["y"], "c": {"k": 1}}),
            json!({"metrics": [1, 2, 3, 4, 5], "results": "not a list"}),
            json!({"a": null, "b": false, "c": 0}),
        ];
        for strategy in all_strategies() {
            for shape in &shapes {
                let score = strategy.score(&map(shape.clone()), "framework design text");
                assert!(
                    (0.0..=1.0).contains(&score),
                    "{} gave {} for {}",
                    strategy.method(),
                    score,
                    shape
                );
            }
        }
    }

    #[test]
    fn test_structure_completeness_default_target() {
        // 1 of 4 keys filled: 0.25 / 0.5 = 0.5
        let content = map(json!({"a": "x", "b": "", "c": [], "d": "   "}));
        let score = ConfidenceStrategy::default().score(&content, "");
        assert!((score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_structure_completeness_caps_at_one() {
        let strategy = ConfidenceStrategy::StructureCompleteness {
            required_fields: Some(vec!["steps".into(), "inputs".into(), "outputs".into()]),
            min_completeness: 0.7,
        };
        let content = map(json!({"steps": [1], "inputs": ["x"], "outputs": ""}));
        // 2/3 / 0.7 = 0.952
        assert!((strategy.score(&content, "") - 0.952_380_9).abs() < 1e-4);

        let full = map(json!({"steps": [1], "inputs": ["x"], "outputs": ["y"]}));
        assert_eq!(strategy.score(&full, ""), 1.0);
    }

    #[test]
    fn test_keyword_density() {
        let strategy = ConfidenceStrategy::KeywordDensity {
            required_keywords: vec![
                "framework".into(),
                "architecture".into(),
                "component".into(),
                "design".into(),
            ],
            min_keyword_count: 3,
        };
        let content = map(json!({
            "name": "Flux",
            "components": [],
            "innovations": ["x"],
            "architecture": ""
        }));
        // keywords: framework + design = 0.5; filled 2/4 = 0.5
        let score = strategy.score(&content, "A FRAMEWORK with a clean Design");
        assert!((score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_coverage_counts_whitespace_as_present() {
        let strategy = ConfidenceStrategy::CoverageAnalysis {
            required_elements: vec!["research_domain".into(), "key_concepts".into()],
            min_coverage: 0.8,
        };
        let content = map(json!({"research_domain": " ", "key_concepts": []}));
        // 1/2 / 0.8 = 0.625
        assert!((strategy.score(&content, "") - 0.625).abs() < 1e-6);
    }

    #[test]
    fn test_data_density() {
        let strategy = ConfidenceStrategy::DataDensity {
            required_metrics: 3,
            required_results: 2,
        };
        let content = map(json!({"metrics": [1, 2, 3, 4], "results": [1]}));
        assert!((strategy.score(&content, "") - 0.75).abs() < 1e-6);

        let zero_required = ConfidenceStrategy::DataDensity {
            required_metrics: 0,
            required_results: 0,
        };
        assert_eq!(zero_required.score(&JsonMap::new(), ""), 1.0);
    }

    #[test]
    fn test_completeness_variants_use_their_own_targets() {
        let content = map(json!({"a": "x", "b": ""}));
        let fields = vec!["a".to_string(), "b".to_string()];
        let benchmark = ConfidenceStrategy::BenchmarkCompleteness {
            required_fields: fields.clone(),
            min_completeness: benchmark_target(),
        };
        let application = ConfidenceStrategy::ApplicationCompleteness {
            required_fields: fields,
            min_completeness: application_target(),
        };
        assert!((benchmark.score(&content, "") - 0.8333333).abs() < 1e-4);
        assert!((application.score(&content, "") - 0.6666667).abs() < 1e-4);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let strategy: ConfidenceStrategy =
            serde_yaml::from_str("method: tutorial_completeness\nrequired_fields: [a]").unwrap();
        assert_eq!(
            strategy,
            ConfidenceStrategy::TutorialCompleteness {
                required_fields: vec!["a".into()],
                min_completeness: 0.7,
            }
        );
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let result: Result<ConfidenceStrategy, _> =
            serde_yaml::from_str("method: vibes\nrequired_fields: [a]");
        assert!(result.is_err());
    }

    #[test]
    fn test_method_matches_serialized_tag() {
        for strategy in all_strategies() {
            let value = serde_json::to_value(&strategy).unwrap();
            assert_eq!(value["method"], strategy.method());
        }
    }
}
