//! Core data models for scholia.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::defaults;
use crate::error::{Error, Result};

/// Embedding vector.
pub type Vector = Vec<f32>;

/// Structured content produced by the reasoning service.
pub type JsonMap = serde_json::Map<String, JsonValue>;

// =============================================================================
// PAPERS
// =============================================================================

/// Classification of a research paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperType {
    ConceptualFramework,
    SurveyReview,
    EmpiricalStudy,
    CaseStudy,
    BenchmarkComparison,
    PositionPaper,
    TutorialMethodology,
}

impl PaperType {
    /// Every classification, in declaration order.
    pub const ALL: [PaperType; 7] = [
        Self::ConceptualFramework,
        Self::SurveyReview,
        Self::EmpiricalStudy,
        Self::CaseStudy,
        Self::BenchmarkComparison,
        Self::PositionPaper,
        Self::TutorialMethodology,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConceptualFramework => "conceptual_framework",
            Self::SurveyReview => "survey_review",
            Self::EmpiricalStudy => "empirical_study",
            Self::CaseStudy => "case_study",
            Self::BenchmarkComparison => "benchmark_comparison",
            Self::PositionPaper => "position_paper",
            Self::TutorialMethodology => "tutorial_methodology",
        }
    }
}

impl std::fmt::Display for PaperType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaperType {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|t| t.as_str() == s.trim().to_lowercase())
            .copied()
            .ok_or_else(|| format!("Invalid paper type: {}", s))
    }
}

/// Read-only view of a paper supplied by the ingestion layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub paper_type: Option<PaperType>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Paper {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: title.into(),
            abstract_text: None,
            full_text: None,
            paper_type: None,
            categories: Vec::new(),
        }
    }

    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = Some(text.into());
        self
    }

    pub fn with_full_text(mut self, text: impl Into<String>) -> Self {
        self.full_text = Some(text.into());
        self
    }

    pub fn with_type(mut self, paper_type: PaperType) -> Self {
        self.paper_type = Some(paper_type);
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }
}

// =============================================================================
// INSIGHTS
// =============================================================================

/// Category of an extracted insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Framework,
    Concept,
    DataPoint,
    Methodology,
    Limitation,
    Application,
    FutureWork,
    KeyFinding,
}

impl InsightCategory {
    pub const ALL: [InsightCategory; 8] = [
        Self::Framework,
        Self::Concept,
        Self::DataPoint,
        Self::Methodology,
        Self::Limitation,
        Self::Application,
        Self::FutureWork,
        Self::KeyFinding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Framework => "framework",
            Self::Concept => "concept",
            Self::DataPoint => "data_point",
            Self::Methodology => "methodology",
            Self::Limitation => "limitation",
            Self::Application => "application",
            Self::FutureWork => "future_work",
            Self::KeyFinding => "key_finding",
        }
    }

    /// Human-readable form, e.g. `Future Work`.
    pub fn title_case(&self) -> String {
        self.as_str()
            .split('_')
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
}

impl std::fmt::Display for InsightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InsightCategory {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.as_str() == s.trim().to_lowercase())
            .copied()
            .ok_or_else(|| format!("Invalid insight category: {}", s))
    }
}

/// A structured, confidence-scored finding extracted from a paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub id: Uuid,
    pub paper_id: Uuid,
    pub category: InsightCategory,
    pub title: String,
    pub description: String,
    pub content: JsonMap,
    /// Extraction reliability in [0, 1].
    pub confidence: f32,
    /// How the insight was produced, e.g. `chain_of_thought` or `rubric_framework`.
    pub extraction_method: String,
    pub created_at: DateTime<Utc>,
}

impl Insight {
    pub fn new(
        paper_id: Uuid,
        category: InsightCategory,
        title: impl Into<String>,
        description: impl Into<String>,
        content: JsonMap,
        confidence: f32,
        extraction_method: impl Into<String>,
    ) -> Result<Self> {
        let insight = Self {
            id: Uuid::now_v7(),
            paper_id,
            category,
            title: title.into(),
            description: description.into(),
            content,
            confidence,
            extraction_method: extraction_method.into(),
            created_at: Utc::now(),
        };
        insight.validate()?;
        Ok(insight)
    }

    /// Check the record invariants before handing it to persistence.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidInput("insight title cannot be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.confidence) || self.confidence.is_nan() {
            return Err(Error::InvalidInput(format!(
                "insight confidence must be within [0, 1], got {}",
                self.confidence
            )));
        }
        Ok(())
    }

    pub fn is_high_confidence(&self) -> bool {
        self.confidence >= defaults::HIGH_CONFIDENCE
    }
}
