//! Canonical label (tag) types and label-shape helpers.
//!
//! Tags are paper-independent labels such as `attention-mechanism` or
//! `benchmark-evaluation`. Names are lowercase and hyphenated; deduplication
//! happens by embedding similarity elsewhere, so the helpers here only deal
//! with the surface form of a label.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;

/// Category of a canonical label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    ResearchDomain,
    Concept,
    Methodology,
    Application,
    InnovationMarker,
}

impl TagCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResearchDomain => "research_domain",
            Self::Concept => "concept",
            Self::Methodology => "methodology",
            Self::Application => "application",
            Self::InnovationMarker => "innovation_marker",
        }
    }
}

impl std::fmt::Display for TagCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TagCategory {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "research_domain" => Ok(Self::ResearchDomain),
            "concept" => Ok(Self::Concept),
            "methodology" => Ok(Self::Methodology),
            "application" => Ok(Self::Application),
            "innovation_marker" => Ok(Self::InnovationMarker),
            _ => Err(format!("Invalid tag category: {}", s)),
        }
    }
}

/// How a tag came to be attached to a paper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagSource {
    #[default]
    Automatic,
    Manual,
    UserOverride,
}

impl std::fmt::Display for TagSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Automatic => write!(f, "automatic"),
            Self::Manual => write!(f, "manual"),
            Self::UserOverride => write!(f, "user_override"),
        }
    }
}

/// A canonical, reusable label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub category: TagCategory,
    #[serde(default)]
    pub description: String,
}

impl Tag {
    pub fn new(
        name: impl Into<String>,
        category: TagCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            category,
            description: description.into(),
        }
    }
}

/// Request to associate a tag with a paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperTag {
    pub paper_id: Uuid,
    pub tag_id: Uuid,
    pub confidence: f32,
    pub source: TagSource,
}

impl PaperTag {
    pub fn automatic(paper_id: Uuid, tag_id: Uuid) -> Self {
        Self {
            paper_id,
            tag_id,
            confidence: defaults::PAPER_TAG_CONFIDENCE,
            source: TagSource::Automatic,
        }
    }
}

/// Surface-normalize a candidate term: lowercase, spaces to hyphens,
/// at most [`defaults::TAG_NAME_MAX_CHARS`] characters.
pub fn normalize_term(term: &str) -> String {
    term.trim()
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .take(defaults::TAG_NAME_MAX_CHARS)
        .collect()
}

/// Clean a generated label: lowercase, hyphens for spaces, alphanumerics and
/// hyphens only, no repeated or edge hyphens.
pub fn clean_label(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase().replace(' ', "-");
    let filtered: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect();

    let mut collapsed = String::with_capacity(filtered.len());
    for c in filtered.chars() {
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed.trim_matches('-').to_string()
}

/// Labels too generic, or too implementation-flavored, to be reusable.
pub const LABEL_STOPLIST: &[&str] = &[
    "paper",
    "study",
    "research",
    "method",
    "methods",
    "approach",
    "model",
    "models",
    "system",
    "framework",
    "technique",
    "implementation",
    "code",
    "data",
    "results",
    "experiment",
    "analysis",
    "other",
    "misc",
    "general",
    "unknown",
    "none",
    "n-a",
];

const IMPERATIVE_PREFIXES: &[&str] = &["implement", "use", "run", "write", "call"];
const PAPER_SPECIFIC_MARKERS: &[&str] = &["this", "our", "paper", "proposed"];

/// Reasons a label fails validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelRejection {
    Empty,
    Length(usize),
    TooManyWords(usize),
    Numeric,
    Stoplisted,
    ContainsDigits,
    ImperativeVerb,
    PaperSpecific,
}

impl std::fmt::Display for LabelRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "label is empty"),
            Self::Length(n) => write!(f, "label length {} outside 2..=50", n),
            Self::TooManyWords(n) => write!(f, "label has {} words, max 3", n),
            Self::Numeric => write!(f, "label is purely numeric"),
            Self::Stoplisted => write!(f, "label is in the stoplist"),
            Self::ContainsDigits => write!(f, "research domains cannot contain digits"),
            Self::ImperativeVerb => write!(f, "methodology labels cannot start with a verb"),
            Self::PaperSpecific => write!(f, "concept label references a specific paper"),
        }
    }
}

/// Validate a cleaned label for the given category.
pub fn validate_label(label: &str, category: TagCategory) -> Result<(), LabelRejection> {
    if label.is_empty() {
        return Err(LabelRejection::Empty);
    }
    let len = label.chars().count();
    if !(2..=defaults::TAG_NAME_MAX_CHARS).contains(&len) {
        return Err(LabelRejection::Length(len));
    }
    let segments: Vec<&str> = label.split('-').filter(|s| !s.is_empty()).collect();
    if segments.len() > defaults::TAG_MAX_WORDS {
        return Err(LabelRejection::TooManyWords(segments.len()));
    }
    if label.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return Err(LabelRejection::Numeric);
    }
    if LABEL_STOPLIST.contains(&label) {
        return Err(LabelRejection::Stoplisted);
    }

    match category {
        TagCategory::ResearchDomain if label.chars().any(|c| c.is_ascii_digit()) => {
            Err(LabelRejection::ContainsDigits)
        }
        TagCategory::Methodology
            if segments
                .first()
                .is_some_and(|first| IMPERATIVE_PREFIXES.contains(first)) =>
        {
            Err(LabelRejection::ImperativeVerb)
        }
        TagCategory::Concept if segments.iter().any(|s| PAPER_SPECIFIC_MARKERS.contains(s)) => {
            Err(LabelRejection::PaperSpecific)
        }
        _ => Ok(()),
    }
}
