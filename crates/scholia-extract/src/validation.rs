//! Validation predicates for extracted content.
//!
//! Rubric files write predicates as short sentences (`"name must not be
//! empty"`, `"steps must have at least 3 items"`). They are parsed once when a
//! rubric loads; a sentence that matches neither form is a configuration error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use scholia_core::{defaults, Error, JsonMap};

use crate::confidence::{clamp_unit, is_truthy};

static NOT_EMPTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\S+)\s+must\s+not\s+be\s+empty\s*$").expect("static regex"));

static MIN_ITEMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\S+)\s+must\s+have\s+at\s+least\s+(\d+)\s+items?\s*$").expect("static regex")
});

/// What a predicate checks about its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Field is present and truthy.
    NotEmpty,
    /// Field is a list with at least this many items.
    MinItems(usize),
}

/// A single structured check on one content field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValidationPredicate {
    pub field: String,
    pub check: Check,
}

impl ValidationPredicate {
    pub fn not_empty(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            check: Check::NotEmpty,
        }
    }

    pub fn min_items(field: impl Into<String>, n: usize) -> Self {
        Self {
            field: field.into(),
            check: Check::MinItems(n),
        }
    }

    /// Parse the sentence form used in rubric files.
    pub fn parse(sentence: &str) -> Result<Self, Error> {
        if let Some(caps) = NOT_EMPTY.captures(sentence) {
            return Ok(Self::not_empty(&caps[1]));
        }
        if let Some(caps) = MIN_ITEMS.captures(sentence) {
            let n = caps[2]
                .parse()
                .map_err(|_| Error::Config(format!("item count out of range: {}", sentence)))?;
            return Ok(Self::min_items(&caps[1], n));
        }
        Err(Error::Config(format!(
            "unrecognized validation rule: {:?}",
            sentence
        )))
    }

    /// Describe the violation, if `content` fails this predicate.
    pub fn violation(&self, content: &JsonMap) -> Option<String> {
        let value = content.get(&self.field);
        match self.check {
            Check::NotEmpty => match value {
                Some(v) if is_truthy(v) => None,
                _ => Some(format!("{} is empty", self.field)),
            },
            Check::MinItems(n) => match value {
                None => Some(format!("{} is missing", self.field)),
                Some(JsonValue::Array(items)) if items.len() < n => Some(format!(
                    "{} has {} items, need {}",
                    self.field,
                    items.len(),
                    n
                )),
                Some(JsonValue::Array(_)) => None,
                Some(_) => Some(format!("{} is not a list", self.field)),
            },
        }
    }
}

impl fmt::Display for ValidationPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.check {
            Check::NotEmpty => write!(f, "{} must not be empty", self.field),
            Check::MinItems(1) => write!(f, "{} must have at least 1 item", self.field),
            Check::MinItems(n) => write!(f, "{} must have at least {} items", self.field, n),
        }
    }
}

impl TryFrom<String> for ValidationPredicate {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ValidationPredicate> for String {
    fn from(predicate: ValidationPredicate) -> Self {
        predicate.to_string()
    }
}

/// All violations of `predicates` by `content`, in predicate order.
pub fn validate(content: &JsonMap, predicates: &[ValidationPredicate]) -> Vec<String> {
    predicates
        .iter()
        .filter_map(|p| {
            let violation = p.violation(content);
            tracing::trace!(predicate = %p, passed = violation.is_none(), "Checked predicate");
            violation
        })
        .collect()
}

/// Apply the validation penalty once when there is any violation.
pub fn apply_penalty(confidence: f32, violations: &[String]) -> f32 {
    if violations.is_empty() {
        confidence
    } else {
        clamp_unit(confidence * defaults::VALIDATION_PENALTY)
    }
}
