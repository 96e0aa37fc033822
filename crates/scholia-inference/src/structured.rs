//! Structured extraction helpers.
//!
//! Builds the extraction prompt sent to a chat model, parses the reply into a
//! JSON object (tolerating fenced code blocks and leading chatter), and
//! conforms the object to the expected schema so downstream scoring always
//! sees exactly the schema's fields.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::warn;

use scholia_core::{Error, JsonMap, Result};

/// System prompt for structured extraction calls.
pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are a research paper analysis expert. \
Extract structured information from academic papers and return only valid JSON.";

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("static regex"));

/// Build the user prompt for an extraction call.
pub fn extraction_prompt(prompt: &str, text: &str, schema: &JsonValue) -> Result<String> {
    let structure = serde_json::to_string_pretty(schema)?;
    Ok(format!(
        r#"{prompt}

Please analyze the following research paper content and extract information according to the specified structure.

CRITICAL: You MUST return a JSON object that EXACTLY matches this structure. Do not add, remove, or rename any fields:
{structure}

Research Paper Content:
{text}

IMPORTANT RULES:
1. Return ONLY the JSON object, no additional text
2. Use EXACTLY the field names shown in the structure above
3. Do not create new fields or rename existing ones
4. If a field cannot be filled, use an empty string ""
5. Ensure all required fields are present

Return only the JSON object:"#,
        prompt = prompt.trim(),
    ))
}

/// Parse a model reply into a JSON object.
///
/// Accepts a bare object, an object inside a fenced code block, or an object
/// surrounded by prose. Anything else is malformed output.
pub fn parse_json_object(raw: &str) -> Result<JsonMap> {
    let trimmed = raw.trim();

    let mut candidates: Vec<&str> = vec![trimmed];
    if let Some(caps) = FENCED_JSON.captures(trimmed) {
        if let Some(inner) = caps.get(1) {
            candidates.push(inner.as_str());
        }
    }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            candidates.push(&trimmed[start..=end]);
        }
    }

    for candidate in candidates {
        if let Ok(JsonValue::Object(map)) = serde_json::from_str::<JsonValue>(candidate) {
            return Ok(map);
        }
    }

    Err(Error::Serialization(format!(
        "malformed model output: expected a JSON object, got {} bytes",
        raw.len()
    )))
}

/// Conform an extracted object to `schema`.
///
/// - missing fields become `""`
/// - list fields holding a non-list become `[]`
/// - string fields holding a non-string scalar are stringified (`null` → `""`)
/// - fields absent from the schema are dropped
///
/// A non-object schema leaves the content untouched.
pub fn conform_to_schema(mut content: JsonMap, schema: &JsonValue) -> JsonMap {
    let Some(fields) = schema.as_object() else {
        return content;
    };

    let mut conformed = JsonMap::with_capacity(fields.len());
    for (field, spec) in fields {
        let value = match content.remove(field) {
            None => {
                warn!(field = %field, "Missing field in structured response");
                empty_for(spec)
            }
            Some(value) => match (spec, value) {
                (JsonValue::Array(_), v @ JsonValue::Array(_)) => v,
                (JsonValue::Array(_), other) => {
                    warn!(field = %field, got = %type_name(&other), "Expected list field");
                    JsonValue::Array(vec![])
                }
                (JsonValue::String(_), JsonValue::Null) => JsonValue::String(String::new()),
                (JsonValue::String(_), JsonValue::Number(n)) => JsonValue::String(n.to_string()),
                (JsonValue::String(_), JsonValue::Bool(b)) => JsonValue::String(b.to_string()),
                (_, v) => v,
            },
        };
        conformed.insert(field.clone(), value);
    }

    if !content.is_empty() {
        let extra: Vec<&String> = content.keys().collect();
        warn!(?extra, "Removing fields not in expected structure");
    }

    conformed
}

fn empty_for(spec: &JsonValue) -> JsonValue {
    match spec {
        JsonValue::Array(_) => JsonValue::Array(vec![]),
        _ => JsonValue::String(String::new()),
    }
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
