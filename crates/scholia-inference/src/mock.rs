//! Mock reasoning/embedding backend for deterministic testing.
//!
//! Replies are scripted by *needle*: the first rule whose needle occurs in the
//! prompt (for `extract`) or in the joined message contents (for `generate`)
//! decides the reply. Unmatched calls get the configured default.
//!
//! ```rust,ignore
//! use scholia_inference::mock::{MockBackend, MockReply};
//! use serde_json::json;
//!
//! let backend = MockBackend::new()
//!     .with_extract("main framework", MockReply::json(json!({"name": "Flux"})));
//!
//! let content = backend
//!     .extract("Identify the main framework.", "text", &json!({"name": "string"}))
//!     .await?;
//! assert_eq!(content["name"], "Flux");
//! ```

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use scholia_core::{
    ChatMessage, EmbeddingBackend, Error, JsonMap, ReasoningBackend, Result, Vector,
};

use crate::structured::conform_to_schema;

/// Scripted reply for a matched call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Structured content (used by `extract`; serialized for `generate`).
    Json(JsonValue),
    /// Free text (used by `generate`).
    Text(String),
    /// Fail the call with an inference error.
    Fail(String),
}

impl MockReply {
    pub fn json(value: JsonValue) -> Self {
        Self::Json(value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }
}

/// A recorded backend invocation.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: &'static str,
    pub input: String,
}

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    extract_rules: Vec<(String, MockReply)>,
    generate_rules: Vec<(String, MockReply)>,
    default_extract: JsonValue,
    default_generation: String,
    embeddings: HashMap<String, Vector>,
    embed_failure: Option<String>,
    latency_ms: u64,
    failure_rate: f64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: 8,
            extract_rules: Vec::new(),
            generate_rules: Vec::new(),
            default_extract: JsonValue::Object(JsonMap::new()),
            default_generation: "Mock response".to_string(),
            embeddings: HashMap::new(),
            embed_failure: None,
            latency_ms: 0,
            failure_rate: 0.0,
        }
    }
}

/// Mock backend implementing both [`ReasoningBackend`] and [`EmbeddingBackend`].
#[derive(Clone)]
pub struct MockBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply to `extract` calls whose prompt contains `needle`.
    pub fn with_extract(mut self, needle: impl Into<String>, reply: MockReply) -> Self {
        Arc::make_mut(&mut self.config)
            .extract_rules
            .push((needle.into(), reply));
        self
    }

    /// Reply to `generate` calls whose messages contain `needle`.
    pub fn with_generation(mut self, needle: impl Into<String>, reply: MockReply) -> Self {
        Arc::make_mut(&mut self.config)
            .generate_rules
            .push((needle.into(), reply));
        self
    }

    /// Content returned by unmatched `extract` calls (before conforming).
    pub fn with_default_extract(mut self, value: JsonValue) -> Self {
        Arc::make_mut(&mut self.config).default_extract = value;
        self
    }

    /// Text returned by unmatched `generate` calls.
    pub fn with_default_generation(mut self, text: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_generation = text.into();
        self
    }

    /// Fixed vector for an exact input text.
    pub fn with_embedding(mut self, text: impl Into<String>, vector: Vector) -> Self {
        Arc::make_mut(&mut self.config)
            .embeddings
            .insert(text.into(), vector);
        self
    }

    /// Make every embedding call fail.
    pub fn with_embedding_failure(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).embed_failure = Some(message.into());
        self
    }

    /// Set the embedding dimension for generated vectors.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Set simulated latency for all operations.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Set failure rate (0.0 - 1.0) for testing error handling.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        Arc::make_mut(&mut self.config).failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Get all logged calls for assertion.
    pub fn calls(&self) -> Vec<MockCall> {
        self.log().clone()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.log().clear()
    }

    pub fn extract_call_count(&self) -> usize {
        self.count("extract")
    }

    pub fn generate_call_count(&self) -> usize {
        self.count("generate")
    }

    pub fn embed_call_count(&self) -> usize {
        self.count("embed")
    }

    /// Number of logged calls whose input contains `needle`.
    pub fn calls_containing(&self, needle: &str) -> usize {
        self.log().iter().filter(|c| c.input.contains(needle)).count()
    }

    fn log(&self) -> MutexGuard<'_, Vec<MockCall>> {
        self.call_log.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn count(&self, operation: &str) -> usize {
        self.log().iter().filter(|c| c.operation == operation).count()
    }

    fn record(&self, operation: &'static str, input: String) {
        self.log().push(MockCall { operation, input });
    }

    async fn simulate(&self) -> Result<()> {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
        if self.config.failure_rate > 0.0 {
            use rand::Rng;
            let roll: f64 = rand::thread_rng().gen();
            if roll < self.config.failure_rate {
                return Err(Error::Inference("Simulated failure for testing".to_string()));
            }
        }
        Ok(())
    }

    fn find<'a>(rules: &'a [(String, MockReply)], haystack: &str) -> Option<&'a MockReply> {
        rules
            .iter()
            .find(|(needle, _)| haystack.contains(needle.as_str()))
            .map(|(_, reply)| reply)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReasoningBackend for MockBackend {
    async fn extract(&self, prompt: &str, _text: &str, schema: &JsonValue) -> Result<JsonMap> {
        self.record("extract", prompt.to_string());
        self.simulate().await?;

        let value = match Self::find(&self.config.extract_rules, prompt) {
            Some(MockReply::Json(value)) => value.clone(),
            Some(MockReply::Text(text)) => {
                return Err(Error::Serialization(format!(
                    "malformed model output: {}",
                    text
                )))
            }
            Some(MockReply::Fail(message)) => return Err(Error::Inference(message.clone())),
            None => self.config.default_extract.clone(),
        };

        match value {
            JsonValue::Object(map) => Ok(conform_to_schema(map, schema)),
            other => Err(Error::Serialization(format!(
                "malformed model output: expected object, got {}",
                other
            ))),
        }
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let joined = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.record("generate", joined.clone());
        self.simulate().await?;

        match Self::find(&self.config.generate_rules, &joined) {
            Some(MockReply::Text(text)) => Ok(text.clone()),
            Some(MockReply::Json(value)) => Ok(value.to_string()),
            Some(MockReply::Fail(message)) => Err(Error::Inference(message.clone())),
            None => Ok(self.config.default_generation.clone()),
        }
    }

    fn model_name(&self) -> &str {
        "mock-reasoning"
    }
}

#[async_trait]
impl EmbeddingBackend for MockBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        self.record("embed", texts.join("\n"));
        self.simulate().await?;

        if let Some(message) = &self.config.embed_failure {
            return Err(Error::Embedding(message.clone()));
        }

        Ok(texts
            .iter()
            .map(|text| {
                self.config
                    .embeddings
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| {
                        MockEmbeddingGenerator::generate(text, self.config.dimension)
                    })
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }
}

/// Mock embedding generator with deterministic output.
pub struct MockEmbeddingGenerator;

impl MockEmbeddingGenerator {
    /// Generate a deterministic unit vector from text.
    ///
    /// The same text always produces the same embedding.
    pub fn generate(text: &str, dimension: usize) -> Vector {
        let dimension = dimension.max(1);
        let mut vec = vec![0.0; dimension];

        for (i, c) in text.chars().enumerate() {
            let idx = (c as usize + i) % dimension;
            vec[idx] += 0.1;
        }

        Self::normalize(&mut vec);
        vec
    }

    /// Unit vector in 2D at the given cosine to `[1, 0]`.
    pub fn at_cosine(cosine: f32) -> Vector {
        let c = cosine.clamp(-1.0, 1.0);
        vec![c, (1.0 - c * c).sqrt()]
    }

    fn normalize(vec: &mut [f32]) {
        let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            vec.iter_mut().for_each(|x| *x /= magnitude);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholia_core::cosine_similarity;
    use serde_json::json;

    #[tokio::test]
    async fn test_extract_matches_needle_and_conforms() {
        let backend = MockBackend::new().with_extract(
            "framework",
            MockReply::json(json!({"name": "Flux", "extra": 1})),
        );
        let schema = json!({"name": "string", "components": ["string"]});

        let content = backend
            .extract("Identify the framework", "text", &schema)
            .await
            .unwrap();

        assert_eq!(content["name"], "Flux");
        assert_eq!(content["components"], json!([]));
        assert!(!content.contains_key("extra"));
    }

    #[tokio::test]
    async fn test_extract_first_matching_rule_wins() {
        let backend = MockBackend::new()
            .with_extract("Step 2", MockReply::json(json!({"v": "two"})))
            .with_extract("Step", MockReply::json(json!({"v": "any"})));
        let schema = json!({"v": "string"});

        let a = backend.extract("Step 2 of 5", "", &schema).await.unwrap();
        let b = backend.extract("Step 3 of 5", "", &schema).await.unwrap();
        assert_eq!(a["v"], "two");
        assert_eq!(b["v"], "any");
    }

    #[tokio::test]
    async fn test_extract_default_is_conformed_empty() {
        let backend = MockBackend::new();
        let content = backend
            .extract("anything", "", &json!({"a": "string"}))
            .await
            .unwrap();
        assert_eq!(content["a"], "");
    }

    #[tokio::test]
    async fn test_extract_fail_and_malformed() {
        let backend = MockBackend::new()
            .with_extract("boom", MockReply::fail("down"))
            .with_extract("garbled", MockReply::text("not json"));

        let err = backend.extract("boom", "", &json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Inference(_)));

        let err = backend.extract("garbled", "", &json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn test_generate_rules_and_default() {
        let backend = MockBackend::new()
            .with_generation("deep learning", MockReply::text("deep-learning"))
            .with_default_generation("fallback");

        let hit = backend
            .generate(&[ChatMessage::user("Term: deep learning")])
            .await
            .unwrap();
        let miss = backend.generate(&[ChatMessage::user("other")]).await.unwrap();

        assert_eq!(hit, "deep-learning");
        assert_eq!(miss, "fallback");
        assert_eq!(backend.generate_call_count(), 2);
    }

    #[tokio::test]
    async fn test_embeddings_mapped_and_generated() {
        let backend = MockBackend::new()
            .with_dimension(16)
            .with_embedding("fixed", vec![1.0, 0.0]);

        let vectors = backend
            .embed_texts(&["fixed".to_string(), "other".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors[0], vec![1.0, 0.0]);
        assert_eq!(vectors[1].len(), 16);
        assert_eq!(backend.embed_call_count(), 1);
    }

    #[tokio::test]
    async fn test_embedding_failure() {
        let backend = MockBackend::new().with_embedding_failure("offline");
        let err = backend.embed_texts(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn test_failure_rate_one_always_fails() {
        let backend = MockBackend::new().with_failure_rate(1.0);
        assert!(backend.generate(&[]).await.is_err());
    }

    #[tokio::test]
    async fn test_call_log_and_clear() {
        let backend = MockBackend::new();
        backend.extract("alpha prompt", "", &json!({})).await.unwrap();
        backend.generate(&[ChatMessage::user("beta")]).await.unwrap();

        assert_eq!(backend.calls().len(), 2);
        assert_eq!(backend.calls_containing("alpha"), 1);
        backend.clear_calls();
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_generator_deterministic_and_normalized() {
        let e1 = MockEmbeddingGenerator::generate("test", 64);
        let e2 = MockEmbeddingGenerator::generate("test", 64);
        assert_eq!(e1, e2);
        let magnitude: f32 = e1.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_at_cosine() {
        let v = MockEmbeddingGenerator::at_cosine(0.93);
        let sim = cosine_similarity(&[1.0, 0.0], &v);
        assert!((sim - 0.93).abs() < 1e-5);
    }
}
