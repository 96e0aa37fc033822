//! OpenAI-compatible reasoning and embedding backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, info, instrument};

use scholia_core::{
    defaults, ChatMessage, EmbeddingBackend, Error, JsonMap, ReasoningBackend, Result, Vector,
};

use super::error::{to_scholia_error, Endpoint, OpenAIErrorCode};
use super::types::*;
use crate::config::OpenAIConfig;
use crate::structured::{
    conform_to_schema, extraction_prompt, parse_json_object, EXTRACTION_SYSTEM_PROMPT,
};

/// OpenAI-compatible backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

/// Sampling options for one chat completion.
struct ChatOptions {
    temperature: f32,
    max_tokens: u32,
    json_mode: bool,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let mut client_builder =
            Client::builder().timeout(Duration::from_secs(config.request_timeout_secs));

        if config.skip_tls_verify {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            "Initializing OpenAI backend: url={}, gen={}, embed={}",
            config.base_url,
            config.generation_model,
            config.embedding_model
        );

        Ok(Self { client, config })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(OpenAIConfig::default())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Build a request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        req.header("Content-Type", "application/json")
    }

    /// Map a non-success response into a classified error.
    async fn error_from_response(endpoint: Endpoint, response: reqwest::Response) -> Error {
        let status = response.status();
        let body: OpenAIErrorResponse = response
            .json()
            .await
            .unwrap_or_else(|_| OpenAIErrorResponse::unknown());
        let code = OpenAIErrorCode::from_response(status.as_u16(), &body.error.error_type);
        to_scholia_error(
            endpoint,
            code,
            &format!("OpenAI returned {}: {}", status, body.error.message),
        )
    }

    async fn chat(&self, messages: Vec<ChatMessage>, options: ChatOptions) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.config.generation_model.clone(),
            messages,
            temperature: Some(options.temperature),
            max_tokens: Some(options.max_tokens),
            response_format: options.json_mode.then(ResponseFormat::json_object),
        };

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(Endpoint::Chat, response).await);
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &result.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Chat completion usage"
            );
        }

        Ok(result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl ReasoningBackend for OpenAIBackend {
    #[instrument(
        skip(self, prompt, text, schema),
        fields(
            subsystem = "inference",
            component = "openai",
            op = "extract",
            prompt_len = prompt.len()
        )
    )]
    async fn extract(&self, prompt: &str, text: &str, schema: &JsonValue) -> Result<JsonMap> {
        let messages = vec![
            ChatMessage::system(EXTRACTION_SYSTEM_PROMPT),
            ChatMessage::user(extraction_prompt(prompt, text, schema)?),
        ];

        let raw = self
            .chat(
                messages,
                ChatOptions {
                    temperature: self.config.temperature,
                    max_tokens: self.config.max_tokens,
                    json_mode: true,
                },
            )
            .await?;

        let content = parse_json_object(&raw)?;
        Ok(conform_to_schema(content, schema))
    }

    #[instrument(
        skip(self, messages),
        fields(
            subsystem = "inference",
            component = "openai",
            op = "generate",
            input_count = messages.len()
        )
    )]
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let content = self
            .chat(
                messages.to_vec(),
                ChatOptions {
                    temperature: defaults::GENERATE_TEMPERATURE,
                    max_tokens: defaults::GENERATE_MAX_TOKENS,
                    json_mode: false,
                },
            )
            .await?;

        debug!("Generation complete, response length: {}", content.len());
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.generation_model
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAIBackend {
    #[instrument(
        skip(self, texts),
        fields(
            subsystem = "inference",
            component = "openai",
            op = "embed_texts",
            input_count = texts.len()
        )
    )]
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = EmbeddingRequest {
            model: self.config.embedding_model.clone(),
            input: texts.to_vec(),
            encoding_format: Some("float".to_string()),
        };

        let response = self
            .build_request("/embeddings")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(Endpoint::Embeddings, response).await);
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        if result.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                result.data.len()
            )));
        }

        // Sort by index to ensure correct ordering
        let mut data = result.data;
        data.sort_by_key(|d| d.index);

        let vectors: Vec<Vector> = data.into_iter().map(|d| d.embedding).collect();
        debug!("Generated {} embeddings", vectors.len());
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dimension
    }

    fn model_name(&self) -> &str {
        &self.config.embedding_model
    }
}
