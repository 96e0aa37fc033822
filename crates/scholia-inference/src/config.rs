//! Inference configuration.
//!
//! Configuration can be loaded from:
//! - a TOML file (path from `SCHOLIA_INFERENCE_CONFIG`, default `scholia.toml`)
//! - environment variables (`SCHOLIA_*` prefixed)
//!
//! ```toml
//! [inference.openai]
//! base_url = "https://api.openai.com/v1"
//! api_key = "${OPENAI_API_KEY}"
//! generation_model = "gpt-4o-mini"
//! embedding_model = "text-embedding-3-small"
//!
//! [inference.resilience]
//! timeout_secs = 60
//! max_retries = 3
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use scholia_core::defaults;

use crate::resilience::ResilienceConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for scholia_core::Error {
    fn from(e: ConfigError) -> Self {
        scholia_core::Error::Config(e.to_string())
    }
}

static ENV_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static regex"));

/// OpenAI-compatible endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model to use for extraction and generation.
    pub generation_model: String,
    /// Model to use for embeddings.
    pub embedding_model: String,
    /// Expected embedding dimension.
    pub embedding_dimension: usize,
    /// Sampling temperature for structured extraction.
    pub temperature: f32,
    /// Token ceiling for structured extraction responses.
    pub max_tokens: u32,
    /// HTTP client timeout in seconds (transport level).
    pub request_timeout_secs: u64,
    /// Skip TLS verification (self-signed certs in local environments).
    pub skip_tls_verify: bool,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::OPENAI_URL.to_string(),
            api_key: None,
            generation_model: defaults::GEN_MODEL.to_string(),
            embedding_model: defaults::EMBED_MODEL.to_string(),
            embedding_dimension: defaults::EMBED_DIMENSION,
            temperature: defaults::EXTRACT_TEMPERATURE,
            max_tokens: defaults::EXTRACT_MAX_TOKENS,
            request_timeout_secs: defaults::CALL_TIMEOUT_SECS * 2,
            skip_tls_verify: false,
        }
    }
}

impl OpenAIConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_url.is_empty() {
            return Err(ConfigError::Validation(
                "OpenAI base_url cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "OpenAI base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        if self.generation_model.is_empty() {
            return Err(ConfigError::Validation(
                "OpenAI generation_model cannot be empty".to_string(),
            ));
        }

        if self.embedding_model.is_empty() {
            return Err(ConfigError::Validation(
                "OpenAI embedding_model cannot be empty".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Validation(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }

        Ok(())
    }
}

/// Main inference configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default)]
    pub openai: OpenAIConfig,
    #[serde(default)]
    pub resilience: ResilienceConfig,
}

impl InferenceConfig {
    /// Config file path: `SCHOLIA_INFERENCE_CONFIG` or `./scholia.toml`.
    pub fn default_config_path() -> PathBuf {
        env::var("SCHOLIA_INFERENCE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("scholia.toml"))
    }

    /// Load from the default path, falling back to environment variables.
    pub fn load() -> ConfigResult<Self> {
        let path = Self::default_config_path();

        if path.exists() {
            info!("Loading inference config from: {}", path.display());
            Self::from_file(&path)
        } else {
            debug!(
                "Config file not found at {}, using environment variables",
                path.display()
            );
            let config = Self::from_env();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text with `${VAR}` substitution.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let content = Self::substitute_env_vars(content);

        #[derive(Deserialize)]
        struct TomlRoot {
            #[serde(default)]
            inference: InferenceConfig,
        }

        let root: TomlRoot = toml::from_str(&content)?;
        root.inference.validate()?;
        Ok(root.inference)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut openai = OpenAIConfig::default();
        if let Ok(url) = env::var("SCHOLIA_OPENAI_URL") {
            openai.base_url = url;
        }
        openai.api_key = env::var("SCHOLIA_OPENAI_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .ok();
        if let Ok(model) = env::var("SCHOLIA_GENERATION_MODEL") {
            openai.generation_model = model;
        }
        if let Ok(model) = env::var("SCHOLIA_EMBEDDING_MODEL") {
            openai.embedding_model = model;
        }
        if let Some(dim) = parse_env("SCHOLIA_EMBEDDING_DIM") {
            openai.embedding_dimension = dim;
        }
        openai.skip_tls_verify = env::var("SCHOLIA_SKIP_TLS_VERIFY")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let mut resilience = ResilienceConfig::default();
        if let Some(secs) = parse_env("SCHOLIA_CALL_TIMEOUT_SECS") {
            resilience.timeout_secs = secs;
        }
        if let Some(retries) = parse_env("SCHOLIA_MAX_RETRIES") {
            resilience.max_retries = retries;
        }
        if let Some(ms) = parse_env("SCHOLIA_INITIAL_BACKOFF_MS") {
            resilience.initial_backoff_ms = ms;
        }
        if let Some(ms) = parse_env("SCHOLIA_MAX_BACKOFF_MS") {
            resilience.max_backoff_ms = ms;
        }

        Self { openai, resilience }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.openai.validate()?;
        self.resilience.validate()?;
        Ok(())
    }

    /// Build the OpenAI backend wrapped with retry/timeout handling.
    #[cfg(feature = "openai")]
    pub fn build_backend(
        &self,
    ) -> scholia_core::Result<crate::resilience::ResilientBackend<crate::openai::OpenAIBackend>>
    {
        self.validate()?;
        let backend = crate::openai::OpenAIBackend::new(self.openai.clone())?;
        Ok(crate::resilience::ResilientBackend::new(
            backend,
            self.resilience.clone(),
        ))
    }

    /// Substitute environment variables in the format ${VAR_NAME}.
    fn substitute_env_vars(content: &str) -> String {
        ENV_PLACEHOLDER
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}
