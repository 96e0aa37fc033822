//! # scholia-inference
//!
//! Reasoning and embedding backends for scholia.
//!
//! This crate provides:
//! - OpenAI-compatible implementation of [`ReasoningBackend`] and
//!   [`EmbeddingBackend`] (feature `openai`, on by default)
//! - Schema conformance for structured extraction responses
//! - A retry/timeout wrapper usable around any backend
//! - TOML/environment configuration
//! - A deterministic mock backend (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use scholia_inference::config::InferenceConfig;
//! use scholia_core::EmbeddingBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = InferenceConfig::from_env();
//!     let backend = config.build_backend().unwrap();
//!     let vectors = backend.embed_texts(&["transformer".to_string()]).await.unwrap();
//! }
//! ```

pub mod config;
pub mod resilience;
pub mod structured;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use scholia_core::*;

#[cfg(feature = "openai")]
pub use openai::OpenAIBackend;

pub use config::{ConfigError, ConfigResult, InferenceConfig, OpenAIConfig};
pub use resilience::{ResilienceConfig, ResilientBackend};
pub use structured::{conform_to_schema, extraction_prompt, parse_json_object};
