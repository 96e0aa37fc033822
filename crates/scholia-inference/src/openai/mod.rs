//! OpenAI-compatible inference backend.
//!
//! Works with any endpoint implementing the OpenAI chat-completions and
//! embeddings APIs (OpenAI, Azure OpenAI, vLLM, Ollama's `/v1`, ...).
//!
//! # Example
//!
//! ```rust,no_run
//! use scholia_inference::openai::OpenAIBackend;
//! use scholia_inference::OpenAIConfig;
//! use scholia_core::ReasoningBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OpenAIConfig {
//!         base_url: "http://localhost:11434/v1".to_string(),
//!         generation_model: "llama3".to_string(),
//!         ..Default::default()
//!     };
//!     let backend = OpenAIBackend::new(config).unwrap();
//!
//!     let schema = serde_json::json!({"name": "string", "components": ["string"]});
//!     let content = backend
//!         .extract("Identify the main framework.", "Title: ...", &schema)
//!         .await
//!         .unwrap();
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::OpenAIBackend;
pub use error::{to_scholia_error, Endpoint, OpenAIErrorCode};
pub use types::*;
