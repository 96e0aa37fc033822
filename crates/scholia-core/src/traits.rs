//! Core traits for scholia abstractions.
//!
//! These traits define the seams to external collaborators (reasoning and
//! embedding services, tag persistence) so that concrete implementations are
//! pluggable and the pipeline is testable without a network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::{JsonMap, Vector};
use crate::tags::{Tag, TagCategory};

// =============================================================================
// REASONING / EMBEDDING TRAITS
// =============================================================================

/// A single chat message exchanged with a generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Backend for structured extraction and free-form generation.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Extract a structured object matching `schema` from `text`.
    ///
    /// Implementations must return an object whose keys are exactly the
    /// schema's keys (see `conform_to_schema` in scholia-inference).
    async fn extract(&self, prompt: &str, text: &str, schema: &JsonValue) -> Result<JsonMap>;

    /// Generate free-form text from a conversation.
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for embedding generation.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Returns one vector per input text, in input order.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

// =============================================================================
// TAG REPOSITORY TRAITS
// =============================================================================

/// Read/create access to canonical labels held by the persistence layer.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// All labels in a category.
    async fn list_by_category(&self, category: TagCategory) -> Result<Vec<Tag>>;

    /// Exact-name lookup across all categories.
    ///
    /// Names are unique repository-wide, so the returned tag may belong to a
    /// different category than the caller is canonicalizing for.
    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// Persist a new label and return the stored record.
    async fn create(&self, tag: Tag) -> Result<Tag>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_constructors() {
        let system = ChatMessage::system("You are a tagging expert.");
        let user = ChatMessage::user("term");
        assert_eq!(system.role, "system");
        assert_eq!(user.role, "user");
        assert_eq!(user.content, "term");
    }

    #[test]
    fn test_chat_message_serialization() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_traits_are_object_safe() {
        fn _reasoning(_: &dyn ReasoningBackend) {}
        fn _embedding(_: &dyn EmbeddingBackend) {}
        fn _tags(_: &dyn TagRepository) {}
    }
}
