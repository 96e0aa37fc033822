//! OpenAI-specific error handling.

use scholia_core::Error;

/// OpenAI-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::ServerError)
    }
}

/// Which service the failing request belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Chat,
    Embeddings,
}

/// Convert an API failure into a scholia [`Error`].
///
/// Retryable codes map to variants that [`Error::is_retryable`] accepts;
/// everything else maps to non-retryable variants so the retry layer gives up
/// immediately.
pub fn to_scholia_error(endpoint: Endpoint, code: OpenAIErrorCode, message: &str) -> Error {
    let transient = |msg: String| match endpoint {
        Endpoint::Chat => Error::Inference(msg),
        Endpoint::Embeddings => Error::Embedding(msg),
    };

    match code {
        OpenAIErrorCode::AuthenticationError => {
            Error::Config(format!("Authentication failed: {}", message))
        }
        OpenAIErrorCode::ModelNotFound => Error::Config(format!("Model not found: {}", message)),
        OpenAIErrorCode::ContextLengthExceeded => {
            Error::InvalidInput(format!("Context too long: {}", message))
        }
        OpenAIErrorCode::RateLimitExceeded => {
            transient(format!("Rate limit exceeded: {}", message))
        }
        OpenAIErrorCode::ServerError => transient(format!("Server error: {}", message)),
        OpenAIErrorCode::Unknown => Error::InvalidInput(format!("Request rejected: {}", message)),
    }
}
