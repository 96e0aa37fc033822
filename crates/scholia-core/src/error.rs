//! Error types for scholia.

use thiserror::Error;

/// Result type alias using scholia's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for scholia operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rubric not present in the configuration store
    #[error("Rubric not found: {0}")]
    RubricNotFound(String),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Reasoning/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// External call exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure is transient and the call may be attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Inference(_) | Error::Embedding(_) | Error::Request(_) | Error::Timeout(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_rubric_not_found() {
        let err = Error::RubricNotFound("survey_default".to_string());
        assert_eq!(err.to_string(), "Rubric not found: survey_default");
    }

    #[test]
    fn test_error_display_embedding() {
        let err = Error::Embedding("failed to generate".to_string());
        assert_eq!(err.to_string(), "Embedding error: failed to generate");
    }

    #[test]
    fn test_error_display_inference() {
        let err = Error::Inference("model overloaded".to_string());
        assert_eq!(err.to_string(), "Inference error: model overloaded");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("unknown confidence method".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: unknown confidence method"
        );
    }

    #[test]
    fn test_error_display_timeout() {
        let err = Error::Timeout("extract after 30s".to_string());
        assert_eq!(err.to_string(), "Timed out: extract after 30s");
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Inference("503".into()).is_retryable());
        assert!(Error::Embedding("reset".into()).is_retryable());
        assert!(Error::Request("unreachable".into()).is_retryable());
        assert!(Error::Timeout("slow".into()).is_retryable());

        assert!(!Error::Config("bad key".into()).is_retryable());
        assert!(!Error::Serialization("not json".into()).is_retryable());
        assert!(!Error::InvalidInput("empty".into()).is_retryable());
        assert!(!Error::RubricNotFound("x".into()).is_retryable());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_serde_yaml_error() {
        let yaml_err = serde_yaml::from_str::<Vec<i32>>("key: [unclosed").unwrap_err();
        let err: Error = yaml_err.into();
        assert!(err.to_string().starts_with("Serialization error:"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
