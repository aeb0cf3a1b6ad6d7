//! Error types for the RAG engine

use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG engine errors
#[derive(Debug, Error)]
pub enum Error {
    /// Request rejected before any network call (empty question, bad input)
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown collection identifier
    #[error("unknown collection: {0}")]
    CollectionNotFound(String),

    /// Configuration error (bad template, model mismatch)
    #[error("configuration error: {0}")]
    Config(String),

    /// Embedding generation failed
    #[error("embedding failed: {message}")]
    Embedding { message: String, transient: bool },

    /// Vector index error
    #[error("vector index error: {0}")]
    VectorIndex(String),

    /// LLM provider error
    #[error("LLM error: {message}")]
    Llm { message: String, transient: bool },

    /// An operation exceeded its deadline
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a non-transient embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            transient: false,
        }
    }

    /// Create a transient embedding error (network, rate limit)
    pub fn embedding_transient(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            transient: true,
        }
    }

    /// Create a vector index error
    pub fn vector_index(message: impl Into<String>) -> Self {
        Self::VectorIndex(message.into())
    }

    /// Create a non-transient LLM error (auth failure, malformed request)
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            transient: false,
        }
    }

    /// Create a transient LLM error (network, rate limit, server overload)
    pub fn llm_transient(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            transient: true,
        }
    }

    /// Whether the failure is worth a single retry before degrading
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Embedding { transient, .. } | Self::Llm { transient, .. } => *transient,
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Whether the error is the caller's fault and must propagate as-is,
    /// never be absorbed into a fallback answer
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::CollectionNotFound(_) | Self::Config(_)
        )
    }
}
