//! Configuration for the RAG engine

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main RAG engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Prompt assembly configuration
    #[serde(default)]
    pub context: ContextConfig,
    /// LLM provider configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Response cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
}

impl RagConfig {
    /// Parse configuration from a TOML document
    pub fn from_toml(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| Error::config(format!("invalid config: {e}")))
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in bytes of UTF-8 text
    pub chunk_size: usize,
    /// Overlap between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default number of chunks to retrieve per question
    pub top_k: usize,
    /// Minimum similarity for a chunk to be used as context.
    /// Permissive by default; an empty result set is a valid outcome.
    pub min_similarity: f32,
    /// Deadline for the embed-and-search path. Shorter than the
    /// generation timeout since retrieval gates all later work.
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_similarity: 0.0,
            timeout_secs: 10,
        }
    }
}

/// Prompt assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// How many of the most recent conversation turns to include
    pub history_window: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { history_window: 8 }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Embedding dimensions
    pub embed_dimensions: usize,
    /// Hard deadline for a single completion request
    pub request_timeout_secs: u64,
    /// Retries after a transient failure before degrading to a fallback
    pub max_retries: u32,
    /// Base backoff between retries in milliseconds
    pub retry_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            embed_dimensions: 768,
            request_timeout_secs: 60,
            max_retries: 1,
            retry_backoff_ms: 500,
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether the answer cache is consulted at all
    pub enabled: bool,
    /// Maximum number of cached answers
    pub max_entries: usize,
    /// Time-to-live for cached answers in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 1000,
            ttl_secs: 24 * 60 * 60,
        }
    }
}
