//! Provider abstractions for embeddings and answer generation
//!
//! Trait-based seams so the engine can run against a local Ollama
//! server or any other backend without touching the pipeline.

pub mod embedding;
pub mod llm;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use llm::{CompletionRequest, LlmProvider};
pub use ollama::OllamaClient;
