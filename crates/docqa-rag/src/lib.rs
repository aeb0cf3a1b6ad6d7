//! docqa-rag: tenant-scoped document question answering
//!
//! The retrieval-augmented generation core of a multi-tenant document
//! chat service. Documents are chunked, embedded, and stored in a
//! per-collection vector namespace; questions are answered by
//! retrieving the closest chunks, assembling them with the conversation
//! history into a templated prompt, and running an LLM completion with
//! a single, well-defined timeout/retry/fallback policy.
//!
//! The engine is stateless between calls. Authentication, file-format
//! parsing, and the HTTP surface live with the caller; the caller also
//! owns conversation history and passes it in per request.

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod learning;
pub mod providers;
pub mod registry;
pub mod retrieval;
pub mod types;

pub use config::RagConfig;
pub use engine::RagEngine;
pub use error::{Error, Result};
pub use index::{InMemoryVectorIndex, ScoredChunk, TenantVectorIndex};
pub use providers::{EmbeddingProvider, LlmProvider, OllamaClient};
pub use registry::{CollectionConfig, InMemoryRegistry, PromptTemplate, TenantRegistry};
pub use types::{
    conversation::{ConversationTurn, Role},
    document::{Chunk, Document},
    query::AskRequest,
    response::{Answer, AnswerKind, IndexOutcome},
};
