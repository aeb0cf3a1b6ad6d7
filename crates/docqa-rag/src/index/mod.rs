//! Tenant-partitioned vector index
//!
//! Every operation takes an explicit namespace; there is no default
//! partition and no way to search across partitions, which is what
//! keeps one tenant's chunks out of another tenant's answers.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::document::Chunk;

pub use memory::InMemoryVectorIndex;

/// A chunk returned from a similarity search
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The matched chunk
    pub chunk: Chunk,
    /// Cosine similarity in [-1, 1], higher is closer
    pub similarity: f32,
}

/// Vector storage partitioned per collection namespace.
///
/// Writes for one file must never be partially visible: a concurrent
/// `search` sees either the whole previous chunk set or the whole new
/// one. Equal similarity scores rank by ascending `chunk_id` so search
/// results are deterministic.
#[async_trait]
pub trait TenantVectorIndex: Send + Sync {
    /// Insert or replace a single chunk
    async fn upsert(&self, namespace: &str, chunk: Chunk) -> Result<()>;

    /// Atomically replace every chunk of `file_id` with `chunks`.
    /// Returns how many chunks of the prior version were removed.
    async fn replace_file(&self, namespace: &str, file_id: &str, chunks: Vec<Chunk>)
        -> Result<usize>;

    /// Remove all chunks belonging to a file. Returns the removed count.
    async fn delete_file(&self, namespace: &str, file_id: &str) -> Result<usize>;

    /// Remove one chunk. Returns whether it existed.
    async fn delete_chunk(&self, namespace: &str, chunk_id: &Uuid) -> Result<bool>;

    /// Top-k most similar chunks within the namespace
    async fn search(&self, namespace: &str, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Number of chunks stored in the namespace
    async fn len(&self, namespace: &str) -> Result<usize>;

    /// Whether the namespace holds no chunks
    async fn is_empty(&self, namespace: &str) -> Result<bool> {
        Ok(self.len(namespace).await? == 0)
    }

    /// Implementation name for logging
    fn name(&self) -> &str;
}
