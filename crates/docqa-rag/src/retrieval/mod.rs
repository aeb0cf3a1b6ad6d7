//! Tenant-scoped retrieval
//!
//! Embeds a question and searches the collection's namespace, applying
//! the similarity floor and dropping chunks whose embeddings were
//! produced by a model other than the collection's current one.

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::index::{ScoredChunk, TenantVectorIndex};
use crate::providers::EmbeddingProvider;
use crate::registry::CollectionConfig;

/// Retrieval stage of the ask path
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn TenantVectorIndex>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn TenantVectorIndex>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    /// Retrieve the chunks most similar to `question` within the
    /// collection's namespace.
    ///
    /// An empty result means "no relevant context found" and is a valid
    /// outcome, not an error. Embedding failures propagate; they are
    /// never papered over with an empty query vector.
    pub async fn retrieve(
        &self,
        collection: &CollectionConfig,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if self.embedder.model_id() != collection.embedding_model_id {
            return Err(Error::config(format!(
                "collection '{}' expects embedding model '{}' but provider serves '{}'",
                collection.collection_id,
                collection.embedding_model_id,
                self.embedder.model_id(),
            )));
        }

        let query = self.embedder.embed(question).await?;

        let mut hits = self
            .index
            .search(&collection.vector_namespace, &query, top_k)
            .await?;

        hits.retain(|hit| hit.similarity >= self.config.min_similarity);

        // Chunks written with an older embedding model are stale and
        // would score nonsense against the current query vector.
        hits.retain(|hit| {
            let current = hit.chunk.embedding_model_id == collection.embedding_model_id;
            if !current {
                tracing::warn!(
                    chunk_id = %hit.chunk.chunk_id,
                    file_id = %hit.chunk.file_id,
                    stored_model = %hit.chunk.embedding_model_id,
                    "dropping stale chunk, re-index its file"
                );
            }
            current
        });

        tracing::debug!(
            collection = %collection.collection_id,
            hits = hits.len(),
            "retrieval complete"
        );

        Ok(hits)
    }
}
