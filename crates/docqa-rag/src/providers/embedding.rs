//! Embedding provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Maps text to fixed-length dense vectors.
///
/// Chunks at ingestion time and questions at ask time must go through
/// the same model for similarity to mean anything; `model_id` exists so
/// callers can check a collection's configured model against both this
/// provider and a chunk's stored `embedding_model_id`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts.
    ///
    /// The default calls `embed` sequentially; implementations with a
    /// real batch endpoint should override this for throughput.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Identifier of the model producing these vectors
    fn model_id(&self) -> &str;

    /// Output vector length
    fn dimensions(&self) -> usize;

    /// Whether the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
