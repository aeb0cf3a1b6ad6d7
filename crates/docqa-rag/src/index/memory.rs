//! In-memory vector index
//!
//! Brute-force cosine similarity over per-namespace partitions. Each
//! partition sits behind its own `RwLock`, so file-level replace and
//! delete are atomic with respect to concurrent searches, and writers
//! in different namespaces never contend.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::document::Chunk;

use super::{ScoredChunk, TenantVectorIndex};

#[derive(Default)]
struct Partition {
    /// Keyed by chunk id; BTreeMap iteration order doubles as the
    /// stable tie-break for equal scores.
    chunks: BTreeMap<Uuid, Chunk>,
}

/// In-memory [`TenantVectorIndex`] implementation
#[derive(Default)]
pub struct InMemoryVectorIndex {
    namespaces: DashMap<String, Arc<RwLock<Partition>>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, namespace: &str) -> Arc<RwLock<Partition>> {
        let entry = self.namespaces.entry(namespace.to_string()).or_default();
        Arc::clone(&entry)
    }

    fn existing_partition(&self, namespace: &str) -> Option<Arc<RwLock<Partition>>> {
        self.namespaces.get(namespace).map(|p| Arc::clone(&p))
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[async_trait]
impl TenantVectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, namespace: &str, chunk: Chunk) -> Result<()> {
        if chunk.embedding.is_empty() {
            return Err(Error::vector_index("chunk has no embedding"));
        }
        let partition = self.partition(namespace);
        let mut guard = partition.write();
        guard.chunks.insert(chunk.chunk_id, chunk);
        Ok(())
    }

    async fn replace_file(
        &self,
        namespace: &str,
        file_id: &str,
        chunks: Vec<Chunk>,
    ) -> Result<usize> {
        for chunk in &chunks {
            if chunk.embedding.is_empty() {
                return Err(Error::vector_index("chunk has no embedding"));
            }
        }

        let partition = self.partition(namespace);
        let mut guard = partition.write();

        let before = guard.chunks.len();
        guard.chunks.retain(|_, c| c.file_id != file_id);
        let removed = before - guard.chunks.len();

        for chunk in chunks {
            guard.chunks.insert(chunk.chunk_id, chunk);
        }
        Ok(removed)
    }

    async fn delete_file(&self, namespace: &str, file_id: &str) -> Result<usize> {
        let Some(partition) = self.existing_partition(namespace) else {
            return Ok(0);
        };
        let mut guard = partition.write();
        let before = guard.chunks.len();
        guard.chunks.retain(|_, c| c.file_id != file_id);
        Ok(before - guard.chunks.len())
    }

    async fn delete_chunk(&self, namespace: &str, chunk_id: &Uuid) -> Result<bool> {
        let Some(partition) = self.existing_partition(namespace) else {
            return Ok(false);
        };
        let mut guard = partition.write();
        Ok(guard.chunks.remove(chunk_id).is_some())
    }

    async fn search(&self, namespace: &str, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let Some(partition) = self.existing_partition(namespace) else {
            return Ok(Vec::new());
        };
        let guard = partition.read();

        let mut scored: Vec<ScoredChunk> = guard
            .chunks
            .values()
            .map(|chunk| ScoredChunk {
                similarity: cosine_similarity(query, &chunk.embedding),
                chunk: chunk.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.chunk.chunk_id.cmp(&b.chunk.chunk_id))
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn len(&self, namespace: &str) -> Result<usize> {
        Ok(self
            .existing_partition(namespace)
            .map(|p| p.read().chunks.len())
            .unwrap_or(0))
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::Document;

    fn chunk_with(file_id: &str, text: &str, embedding: Vec<f32>) -> Chunk {
        let doc = Document::new("c1", file_id, format!("{file_id}.txt"), text);
        let mut chunk = Chunk::new(&doc, text.to_string(), 0, text.len(), 0, "m1".into());
        chunk.embedding = embedding;
        chunk
    }

    #[tokio::test]
    async fn search_is_namespace_scoped() {
        let index = InMemoryVectorIndex::new();
        index
            .upsert("ns-a", chunk_with("f1", "alpha", vec![1.0, 0.0]))
            .await
            .unwrap();

        let hits = index.search("ns-b", &[1.0, 0.0], 10).await.unwrap();
        assert!(hits.is_empty());

        let hits = index.search("ns-a", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].similarity - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn equal_scores_tie_break_by_chunk_id() {
        let index = InMemoryVectorIndex::new();
        let a = chunk_with("f1", "one", vec![1.0, 0.0]);
        let b = chunk_with("f1", "two", vec![1.0, 0.0]);
        let c = chunk_with("f1", "three", vec![1.0, 0.0]);
        let mut expected: Vec<Uuid> = vec![a.chunk_id, b.chunk_id, c.chunk_id];
        expected.sort();

        for chunk in [a, b, c] {
            index.upsert("ns", chunk).await.unwrap();
        }

        let hits = index.search("ns", &[1.0, 0.0], 3).await.unwrap();
        let got: Vec<Uuid> = hits.iter().map(|h| h.chunk.chunk_id).collect();
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn replace_file_is_idempotent() {
        let index = InMemoryVectorIndex::new();
        let first = vec![
            chunk_with("f1", "v1 part 1", vec![1.0, 0.0]),
            chunk_with("f1", "v1 part 2", vec![0.0, 1.0]),
        ];
        let removed = index.replace_file("ns", "f1", first).await.unwrap();
        assert_eq!(removed, 0);
        assert_eq!(index.len("ns").await.unwrap(), 2);

        let second = vec![chunk_with("f1", "v2", vec![0.5, 0.5])];
        let removed = index.replace_file("ns", "f1", second).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(index.len("ns").await.unwrap(), 1);

        let hits = index.search("ns", &[0.5, 0.5], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.text, "v2");
    }

    #[tokio::test]
    async fn delete_file_removes_every_chunk() {
        let index = InMemoryVectorIndex::new();
        index
            .upsert("ns", chunk_with("f1", "a", vec![1.0, 0.0]))
            .await
            .unwrap();
        index
            .upsert("ns", chunk_with("f1", "b", vec![0.0, 1.0]))
            .await
            .unwrap();
        index
            .upsert("ns", chunk_with("f2", "c", vec![1.0, 1.0]))
            .await
            .unwrap();

        assert_eq!(index.delete_file("ns", "f1").await.unwrap(), 2);
        assert_eq!(index.len("ns").await.unwrap(), 1);

        let hits = index.search("ns", &[1.0, 0.0], 10).await.unwrap();
        assert!(hits.iter().all(|h| h.chunk.file_id == "f2"));
    }

    #[tokio::test]
    async fn delete_chunk_removes_exactly_one() {
        let index = InMemoryVectorIndex::new();
        let keep = chunk_with("f1", "keep", vec![1.0, 0.0]);
        let drop = chunk_with("f1", "drop", vec![0.0, 1.0]);
        let drop_id = drop.chunk_id;
        index.upsert("ns", keep).await.unwrap();
        index.upsert("ns", drop).await.unwrap();

        assert!(index.delete_chunk("ns", &drop_id).await.unwrap());
        assert!(!index.delete_chunk("ns", &drop_id).await.unwrap());
        assert_eq!(index.len("ns").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upsert_without_embedding_rejected() {
        let index = InMemoryVectorIndex::new();
        let err = index
            .upsert("ns", chunk_with("f1", "no vector", Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VectorIndex(_)));
    }

    #[tokio::test]
    async fn missing_namespace_is_empty_not_error() {
        let index = InMemoryVectorIndex::new();
        assert_eq!(index.len("nowhere").await.unwrap(), 0);
        assert!(index.is_empty("nowhere").await.unwrap());
        assert_eq!(index.delete_file("nowhere", "f1").await.unwrap(), 0);
    }
}
