//! Document and chunk types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded document after text extraction.
///
/// Documents are never mutated in place: re-uploading a file with the
/// same `file_id` replaces its chunk set wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Caller-assigned stable file identifier
    pub file_id: String,
    /// Owning collection
    pub collection_id: String,
    /// Original filename, surfaced in source attributions
    pub source_name: String,
    /// Extracted plain text
    pub text: String,
    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    /// Create a document stamped with the current time
    pub fn new(
        collection_id: impl Into<String>,
        file_id: impl Into<String>,
        source_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            collection_id: collection_id.into(),
            source_name: source_name.into(),
            text: text.into(),
            uploaded_at: Utc::now(),
        }
    }
}

/// A contiguous slice of a document's text stored with its embedding.
///
/// Chunks are immutable once created and are deleted together with
/// their parent document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub chunk_id: Uuid,
    /// Parent file
    pub file_id: String,
    /// Owning collection
    pub collection_id: String,
    /// Source filename, carried for attribution without a lookup
    pub source_name: String,
    /// Chunk text
    pub text: String,
    /// Byte offset of the chunk start in the document text
    pub offset_start: usize,
    /// Byte offset one past the chunk end
    pub offset_end: usize,
    /// Position of the chunk within its document
    pub chunk_index: u32,
    /// Embedding vector
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
    /// Model the embedding was produced with. A mismatch against the
    /// collection's current model marks the chunk as stale.
    pub embedding_model_id: String,
}

impl Chunk {
    /// Create a chunk without an embedding; the ingestion pipeline
    /// fills `embedding` in after the batch embed call.
    pub fn new(
        document: &Document,
        text: String,
        offset_start: usize,
        offset_end: usize,
        chunk_index: u32,
        embedding_model_id: String,
    ) -> Self {
        Self {
            chunk_id: Uuid::new_v4(),
            file_id: document.file_id.clone(),
            collection_id: document.collection_id.clone(),
            source_name: document.source_name.clone(),
            text,
            offset_start,
            offset_end,
            chunk_index,
            embedding: Vec::new(),
            embedding_model_id,
        }
    }
}
