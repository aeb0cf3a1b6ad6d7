//! Answer types and the per-request state machine

use serde::{Deserialize, Serialize};

/// How an answer came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// Generated from retrieved context
    Grounded,
    /// Generated, but no relevant context was found
    NoContext,
    /// The provider could not be reached; the answer is a fixed notice
    Fallback,
}

/// Answer returned to the caller.
///
/// Always well formed: provider failures surface as `is_fallback =
/// true` with an explicit notice, never as a raw error or an empty
/// body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text
    pub answer: String,
    /// Source filenames of the chunks included in context,
    /// de-duplicated, in order of first appearance
    pub sources: Vec<String>,
    /// True when the provider could not produce an answer
    pub is_fallback: bool,
    /// Finer-grained outcome than `is_fallback` alone
    pub kind: AnswerKind,
    /// Number of chunks that survived retrieval filtering
    pub chunks_retrieved: usize,
    /// Whether the answer was served from the response cache
    pub from_cache: bool,
    /// Wall-clock time spent on this request
    pub processing_time_ms: u64,
}

/// Lifecycle of one ask request.
///
/// Transient provider trouble ends in `Fallback`; `Failed` is reserved
/// for caller and configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Pending,
    Embedding,
    Retrieving,
    Assembling,
    Generating,
    Succeeded,
    Fallback,
    Failed,
}

impl RequestPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Embedding => "embedding",
            Self::Retrieving => "retrieving",
            Self::Assembling => "assembling",
            Self::Generating => "generating",
            Self::Succeeded => "succeeded",
            Self::Fallback => "fallback",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of one document ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexOutcome {
    /// File that was indexed
    pub file_id: String,
    /// Chunks written for this version of the file
    pub chunks_indexed: usize,
    /// Chunks of a prior version that were replaced
    pub chunks_replaced: usize,
}
