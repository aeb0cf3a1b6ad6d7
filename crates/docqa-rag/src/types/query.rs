//! Ask-path request type

use serde::{Deserialize, Serialize};

use super::conversation::ConversationTurn;

/// A question against a collection.
///
/// The engine is stateless between calls: conversation history travels
/// with every request, and `session_id` exists only for log
/// correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// Target collection
    pub collection_id: String,
    /// The question to answer
    pub question: String,
    /// Caller-side session identifier, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Prior turns, oldest first, in the order the caller recorded them
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    /// Override for the configured retrieval depth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
}

impl AskRequest {
    pub fn new(collection_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            question: question.into(),
            session_id: None,
            history: Vec::new(),
            top_k: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }
}
