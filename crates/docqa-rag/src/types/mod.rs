//! Core types for the RAG engine

pub mod conversation;
pub mod document;
pub mod query;
pub mod response;

pub use conversation::{ConversationTurn, Role};
pub use document::{Chunk, Document};
pub use query::AskRequest;
pub use response::{Answer, AnswerKind, IndexOutcome, RequestPhase};
