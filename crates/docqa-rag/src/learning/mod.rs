//! Response caching

pub mod answer_cache;

pub use answer_cache::{AnswerCache, CacheStats, normalize_question};
