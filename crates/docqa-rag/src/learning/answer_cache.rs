//! Answer cache keyed by collection and normalized question
//!
//! Memoizes answers for a bounded time so trivially re-phrased repeats
//! of the same question skip the whole pipeline. Expiry is passive,
//! checked on read; stale entries linger until touched, which only ever
//! costs memory, never correctness.
//!
//! The cache is only consulted for history-free questions. A follow-up
//! depends on prior turns, and a history-agnostic key would happily
//! serve it someone else's context.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use crate::types::response::Answer;

/// Trim, lowercase, and collapse internal whitespace so that
/// "  How MANY days? " and "how many days?" share a cache entry.
pub fn normalize_question(question: &str) -> String {
    question
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone)]
struct CachedAnswer {
    answer: Answer,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    hit_count: u32,
}

/// Bounded TTL cache for answers
pub struct AnswerCache {
    entries: RwLock<HashMap<String, CachedAnswer>>,
    /// Reverse index so document changes can drop a collection's entries
    collection_keys: RwLock<HashMap<String, HashSet<String>>>,
    max_entries: usize,
    default_ttl_secs: u64,
}

impl AnswerCache {
    pub fn new(max_entries: usize, default_ttl_secs: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            collection_keys: RwLock::new(HashMap::new()),
            max_entries,
            default_ttl_secs,
        }
    }

    fn key(collection_id: &str, question: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(collection_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(normalize_question(question).as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Look up an answer, expiring it if past its TTL
    pub fn get(&self, collection_id: &str, question: &str) -> Option<Answer> {
        let key = Self::key(collection_id, question);
        let mut entries = self.entries.write();

        let entry = entries.get_mut(&key)?;
        if Utc::now() >= entry.expires_at {
            tracing::debug!(key = %&key[..12], "cache entry expired");
            entries.remove(&key);
            return None;
        }

        entry.hit_count += 1;
        tracing::debug!(key = %&key[..12], hits = entry.hit_count, "cache hit");
        Some(entry.answer.clone())
    }

    /// Store an answer under the default TTL
    pub fn put(&self, collection_id: &str, question: &str, answer: &Answer) {
        self.put_with_ttl(collection_id, question, answer, self.default_ttl_secs);
    }

    /// Store an answer with an explicit TTL in seconds.
    ///
    /// Fallback answers are never cached; the next ask should get a
    /// fresh chance at a real one.
    pub fn put_with_ttl(
        &self,
        collection_id: &str,
        question: &str,
        answer: &Answer,
        ttl_secs: u64,
    ) {
        if answer.is_fallback {
            return;
        }

        let key = Self::key(collection_id, question);
        let now = Utc::now();
        let entry = CachedAnswer {
            answer: answer.clone(),
            cached_at: now,
            expires_at: now + Duration::seconds(ttl_secs as i64),
            hit_count: 0,
        };

        {
            let mut entries = self.entries.write();
            if entries.len() >= self.max_entries && !entries.contains_key(&key) {
                if let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, v)| v.cached_at)
                    .map(|(k, _)| k.clone())
                {
                    entries.remove(&oldest);
                }
            }
            entries.insert(key.clone(), entry);
        }

        let mut collection_keys = self.collection_keys.write();
        collection_keys
            .entry(collection_id.to_string())
            .or_default()
            .insert(key);
    }

    /// Drop every cached answer for a collection. Called when one of
    /// its documents is indexed or removed.
    pub fn invalidate_collection(&self, collection_id: &str) -> usize {
        let keys = {
            let mut collection_keys = self.collection_keys.write();
            collection_keys.remove(collection_id).unwrap_or_default()
        };
        if keys.is_empty() {
            return 0;
        }

        let mut entries = self.entries.write();
        let mut invalidated = 0;
        for key in &keys {
            if entries.remove(key).is_some() {
                invalidated += 1;
            }
        }

        if invalidated > 0 {
            tracing::debug!(collection = collection_id, invalidated, "cache invalidated");
        }
        invalidated
    }

    /// Clear everything
    pub fn clear(&self) {
        self.entries.write().clear();
        self.collection_keys.write().clear();
    }

    /// Cache statistics
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        CacheStats {
            entries: entries.len(),
            total_hits: entries.values().map(|e| e.hit_count).sum(),
            max_entries: self.max_entries,
            default_ttl_secs: self.default_ttl_secs,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_hits: u32,
    pub max_entries: usize,
    pub default_ttl_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::response::AnswerKind;

    fn answer(text: &str) -> Answer {
        Answer {
            answer: text.to_string(),
            sources: vec!["doc.pdf".to_string()],
            is_fallback: false,
            kind: AnswerKind::Grounded,
            chunks_retrieved: 1,
            from_cache: false,
            processing_time_ms: 10,
        }
    }

    #[test]
    fn normalization_collapses_whitespace_and_case() {
        assert_eq!(
            normalize_question("  How   MANY\tdays? "),
            "how many days?"
        );
        assert_eq!(normalize_question("how many days?"), "how many days?");
    }

    #[test]
    fn hit_on_rephrased_question() {
        let cache = AnswerCache::new(10, 3600);
        cache.put("c1", "How many leave days?", &answer("20 days"));

        let hit = cache.get("c1", "  how  many LEAVE days? ").unwrap();
        assert_eq!(hit.answer, "20 days");
    }

    #[test]
    fn keys_are_collection_scoped() {
        let cache = AnswerCache::new(10, 3600);
        cache.put("c1", "question", &answer("for c1"));

        assert!(cache.get("c2", "question").is_none());
        assert!(cache.get("c1", "question").is_some());
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let cache = AnswerCache::new(10, 3600);
        cache.put_with_ttl("c1", "question", &answer("stale"), 0);
        assert!(cache.get("c1", "question").is_none());
    }

    #[test]
    fn fallback_answers_are_not_cached() {
        let cache = AnswerCache::new(10, 3600);
        let mut fallback = answer("sorry");
        fallback.is_fallback = true;
        fallback.kind = AnswerKind::Fallback;

        cache.put("c1", "question", &fallback);
        assert!(cache.get("c1", "question").is_none());
    }

    #[test]
    fn invalidation_drops_only_the_collection() {
        let cache = AnswerCache::new(10, 3600);
        cache.put("c1", "q1", &answer("a1"));
        cache.put("c1", "q2", &answer("a2"));
        cache.put("c2", "q1", &answer("b1"));

        assert_eq!(cache.invalidate_collection("c1"), 2);
        assert!(cache.get("c1", "q1").is_none());
        assert!(cache.get("c2", "q1").is_some());
    }

    #[test]
    fn capacity_evicts_oldest() {
        let cache = AnswerCache::new(2, 3600);
        cache.put("c1", "first", &answer("1"));
        cache.put("c1", "second", &answer("2"));
        cache.put("c1", "third", &answer("3"));

        assert_eq!(cache.stats().entries, 2);
        assert!(cache.get("c1", "third").is_some());
    }
}
