//! Tenant registry: collection resolution and prompt templates
//!
//! Every request starts by resolving its collection into one immutable
//! [`CollectionConfig`] value. Components downstream only ever see that
//! resolved value, so the embedding model, namespace, and template
//! cannot drift apart within a single request.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default system prompt used when a collection configures none
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a document assistant. Answer using only the \
     provided context. If the context does not contain the answer, say that the information is \
     not available in the documents.";

/// Per-collection prompt configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// System prompt sent on every completion
    pub system_prompt: String,
    /// User prompt with `{query}` and `{context}` placeholders. When
    /// absent, a structural default keeps retrieved text clearly
    /// separated from the live question.
    pub user_prompt_template: Option<String>,
    /// Rendering of one retrieved chunk, with `{source}` and `{text}`
    /// placeholders. The default includes the source filename.
    pub context_template: Option<String>,
    /// Model to generate with
    pub model_name: String,
    /// Completion token budget
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Whether this is the collection's default template. Exactly one
    /// default per collection, enforced when templates are written.
    pub is_default: bool,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_prompt_template: None,
            context_template: None,
            model_name: "phi3".to_string(),
            max_tokens: 1024,
            temperature: 0.3,
            is_default: true,
        }
    }
}

/// Resolved, immutable view of one collection.
///
/// Fetched once per request; never re-derived at component boundaries.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Stable collection identifier
    pub collection_id: String,
    /// Partition of the vector index this collection writes and reads.
    /// Mandatory everywhere; never inferred.
    pub vector_namespace: String,
    /// Embedding model chunks and queries of this collection must use
    pub embedding_model_id: String,
    /// The collection's default prompt template
    pub prompt_template: PromptTemplate,
}

/// Resolves collection ids into [`CollectionConfig`] values
#[async_trait]
pub trait TenantRegistry: Send + Sync {
    /// Resolve a collection or fail with [`Error::CollectionNotFound`]
    async fn resolve(&self, collection_id: &str) -> Result<CollectionConfig>;
}

struct CollectionEntry {
    vector_namespace: String,
    embedding_model_id: String,
    templates: Vec<PromptTemplate>,
}

/// In-memory registry, suitable for embedding into a host process that
/// loads tenant configuration at startup.
#[derive(Default)]
pub struct InMemoryRegistry {
    collections: RwLock<HashMap<String, CollectionEntry>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection with its namespace and embedding model
    pub fn add_collection(
        &self,
        collection_id: impl Into<String>,
        vector_namespace: impl Into<String>,
        embedding_model_id: impl Into<String>,
    ) {
        let mut collections = self.collections.write();
        collections.insert(
            collection_id.into(),
            CollectionEntry {
                vector_namespace: vector_namespace.into(),
                embedding_model_id: embedding_model_id.into(),
                templates: Vec::new(),
            },
        );
    }

    /// Attach a prompt template to a collection.
    ///
    /// When the new template is marked default, the default flag is
    /// cleared on every previously registered template, keeping the
    /// one-default-per-collection invariant at write time.
    pub fn register_template(
        &self,
        collection_id: &str,
        template: PromptTemplate,
    ) -> Result<()> {
        let mut collections = self.collections.write();
        let entry = collections
            .get_mut(collection_id)
            .ok_or_else(|| Error::CollectionNotFound(collection_id.to_string()))?;

        if template.is_default {
            for existing in &mut entry.templates {
                existing.is_default = false;
            }
        }
        entry.templates.push(template);
        Ok(())
    }
}

#[async_trait]
impl TenantRegistry for InMemoryRegistry {
    async fn resolve(&self, collection_id: &str) -> Result<CollectionConfig> {
        let collections = self.collections.read();
        let entry = collections
            .get(collection_id)
            .ok_or_else(|| Error::CollectionNotFound(collection_id.to_string()))?;

        let prompt_template = entry
            .templates
            .iter()
            .find(|t| t.is_default)
            .cloned()
            .unwrap_or_default();

        Ok(CollectionConfig {
            collection_id: collection_id.to_string(),
            vector_namespace: entry.vector_namespace.clone(),
            embedding_model_id: entry.embedding_model_id.clone(),
            prompt_template,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(model: &str, is_default: bool) -> PromptTemplate {
        PromptTemplate {
            model_name: model.to_string(),
            is_default,
            ..PromptTemplate::default()
        }
    }

    #[tokio::test]
    async fn resolve_unknown_collection() {
        let registry = InMemoryRegistry::new();
        let err = registry.resolve("missing").await.unwrap_err();
        assert!(matches!(err, Error::CollectionNotFound(_)));
    }

    #[tokio::test]
    async fn resolve_falls_back_to_global_default_template() {
        let registry = InMemoryRegistry::new();
        registry.add_collection("c1", "ns-c1", "nomic-embed-text");

        let config = registry.resolve("c1").await.unwrap();
        assert_eq!(config.vector_namespace, "ns-c1");
        assert_eq!(config.prompt_template.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn single_default_template_enforced_at_write_time() {
        let registry = InMemoryRegistry::new();
        registry.add_collection("c1", "ns-c1", "nomic-embed-text");

        registry
            .register_template("c1", template("first", true))
            .unwrap();
        registry
            .register_template("c1", template("second", true))
            .unwrap();

        let config = registry.resolve("c1").await.unwrap();
        assert_eq!(config.prompt_template.model_name, "second");

        // The old default was demoted, not duplicated
        let collections = registry.collections.read();
        let defaults = collections["c1"]
            .templates
            .iter()
            .filter(|t| t.is_default)
            .count();
        assert_eq!(defaults, 1);
    }

    #[tokio::test]
    async fn template_for_unknown_collection_rejected() {
        let registry = InMemoryRegistry::new();
        let err = registry
            .register_template("nope", template("m", true))
            .unwrap_err();
        assert!(matches!(err, Error::CollectionNotFound(_)));
    }
}
