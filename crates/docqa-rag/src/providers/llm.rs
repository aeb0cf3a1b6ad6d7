//! LLM provider trait

use async_trait::async_trait;

use crate::error::Result;

/// One completion call, fully resolved from the collection's prompt
/// template before it reaches the provider.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Generates completions.
///
/// Implementations perform a single attempt per call and classify
/// failures as transient or not; retry, timeout, and fallback policy
/// live in the answer generator, defined once for the whole engine.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one completion
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String>;

    /// Whether the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
