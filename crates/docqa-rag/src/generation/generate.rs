//! Answer generation with timeout, retry, and fallback
//!
//! The single place where provider retry policy lives. Each LLM call
//! runs under a hard deadline; a transient failure earns a bounded
//! number of retries with backoff, and exhausting them degrades to a
//! fixed fallback notice instead of surfacing a provider error to the
//! chat user. Non-transient failures propagate so misconfiguration is
//! not hidden behind an apology.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::{CompletionRequest, LlmProvider};
use crate::registry::PromptTemplate;

use super::assemble::AssembledPrompt;

/// Answer text returned when the provider cannot be reached. Fixed and
/// clearly marked so it can never be mistaken for generated content.
pub const FALLBACK_ANSWER: &str = "I'm sorry, I couldn't generate an answer right now. \
     Please try again in a moment.";

/// Result of one generation attempt chain
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    /// The provider produced an answer
    Answered(String),
    /// Retries exhausted on transient failures; serve the fixed notice
    Fallback { reason: String },
}

/// Generation stage of the ask path
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
    config: LlmConfig,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: LlmConfig) -> Self {
        Self { llm, config }
    }

    /// Run the completion for an assembled prompt.
    ///
    /// Returns `Err` only for non-transient provider errors; every
    /// transient path ends in [`GenerationOutcome::Fallback`].
    pub async fn generate(
        &self,
        prompt: &AssembledPrompt,
        template: &PromptTemplate,
    ) -> Result<GenerationOutcome> {
        let deadline = Duration::from_secs(self.config.request_timeout_secs);
        let seconds = self.config.request_timeout_secs;

        let result = retry_transient(self.config.max_retries, self.config.retry_backoff_ms, || {
            let request = CompletionRequest {
                system_prompt: &prompt.system,
                user_prompt: &prompt.user,
                model: &template.model_name,
                max_tokens: template.max_tokens,
                temperature: template.temperature,
            };
            let llm = Arc::clone(&self.llm);
            async move {
                match timeout(deadline, llm.complete(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout {
                        operation: "llm completion",
                        seconds,
                    }),
                }
            }
        })
        .await;

        match result {
            Ok(text) => Ok(GenerationOutcome::Answered(text)),
            Err(e) if e.is_transient() => {
                tracing::warn!(error = %e, "generation degraded to fallback");
                Ok(GenerationOutcome::Fallback {
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// Run `op`, retrying transient failures up to `max_retries` times with
/// linear backoff. Non-transient errors return immediately.
pub(crate) async fn retry_transient<T, F, Fut>(
    max_retries: u32,
    backoff_ms: u64,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_retries => {
                attempt += 1;
                let delay = Duration::from_millis(backoff_ms * u64::from(attempt));
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_retries,
                    "transient failure, retrying after {delay:?}"
                );
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
