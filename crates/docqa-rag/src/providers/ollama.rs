//! Ollama-backed embedding and completion provider
//!
//! One HTTP client serves both roles. Each call is a single attempt;
//! errors are classified as transient or permanent so the answer
//! generator can apply the engine-wide retry policy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{CompletionRequest, LlmProvider};

/// Ollama API client
pub struct OllamaClient {
    http: Client,
    base_url: String,
    embed_model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: i32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    /// Create a new client
    pub fn new(config: &LlmConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: config.base_url.clone(),
            embed_model: config.embed_model.clone(),
            dimensions: config.embed_dimensions,
        }
    }

    /// Rate limits, server overload, and timeouts are worth one more
    /// attempt; client-side mistakes are not.
    fn status_is_transient(status: StatusCode) -> bool {
        status.is_server_error()
            || status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::REQUEST_TIMEOUT
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbedRequest {
            model: &self.embed_model,
            prompt: text,
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::embedding_transient(format!("embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = format!("embedding failed: HTTP {status}");
            return Err(if Self::status_is_transient(status) {
                Error::embedding_transient(message)
            } else {
                Error::embedding(message)
            });
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("bad embedding response: {e}")))?;

        Ok(parsed.embedding)
    }

    fn model_id(&self) -> &str {
        &self.embed_model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[async_trait]
impl LlmProvider for OllamaClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: request.model,
            prompt: request.user_prompt,
            system: request.system_prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens as i32,
            },
        };

        tracing::debug!(model = request.model, "requesting completion");

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::llm_transient(format!("generation request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let message = format!("generation failed: HTTP {status} {detail}");
            return Err(if Self::status_is_transient(status) {
                Error::llm_transient(message)
            } else {
                Error::llm(message)
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("bad generation response: {e}")))?;

        Ok(parsed.response)
    }

    async fn health_check(&self) -> Result<bool> {
        EmbeddingProvider::health_check(self).await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
