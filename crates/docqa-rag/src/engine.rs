//! RAG engine facade
//!
//! The two write operations and the single read path the surrounding
//! service calls into. The engine is stateless between calls: sessions
//! live with the caller, and every request resolves its collection into
//! one immutable config value before any work happens.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::{
    generate::retry_transient, AnswerGenerator, ContextAssembler, GenerationOutcome,
    FALLBACK_ANSWER,
};
use crate::index::{ScoredChunk, TenantVectorIndex};
use crate::ingestion::TextChunker;
use crate::learning::AnswerCache;
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::registry::{CollectionConfig, TenantRegistry};
use crate::retrieval::Retriever;
use crate::types::document::{Chunk, Document};
use crate::types::query::AskRequest;
use crate::types::response::{Answer, AnswerKind, IndexOutcome, RequestPhase};

/// Document question answering engine
pub struct RagEngine {
    registry: Arc<dyn TenantRegistry>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn TenantVectorIndex>,
    chunker: TextChunker,
    retriever: Retriever,
    assembler: ContextAssembler,
    generator: AnswerGenerator,
    cache: Option<AnswerCache>,
    config: RagConfig,
}

impl RagEngine {
    /// Wire up an engine from its collaborators and configuration
    pub fn new(
        registry: Arc<dyn TenantRegistry>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn TenantVectorIndex>,
        llm: Arc<dyn LlmProvider>,
        config: RagConfig,
    ) -> Self {
        let chunker = TextChunker::from_config(&config.chunking);
        let retriever = Retriever::new(
            Arc::clone(&embedder),
            Arc::clone(&index),
            config.retrieval.clone(),
        );
        let assembler = ContextAssembler::from_config(&config.context);
        let generator = AnswerGenerator::new(llm, config.llm.clone());
        let cache = config
            .cache
            .enabled
            .then(|| AnswerCache::new(config.cache.max_entries, config.cache.ttl_secs));

        Self {
            registry,
            embedder,
            index,
            chunker,
            retriever,
            assembler,
            generator,
            cache,
            config,
        }
    }

    /// Index a document's extracted text into its collection.
    ///
    /// Idempotent per `file_id`: the file's previous chunk set is
    /// replaced in one atomic step, so re-uploads never leave a mix of
    /// old and new chunks visible to a concurrent search.
    pub async fn index_document(
        &self,
        collection_id: &str,
        file_id: &str,
        source_name: &str,
        text: &str,
    ) -> Result<IndexOutcome> {
        if file_id.trim().is_empty() {
            return Err(Error::validation("file_id must not be empty"));
        }

        let collection = self.registry.resolve(collection_id).await?;
        self.check_embedding_model(&collection)?;

        let document = Document::new(collection_id, file_id, source_name, text);
        let slices = self.chunker.chunk(&document.text);

        tracing::info!(
            collection = collection_id,
            file_id,
            chunks = slices.len(),
            "indexing document"
        );

        let texts: Vec<String> = slices.iter().map(|s| s.text.clone()).collect();
        let vectors = self.embedder.embed_many(&texts).await?;
        if vectors.len() != slices.len() {
            return Err(Error::embedding(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                slices.len()
            )));
        }

        let chunks: Vec<Chunk> = slices
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (slice, vector))| {
                let mut chunk = Chunk::new(
                    &document,
                    slice.text,
                    slice.offset_start,
                    slice.offset_end,
                    i as u32,
                    collection.embedding_model_id.clone(),
                );
                chunk.embedding = vector;
                chunk
            })
            .collect();

        let chunks_indexed = chunks.len();
        let chunks_replaced = self
            .index
            .replace_file(&collection.vector_namespace, file_id, chunks)
            .await?;

        if let Some(cache) = &self.cache {
            cache.invalidate_collection(collection_id);
        }

        Ok(IndexOutcome {
            file_id: file_id.to_string(),
            chunks_indexed,
            chunks_replaced,
        })
    }

    /// Remove every chunk of a document from its collection
    pub async fn remove_document(&self, collection_id: &str, file_id: &str) -> Result<usize> {
        let collection = self.registry.resolve(collection_id).await?;
        let removed = self
            .index
            .delete_file(&collection.vector_namespace, file_id)
            .await?;

        if let Some(cache) = &self.cache {
            cache.invalidate_collection(collection_id);
        }

        tracing::info!(collection = collection_id, file_id, removed, "document removed");
        Ok(removed)
    }

    /// Answer a question against a collection.
    ///
    /// Always returns a well-formed [`Answer`] unless the request
    /// itself is at fault: transient provider trouble degrades to a
    /// fallback answer, never to an error.
    pub async fn ask(&self, request: AskRequest) -> Result<Answer> {
        let start = Instant::now();
        self.trace_phase(&request, RequestPhase::Pending);

        if request.question.trim().is_empty() {
            self.trace_phase(&request, RequestPhase::Failed);
            return Err(Error::validation("question must not be empty"));
        }

        let collection = match self.registry.resolve(&request.collection_id).await {
            Ok(collection) => collection,
            Err(e) => {
                self.trace_phase(&request, RequestPhase::Failed);
                return Err(e);
            }
        };

        // Follow-ups depend on prior turns; only history-free questions
        // may be served from the history-agnostic cache.
        let cacheable = request.history.iter().all(|t| t.is_blank());
        if cacheable {
            if let Some(cache) = &self.cache {
                if let Some(mut answer) = cache.get(&request.collection_id, &request.question) {
                    answer.from_cache = true;
                    answer.processing_time_ms = start.elapsed().as_millis() as u64;
                    self.trace_phase(&request, RequestPhase::Succeeded);
                    return Ok(answer);
                }
            }
        }

        self.trace_phase(&request, RequestPhase::Embedding);
        self.trace_phase(&request, RequestPhase::Retrieving);
        let (hits, answer) = match self.retrieve_degradable(&collection, &request).await? {
            RetrievalResult::Hits(hits) => {
                self.trace_phase(&request, RequestPhase::Assembling);
                let prompt = self.assembler.assemble(
                    &collection.prompt_template,
                    &request.question,
                    &request.history,
                    &hits,
                );

                self.trace_phase(&request, RequestPhase::Generating);
                let outcome = match self
                    .generator
                    .generate(&prompt, &collection.prompt_template)
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        self.trace_phase(&request, RequestPhase::Failed);
                        return Err(e);
                    }
                };

                let answer = match outcome {
                    GenerationOutcome::Answered(text) => Answer {
                        answer: text,
                        sources: prompt.source_refs,
                        is_fallback: false,
                        kind: if hits.is_empty() {
                            AnswerKind::NoContext
                        } else {
                            AnswerKind::Grounded
                        },
                        chunks_retrieved: hits.len(),
                        from_cache: false,
                        processing_time_ms: 0,
                    },
                    GenerationOutcome::Fallback { reason } => {
                        tracing::warn!(reason = %reason, "serving fallback answer");
                        Answer {
                            answer: FALLBACK_ANSWER.to_string(),
                            sources: prompt.source_refs,
                            is_fallback: true,
                            kind: AnswerKind::Fallback,
                            chunks_retrieved: hits.len(),
                            from_cache: false,
                            processing_time_ms: 0,
                        }
                    }
                };
                (hits, answer)
            }
            RetrievalResult::ProviderDown(reason) => {
                tracing::warn!(reason = %reason, "retrieval unavailable, serving fallback answer");
                let answer = Answer {
                    answer: FALLBACK_ANSWER.to_string(),
                    sources: Vec::new(),
                    is_fallback: true,
                    kind: AnswerKind::Fallback,
                    chunks_retrieved: 0,
                    from_cache: false,
                    processing_time_ms: 0,
                };
                (Vec::new(), answer)
            }
        };

        let mut answer = answer;
        answer.processing_time_ms = start.elapsed().as_millis() as u64;

        if cacheable && !answer.is_fallback {
            if let Some(cache) = &self.cache {
                cache.put(&request.collection_id, &request.question, &answer);
            }
        }

        self.trace_phase(
            &request,
            if answer.is_fallback {
                RequestPhase::Fallback
            } else {
                RequestPhase::Succeeded
            },
        );
        tracing::info!(
            collection = %request.collection_id,
            chunks = hits.len(),
            fallback = answer.is_fallback,
            elapsed_ms = answer.processing_time_ms,
            "ask complete"
        );

        Ok(answer)
    }

    /// Retrieval with the engine-wide transient-retry policy applied.
    ///
    /// A retrieval deadline degrades to empty context so generation can
    /// still produce something; any other exhausted provider failure
    /// means the whole read path is down and the caller gets the
    /// fallback answer. Caller errors propagate untouched.
    async fn retrieve_degradable(
        &self,
        collection: &CollectionConfig,
        request: &AskRequest,
    ) -> Result<RetrievalResult> {
        let deadline = Duration::from_secs(self.config.retrieval.timeout_secs);
        let seconds = self.config.retrieval.timeout_secs;
        let top_k = request.top_k.unwrap_or(self.config.retrieval.top_k);

        let result = retry_transient(
            self.config.llm.max_retries,
            self.config.llm.retry_backoff_ms,
            || {
                let fut = self
                    .retriever
                    .retrieve(collection, &request.question, top_k);
                async move {
                    match timeout(deadline, fut).await {
                        Ok(result) => result,
                        Err(_) => Err(Error::Timeout {
                            operation: "retrieval",
                            seconds,
                        }),
                    }
                }
            },
        )
        .await;

        match result {
            Ok(hits) => Ok(RetrievalResult::Hits(hits)),
            Err(Error::Timeout { .. }) => {
                tracing::warn!("retrieval timed out, degrading to empty context");
                Ok(RetrievalResult::Hits(Vec::new()))
            }
            Err(e) if e.is_caller_error() => Err(e),
            Err(e) => Ok(RetrievalResult::ProviderDown(e.to_string())),
        }
    }

    fn check_embedding_model(&self, collection: &CollectionConfig) -> Result<()> {
        if self.embedder.model_id() != collection.embedding_model_id {
            return Err(Error::config(format!(
                "collection '{}' expects embedding model '{}' but provider serves '{}'",
                collection.collection_id,
                collection.embedding_model_id,
                self.embedder.model_id(),
            )));
        }
        Ok(())
    }

    fn trace_phase(&self, request: &AskRequest, phase: RequestPhase) {
        tracing::debug!(
            collection = %request.collection_id,
            session = request.session_id.as_deref().unwrap_or("-"),
            phase = phase.as_str(),
            "request phase"
        );
    }

    /// The response cache, when enabled
    pub fn cache(&self) -> Option<&AnswerCache> {
        self.cache.as_ref()
    }
}

enum RetrievalResult {
    Hits(Vec<ScoredChunk>),
    ProviderDown(String),
}
