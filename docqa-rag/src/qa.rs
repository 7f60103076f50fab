//! Question-answering orchestrator.
//!
//! The [`QaSystem`] coordinates index building (chunk → embed → store) and
//! question answering (embed → retrieve → map-reduce synthesis) by composing
//! an [`EmbeddingProvider`], a [`VectorIndex`], a [`Chunker`] and a
//! [`LanguageModel`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{QaConfig, QaSystem};
//!
//! let mut qa = QaSystem::builder()
//!     .config(QaConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .language_model(Arc::new(model))
//!     .build()?;
//!
//! qa.ingest(&documents).await?;
//! println!("{}", qa.ask_or_explain("What is the reported F1-score?").await);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::QaConfig;
use crate::document::{Answer, Chunk, Document};
use crate::embedding::EmbeddingProvider;
use crate::error::{QaError, Result};
use crate::index::{IndexedEntry, VectorIndex};
use crate::inmemory::InMemoryVectorIndex;
use crate::llm::LanguageModel;
use crate::prompt::PromptSet;
use crate::service::ServicePolicy;
use crate::synthesizer::MapReduceSynthesizer;

/// Reply given when a question arrives before any document was indexed.
pub const NOT_INITIALIZED: &str = "QA system not initialized.";

/// Number of chunk texts sent to the embedding service per request.
const EMBED_BATCH_SIZE: usize = 32;

/// Summary of an [`QaSystem::ingest`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Documents that produced at least one chunk.
    pub document_count: usize,
    /// Chunks added to the index.
    pub chunk_count: usize,
    /// Ids of documents that produced no chunks.
    pub skipped: Vec<String>,
}

/// The question-answering façade.
///
/// Indexing takes `&mut self` and answering takes `&self`, so the index is
/// always fully built before a question is served.
pub struct QaSystem {
    config: QaConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    language_model: Arc<dyn LanguageModel>,
    vector_index: Arc<dyn VectorIndex>,
    chunker: Arc<dyn Chunker>,
    synthesizer: MapReduceSynthesizer,
    policy: ServicePolicy,
}

impl QaSystem {
    /// Create a new [`QaSystemBuilder`].
    pub fn builder() -> QaSystemBuilder {
        QaSystemBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &QaConfig {
        &self.config
    }

    /// Return a reference to the vector index.
    pub fn vector_index(&self) -> &Arc<dyn VectorIndex> {
        &self.vector_index
    }

    /// Chunk, embed and index `documents`.
    ///
    /// Chunks are added in document order, then chunk order, in a single
    /// atomic index update. Documents without text are skipped. If no chunk
    /// is produced at all the index stays unbuilt.
    ///
    /// # Errors
    ///
    /// Returns an embedding service error or a [`QaError::VectorIndex`]
    /// error; the index is unchanged in that case.
    pub async fn ingest(&mut self, documents: &[Document]) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut chunks: Vec<Chunk> = Vec::new();

        for document in documents {
            let document_chunks = self.chunker.chunk(document);
            if document_chunks.is_empty() {
                warn!(document.id = %document.id, "document produced no chunks");
                report.skipped.push(document.id.clone());
                continue;
            }
            info!(document.id = %document.id, chunk_count = document_chunks.len(), "chunked document");
            report.document_count += 1;
            chunks.extend(document_chunks);
        }

        if chunks.is_empty() {
            warn!("no chunks to index");
            return Ok(report);
        }

        let embeddings = self.embed_chunks(&chunks).await?;
        let entries: Vec<IndexedEntry> =
            chunks.into_iter().zip(embeddings).map(|(c, e)| IndexedEntry::new(c, e)).collect();
        report.chunk_count = entries.len();

        self.vector_index.add(entries).await.map_err(|e| {
            error!(error = %e, "failed to build vector index");
            e
        })?;

        info!(
            document_count = report.document_count,
            chunk_count = report.chunk_count,
            "vector index built"
        );
        Ok(report)
    }

    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let provider = &self.embedding_provider;
        let mut embeddings = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let texts = texts.as_slice();
            let vectors = self
                .policy
                .call("embedding", move || provider.embed_batch(texts))
                .await
                .map_err(|e| {
                    error!(error = %e, "embedding failed during ingestion");
                    e
                })?;
            if vectors.len() != batch.len() {
                return Err(QaError::service(
                    "embedding",
                    format!("expected {} embeddings, got {}", batch.len(), vectors.len()),
                ));
            }
            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }

    /// Answer a question from the indexed documents.
    ///
    /// # Errors
    ///
    /// - [`QaError::IndexUnavailable`] if nothing has been indexed yet
    /// - embedding or language model errors, including timeouts
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        if !self.vector_index.is_built().await {
            return Err(QaError::IndexUnavailable);
        }

        let provider = &self.embedding_provider;
        let query_embedding =
            self.policy.call("embedding", move || provider.embed(question)).await?;

        let results = self.vector_index.query(&query_embedding, self.config.top_k).await?;
        debug!(
            scores = ?results.iter().map(|r| r.score).collect::<Vec<_>>(),
            "retrieved chunks"
        );
        let chunks: Vec<Chunk> = results.into_iter().map(|r| r.chunk).collect();

        let answer = self.synthesizer.synthesize(question, &chunks).await?;
        info!(source_count = answer.sources.len(), "question answered");
        Ok(answer)
    }

    /// Answer a question, turning any failure into a displayable message.
    ///
    /// Never fails: an unbuilt index yields [`NOT_INITIALIZED`] and any other
    /// error yields a message starting with `"An error occurred"`.
    pub async fn ask_or_explain(&self, question: &str) -> String {
        match self.ask(question).await {
            Ok(answer) => answer.text,
            Err(e) => {
                error!(error = %e, "question failed");
                explain_error(&e)
            }
        }
    }

    /// Release the model services.
    pub async fn shutdown(self) -> Result<()> {
        info!("shutting down QA system");
        self.embedding_provider.shutdown().await?;
        self.language_model.shutdown().await
    }
}

/// Render an error from [`QaSystem::ask`] for display to a user.
pub fn explain_error(error: &QaError) -> String {
    match error {
        QaError::IndexUnavailable => NOT_INITIALIZED.to_string(),
        other => format!("An error occurred: {other}"),
    }
}

/// Builder for constructing a [`QaSystem`].
///
/// The embedding provider and language model are required. The index
/// defaults to an [`InMemoryVectorIndex`], the chunker to a
/// [`RecursiveChunker`] using the configured sizes, and the config to
/// [`QaConfig::default()`].
#[derive(Default)]
pub struct QaSystemBuilder {
    config: Option<QaConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    language_model: Option<Arc<dyn LanguageModel>>,
    vector_index: Option<Arc<dyn VectorIndex>>,
    chunker: Option<Arc<dyn Chunker>>,
    prompts: Option<PromptSet>,
}

impl QaSystemBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: QaConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the language model.
    pub fn language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(model);
        self
    }

    /// Set the vector index backend.
    pub fn vector_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.vector_index = Some(index);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Replace the built-in map and reduce prompts.
    pub fn prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = Some(prompts);
        self
    }

    /// Build the [`QaSystem`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Config`] if a required field is missing.
    pub fn build(self) -> Result<QaSystem> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| QaError::Config("embedding_provider is required".to_string()))?;
        let language_model = self
            .language_model
            .ok_or_else(|| QaError::Config("language_model is required".to_string()))?;
        let vector_index =
            self.vector_index.unwrap_or_else(|| Arc::new(InMemoryVectorIndex::new()));
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap))
        });

        let mut synthesizer = MapReduceSynthesizer::new(Arc::clone(&language_model), &config);
        if let Some(prompts) = self.prompts {
            synthesizer = synthesizer.with_prompts(prompts);
        }

        Ok(QaSystem {
            policy: ServicePolicy::from(&config),
            config,
            embedding_provider,
            language_model,
            vector_index,
            chunker,
            synthesizer,
        })
    }
}
