//! # docqa-rag
//!
//! Retrieval-augmented question answering over a local document collection.
//!
//! ## Overview
//!
//! Documents are split into overlapping chunks, embedded, and stored in a
//! vector index. A question is embedded, the closest chunks are retrieved,
//! and a language model answers in two steps:
//!
//! 1. **map**: one partial answer per retrieved chunk, run concurrently
//! 2. **reduce**: one final answer synthesized from the partial answers,
//!    combined in retrieval rank order
//!
//! The embedding model and language model are traits ([`EmbeddingProvider`],
//! [`LanguageModel`]); concrete HTTP adapters live in `docqa-model`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{Document, QaConfig, QaSystem};
//!
//! let mut qa = QaSystem::builder()
//!     .config(QaConfig::builder().chunk_size(600).chunk_overlap(100).top_k(2).build()?)
//!     .embedding_provider(Arc::new(embedder))
//!     .language_model(Arc::new(model))
//!     .build()?;
//!
//! qa.ingest(&[Document::new("paper.pdf", text)]).await?;
//! let answer = qa.ask("What is the reported F1-score?").await?;
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod inmemory;
pub mod llm;
pub mod prompt;
pub mod qa;
pub mod service;
pub mod source;
pub mod synthesizer;

pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker, split_text};
pub use config::{QaConfig, QaConfigBuilder, RetryPolicy};
pub use document::{Answer, Chunk, Document, SearchResult, SourceRef};
pub use embedding::EmbeddingProvider;
pub use error::{QaError, Result};
pub use index::{IndexedEntry, VectorIndex};
pub use inmemory::InMemoryVectorIndex;
pub use llm::{GenerationParams, LanguageModel};
pub use prompt::{NOT_FOUND, PromptSet, PromptTemplate};
pub use qa::{IngestReport, NOT_INITIALIZED, QaSystem, QaSystemBuilder, explain_error};
pub use service::ServicePolicy;
pub use source::{LoadReport, PlainTextExtractor, TextExtractor, discover_documents, load_documents};
pub use synthesizer::MapReduceSynthesizer;
