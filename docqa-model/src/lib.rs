//! # docqa-model
//!
//! HTTP adapters implementing the `docqa-rag` model traits.
//!
//! | Adapter | Trait | Backend |
//! |---------|-------|---------|
//! | [`HuggingFaceEmbeddingProvider`] | `EmbeddingProvider` | Inference API feature extraction |
//! | [`HuggingFaceTextGenerator`] | `LanguageModel` | Inference API text generation |
//! | [`OpenAIEmbeddingProvider`] | `EmbeddingProvider` | `/v1/embeddings` |
//! | [`OpenAIChatModel`] | `LanguageModel` | `/v1/chat/completions` |
//!
//! Failed or rejected requests surface as `QaError::Service`, and requests
//! exceeding a configured `with_timeout` as `QaError::ServiceTimeout`.

mod http;
pub mod huggingface;
pub mod openai;

pub use huggingface::{GenerationTask, HuggingFaceEmbeddingProvider, HuggingFaceTextGenerator};
pub use openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
