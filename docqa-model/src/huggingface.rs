//! Hugging Face Inference API adapters.
//!
//! [`HuggingFaceEmbeddingProvider`] calls the feature-extraction pipeline and
//! [`HuggingFaceTextGenerator`] calls the model endpoint of a text2text or
//! text-generation model. Both authenticate with a user access token.

use std::time::Duration;

use async_trait::async_trait;
use docqa_rag::{EmbeddingProvider, GenerationParams, LanguageModel, QaError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::{JsonClient, join_url};

/// Environment variable holding the Hugging Face access token.
pub const TOKEN_ENV: &str = "HUGGINGFACEHUB_API_TOKEN";

/// The public Inference API.
pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// The default sentence embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Output size of `all-MiniLM-L6-v2`.
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;

/// The default generation model.
pub const DEFAULT_GENERATION_MODEL: &str = "google/flan-t5-large";

const SERVICE: &str = "Hugging Face";

fn read_token() -> Result<String> {
    std::env::var(TOKEN_ENV)
        .map_err(|_| QaError::Config(format!("{TOKEN_ENV} environment variable not set")))
}

fn check_token(token: String) -> Result<String> {
    if token.trim().is_empty() {
        return Err(QaError::Config("Hugging Face API token must not be empty".into()));
    }
    Ok(token)
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

const WAIT_FOR_MODEL: InferenceOptions = InferenceOptions { wait_for_model: true };

/// An [`EmbeddingProvider`] backed by the Hugging Face feature-extraction
/// pipeline.
///
/// The model must return one pooled vector per input, which is the case for
/// `sentence-transformers` models.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_model::HuggingFaceEmbeddingProvider;
///
/// let provider = HuggingFaceEmbeddingProvider::from_env()?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct HuggingFaceEmbeddingProvider {
    http: JsonClient,
    token: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl HuggingFaceEmbeddingProvider {
    /// Create a provider for `all-MiniLM-L6-v2` with the given token.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: JsonClient::new(SERVICE),
            token: check_token(token.into())?,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        })
    }

    /// Create a provider using the `HUGGINGFACEHUB_API_TOKEN` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(read_token()?)
    }

    /// Set the model and its output dimensionality.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    /// Point the provider at another Inference API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Abort requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = self.http.with_timeout(timeout)?;
        Ok(self)
    }

    fn url(&self) -> String {
        join_url(&self.base_url, &format!("pipeline/feature-extraction/{}", self.model))
    }
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [&'a str],
    options: InferenceOptions,
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = SERVICE, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| QaError::service(SERVICE, "API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = SERVICE, batch_size = texts.len(), model = %self.model, "embedding batch");

        let request = FeatureExtractionRequest { inputs: texts, options: WAIT_FOR_MODEL };
        let embeddings: Vec<Vec<f32>> = self.http.post(&self.url(), &self.token, &request).await?;

        if embeddings.len() != texts.len() {
            return Err(QaError::service(
                SERVICE,
                format!("expected {} embeddings, got {}", texts.len(), embeddings.len()),
            ));
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// The inference task a hosted generation model serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationTask {
    /// Encoder-decoder models such as `flan-t5`. The output never echoes the prompt.
    #[default]
    Text2Text,
    /// Decoder-only models. Asked to leave the prompt out of the output.
    TextGeneration,
}

/// A [`LanguageModel`] backed by a Hugging Face hosted generation model.
///
/// Only the generated continuation is returned, never the prompt.
pub struct HuggingFaceTextGenerator {
    http: JsonClient,
    token: String,
    base_url: String,
    model: String,
    task: GenerationTask,
}

impl HuggingFaceTextGenerator {
    /// Create a generator for `flan-t5-large` with the given token.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: JsonClient::new(SERVICE),
            token: check_token(token.into())?,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_GENERATION_MODEL.into(),
            task: GenerationTask::Text2Text,
        })
    }

    /// Create a generator using the `HUGGINGFACEHUB_API_TOKEN` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(read_token()?)
    }

    /// Set the model repository id.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the task the model serves. Use [`GenerationTask::TextGeneration`]
    /// for decoder-only models.
    pub fn with_task(mut self, task: GenerationTask) -> Self {
        self.task = task;
        self
    }

    /// Point the generator at another Inference API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Abort requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = self.http.with_timeout(timeout)?;
        Ok(self)
    }

    fn parameters(&self, params: &GenerationParams) -> GenerationParameters {
        GenerationParameters {
            max_new_tokens: params.max_new_tokens,
            temperature: params.temperature,
            // text2text pipelines reject this kwarg
            return_full_text: (self.task == GenerationTask::TextGeneration).then_some(false),
        }
    }
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_full_text: Option<bool>,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[async_trait]
impl LanguageModel for HuggingFaceTextGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        debug!(provider = SERVICE, model = %self.model, prompt_len = prompt.len(), "generating");

        let request = GenerationRequest {
            inputs: prompt,
            parameters: self.parameters(params),
            options: WAIT_FOR_MODEL,
        };
        let url = join_url(&self.base_url, &format!("models/{}", self.model));
        let outputs: Vec<GeneratedText> = self.http.post(&url, &self.token, &request).await?;

        outputs
            .into_iter()
            .next()
            .map(|output| output.generated_text)
            .ok_or_else(|| QaError::service(SERVICE, "API returned no generations"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_token() {
        assert!(matches!(HuggingFaceEmbeddingProvider::new("  "), Err(QaError::Config(_))));
        assert!(matches!(HuggingFaceTextGenerator::new(""), Err(QaError::Config(_))));
    }

    #[test]
    fn defaults_to_minilm_and_flan_t5() {
        let embedder = HuggingFaceEmbeddingProvider::new("hf_test").unwrap();
        assert_eq!(embedder.dimensions(), 384);
        assert_eq!(
            embedder.url(),
            "https://api-inference.huggingface.co/pipeline/feature-extraction/sentence-transformers/all-MiniLM-L6-v2"
        );
        assert_eq!(HuggingFaceTextGenerator::new("hf_test").unwrap().name(), "google/flan-t5-large");
    }

    fn request_json(generator: &HuggingFaceTextGenerator) -> serde_json::Value {
        let params = GenerationParams { max_new_tokens: 512, temperature: 0.1 };
        let request = GenerationRequest {
            inputs: "prompt",
            parameters: generator.parameters(&params),
            options: WAIT_FOR_MODEL,
        };
        serde_json::to_value(&request).unwrap()
    }

    #[test]
    fn text2text_request_omits_return_full_text() {
        let json = request_json(&HuggingFaceTextGenerator::new("hf_test").unwrap());
        assert!(json["parameters"].get("return_full_text").is_none());
        assert_eq!(json["parameters"]["max_new_tokens"], 512);
        assert_eq!(json["options"]["wait_for_model"], true);
    }

    #[test]
    fn text_generation_request_asks_for_continuation_only() {
        let generator = HuggingFaceTextGenerator::new("hf_test")
            .unwrap()
            .with_task(GenerationTask::TextGeneration);
        let json = request_json(&generator);
        assert_eq!(json["parameters"]["return_full_text"], false);
    }
}
