//! Command-line arguments.
//!
//! Every option can also be set through an environment variable, which may
//! come from a `.env` file in the working directory.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use docqa_model::GenerationTask;
use docqa_rag::{QaConfig, RetryPolicy};

/// Ask questions about a folder of PDF papers, or search arXiv.
#[derive(Debug, Parser)]
#[command(name = "docqa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Folder holding the PDF documents to index.
    #[arg(long, env = "DOCQA_DOCUMENTS_DIR", default_value = "documents")]
    pub documents_dir: PathBuf,

    /// Model backend.
    #[arg(long, env = "DOCQA_PROVIDER", value_enum, default_value_t = Provider::HuggingFace)]
    pub provider: Provider,

    /// Hugging Face access token.
    #[arg(long, env = "HUGGINGFACEHUB_API_TOKEN", hide_env_values = true)]
    pub hf_token: Option<String>,

    /// API key for the OpenAI-compatible backend.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Override the backend host.
    #[arg(long, env = "DOCQA_BASE_URL")]
    pub base_url: Option<String>,

    /// Embedding model id.
    #[arg(long, env = "DOCQA_EMBEDDING_MODEL")]
    pub embedding_model: Option<String>,

    /// Output size of `--embedding-model`.
    #[arg(long, env = "DOCQA_EMBEDDING_DIMENSIONS", requires = "embedding_model")]
    pub embedding_dimensions: Option<usize>,

    /// Generation model id.
    #[arg(long, env = "DOCQA_GENERATION_MODEL")]
    pub generation_model: Option<String>,

    /// Inference task of the Hugging Face generation model.
    #[arg(long, env = "DOCQA_GENERATION_TASK", value_enum, default_value_t = Task::Text2Text)]
    pub generation_task: Task,

    /// Maximum characters per chunk.
    #[arg(long, env = "DOCQA_CHUNK_SIZE", default_value_t = 600)]
    pub chunk_size: usize,

    /// Maximum characters shared by consecutive chunks.
    #[arg(long, env = "DOCQA_CHUNK_OVERLAP", default_value_t = 100)]
    pub chunk_overlap: usize,

    /// Chunks retrieved per question.
    #[arg(long, env = "DOCQA_TOP_K", default_value_t = 2)]
    pub top_k: usize,

    /// Sampling temperature.
    #[arg(long, env = "DOCQA_TEMPERATURE", default_value_t = 0.1)]
    pub temperature: f32,

    /// Token limit per generation.
    #[arg(long, env = "DOCQA_MAX_NEW_TOKENS", default_value_t = 512)]
    pub max_new_tokens: u32,

    /// Partial answers generated at once.
    #[arg(long, env = "DOCQA_MAP_CONCURRENCY", default_value_t = 4)]
    pub map_concurrency: usize,

    /// Seconds to wait for any model call or paper search.
    #[arg(long, env = "DOCQA_TIMEOUT_SECS", default_value_t = 120)]
    pub timeout_secs: u64,

    /// Attempts per model call, including the first.
    #[arg(long, env = "DOCQA_MAX_ATTEMPTS", default_value_t = 1)]
    pub max_attempts: u32,

    /// Documents extracted in parallel.
    #[arg(long, env = "DOCQA_EXTRACT_WORKERS", default_value_t = 4)]
    pub extract_workers: usize,

    /// Papers listed per arXiv search.
    #[arg(long, env = "DOCQA_ARXIV_RESULTS", default_value_t = docqa_arxiv::DEFAULT_MAX_RESULTS)]
    pub arxiv_results: usize,
}

/// Model backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    /// Hugging Face Inference API.
    #[value(name = "huggingface")]
    HuggingFace,
    /// OpenAI or a server speaking its API.
    #[value(name = "openai")]
    OpenAi,
}

/// Hugging Face generation tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Task {
    /// Encoder-decoder models such as flan-t5.
    #[value(name = "text2text")]
    Text2Text,
    /// Decoder-only models.
    #[value(name = "text-generation")]
    TextGeneration,
}

impl From<Task> for GenerationTask {
    fn from(task: Task) -> Self {
        match task {
            Task::Text2Text => GenerationTask::Text2Text,
            Task::TextGeneration => GenerationTask::TextGeneration,
        }
    }
}

impl Cli {
    /// Build the pipeline configuration from the parsed options.
    pub fn qa_config(&self) -> docqa_rag::Result<QaConfig> {
        QaConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.top_k)
            .temperature(self.temperature)
            .max_new_tokens(self.max_new_tokens)
            .map_concurrency(self.map_concurrency)
            .service_timeout(Duration::from_secs(self.timeout_secs))
            .retry(RetryPolicy::with_attempts(self.max_attempts))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_pipeline_defaults() {
        let cli = Cli::try_parse_from(["docqa"]).unwrap();
        let config = cli.qa_config().unwrap();
        let defaults = QaConfig::default();
        assert_eq!(config.chunk_size, defaults.chunk_size);
        assert_eq!(config.chunk_overlap, defaults.chunk_overlap);
        assert_eq!(config.top_k, defaults.top_k);
        assert_eq!(config.service_timeout, defaults.service_timeout);
        assert_eq!(config.retry.max_attempts, 1);
    }

    #[test]
    fn parses_provider_and_limits() {
        let cli = Cli::try_parse_from([
            "docqa",
            "--provider",
            "openai",
            "--top-k",
            "4",
            "--documents-dir",
            "papers",
        ])
        .unwrap();
        assert_eq!(cli.provider, Provider::OpenAi);
        assert_eq!(cli.generation_task, Task::Text2Text);
        assert_eq!(cli.top_k, 4);
        assert_eq!(cli.documents_dir, PathBuf::from("papers"));
    }

    #[test]
    fn parses_decoder_only_task() {
        let cli = Cli::try_parse_from(["docqa", "--generation-task", "text-generation"]).unwrap();
        assert_eq!(GenerationTask::from(cli.generation_task), GenerationTask::TextGeneration);
    }

    #[test]
    fn invalid_overlap_is_rejected() {
        let cli = Cli::try_parse_from(["docqa", "--chunk-size", "100", "--chunk-overlap", "100"])
            .unwrap();
        assert!(cli.qa_config().is_err());
    }
}
