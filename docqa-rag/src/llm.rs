//! Language model trait used by the answer synthesizer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::QaConfig;
use crate::error::Result;

/// Per-call generation parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GenerationParams {
    /// Maximum number of tokens to generate.
    pub max_new_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self { max_new_tokens: 512, temperature: 0.1 }
    }
}

impl From<&QaConfig> for GenerationParams {
    fn from(config: &QaConfig) -> Self {
        Self { max_new_tokens: config.max_new_tokens, temperature: config.temperature }
    }
}

/// A text-in, text-out language model.
///
/// Backends may truncate prompts that exceed their context length; the
/// synthesizer already trims context from the left so that instructions and
/// the question survive. The returned text may be empty on degenerate input.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, used in logs and error messages.
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Release any resources held by the model.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
