//! Map-reduce answer synthesis.
//!
//! The [`MapReduceSynthesizer`] asks the language model for one partial
//! answer per retrieved chunk (the *map* step, run concurrently) and then
//! combines the partial answers, in retrieval rank order, into a single
//! final answer (the *reduce* step).

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info, warn};

use crate::config::QaConfig;
use crate::document::{Answer, Chunk, SourceRef};
use crate::error::{QaError, Result};
use crate::llm::{GenerationParams, LanguageModel};
use crate::prompt::{NOT_FOUND, PARTIAL_ANSWER_DELIMITER, PromptSet};
use crate::service::ServicePolicy;

/// Combines retrieved chunks into one answer with a language model.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{MapReduceSynthesizer, QaConfig};
///
/// let synthesizer = MapReduceSynthesizer::new(model, &QaConfig::default());
/// let answer = synthesizer.synthesize("What is the reported F1-score?", &chunks).await?;
/// ```
pub struct MapReduceSynthesizer {
    model: Arc<dyn LanguageModel>,
    prompts: PromptSet,
    params: GenerationParams,
    policy: ServicePolicy,
    map_concurrency: usize,
    max_prompt_chars: usize,
}

impl MapReduceSynthesizer {
    /// Create a synthesizer using the built-in prompts.
    pub fn new(model: Arc<dyn LanguageModel>, config: &QaConfig) -> Self {
        Self {
            model,
            prompts: PromptSet::default(),
            params: GenerationParams::from(config),
            policy: ServicePolicy::from(config),
            map_concurrency: config.map_concurrency.max(1),
            max_prompt_chars: config.max_prompt_chars,
        }
    }

    /// Replace the built-in prompts.
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Answer `question` from `chunks`, which must be in retrieval rank order.
    ///
    /// With no chunks the model is not called and the answer is [`NOT_FOUND`].
    /// Otherwise the reduce step always runs, even if every partial answer
    /// is the not-found sentence.
    ///
    /// # Errors
    ///
    /// Returns the first error of any model call, including
    /// [`QaError::ServiceTimeout`](crate::QaError::ServiceTimeout).
    pub async fn synthesize(&self, question: &str, chunks: &[Chunk]) -> Result<Answer> {
        if chunks.is_empty() {
            info!("no chunks retrieved, skipping synthesis");
            return Ok(Answer {
                text: NOT_FOUND.to_string(),
                partial_answers: Vec::new(),
                sources: Vec::new(),
            });
        }

        let partial_answers = self.map(question, chunks).await?;
        let text = self.reduce(question, &partial_answers).await?;

        Ok(Answer {
            text,
            partial_answers,
            sources: chunks.iter().map(SourceRef::from).collect(),
        })
    }

    /// One partial answer per chunk, in the order of `chunks`.
    async fn map(&self, question: &str, chunks: &[Chunk]) -> Result<Vec<String>> {
        info!(chunk_count = chunks.len(), concurrency = self.map_concurrency, "map step started");

        stream::iter(chunks.iter().enumerate())
            .map(|(rank, chunk)| async move {
                let prompt = self.prompts.map.render(&chunk.text, question, self.max_prompt_chars);
                let partial = self.generate(&prompt).await?;
                debug!(rank, chunk.id = %chunk.id, answer_len = partial.len(), "partial answer");
                Ok::<_, QaError>(partial)
            })
            // `buffered` keeps input order however the calls complete.
            .buffered(self.map_concurrency)
            .try_collect()
            .await
    }

    async fn reduce(&self, question: &str, partial_answers: &[String]) -> Result<String> {
        let not_found = partial_answers.iter().filter(|a| a.as_str() == NOT_FOUND).count();
        info!(partial_count = partial_answers.len(), not_found, "reduce step started");

        let summaries = partial_answers.join(PARTIAL_ANSWER_DELIMITER);
        let prompt = self.prompts.reduce.render(&summaries, question, self.max_prompt_chars);
        let answer = self.generate(&prompt).await?;

        if answer.is_empty() {
            warn!(model = self.model.name(), "reduce step returned no text");
            return Ok(NOT_FOUND.to_string());
        }
        Ok(answer)
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let model = &self.model;
        let params = &self.params;
        let output = self
            .policy
            .call(model.name(), move || model.generate(prompt, params))
            .await?;
        Ok(output.trim().to_string())
    }
}
