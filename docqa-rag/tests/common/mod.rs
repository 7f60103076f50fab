//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use docqa_rag::{EmbeddingProvider, GenerationParams, LanguageModel, NOT_FOUND, QaError};

/// Deterministic bag-of-words embeddings: each lowercase word is hashed
/// into one of `dimensions` buckets.
pub struct BagOfWordsEmbedder {
    dimensions: usize,
}

impl BagOfWordsEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> docqa_rag::Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; self.dimensions];
        for word in text.split_whitespace() {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if word.is_empty() {
                continue;
            }
            let hash =
                word.bytes().fold(0xcbf29ce484222325u64, |acc, b| (acc ^ b as u64).wrapping_mul(0x100000001b3));
            embedding[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// An embedding provider that always fails.
pub struct UnreachableEmbedder;

#[async_trait]
impl EmbeddingProvider for UnreachableEmbedder {
    async fn embed(&self, _text: &str) -> docqa_rag::Result<Vec<f32>> {
        Err(QaError::service("embedding", "connection refused"))
    }

    fn dimensions(&self) -> usize {
        8
    }
}

type Handler = Box<dyn Fn(&str) -> docqa_rag::Result<String> + Send + Sync>;
type Delay = Box<dyn Fn(&str) -> Duration + Send + Sync>;

/// A language model driven by a closure, recording every prompt it receives
/// and the most calls it ever had in flight at once.
pub struct ScriptedModel {
    handler: Handler,
    delay: Delay,
    prompts: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedModel {
    pub fn new(handler: impl Fn(&str) -> docqa_rag::Result<String> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            delay: Box::new(|_| Duration::ZERO),
            prompts: Mutex::default(),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Answers map prompts with the sentence containing `needle`, or the
    /// not-found sentence; answers reduce prompts with the first useful
    /// partial answer.
    pub fn extractive(needle: &'static str) -> Self {
        Self::new(move |prompt| {
            if is_reduce(prompt) {
                let found = partial_answers(prompt).into_iter().find(|a| a != NOT_FOUND);
                return Ok(found.unwrap_or_else(|| NOT_FOUND.to_string()));
            }
            let context = context_of(prompt);
            let answer = context
                .split(". ")
                .find(|sentence| sentence.contains(needle))
                .map(|sentence| sentence.trim().to_string())
                .unwrap_or_else(|| NOT_FOUND.to_string());
            Ok(answer)
        })
    }

    pub fn with_delay(mut self, delay: impl Fn(&str) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Box::new(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str, _params: &GenerationParams) -> docqa_rag::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = (self.delay)(prompt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let result = (self.handler)(prompt);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn is_reduce(prompt: &str) -> bool {
    prompt.contains("Partial answers:\n")
}

/// The chunk text embedded in a map prompt.
pub fn context_of(prompt: &str) -> &str {
    let start = prompt.find("Context:\n").map_or(0, |i| i + "Context:\n".len());
    let end = prompt.rfind("\n\nQuestion:").unwrap_or(prompt.len());
    &prompt[start..end.max(start)]
}

/// The partial answers embedded in a reduce prompt.
pub fn partial_answers(prompt: &str) -> Vec<String> {
    let start = prompt.find("Partial answers:\n").map_or(0, |i| i + "Partial answers:\n".len());
    let end = prompt.rfind("\n\nQuestion:").unwrap_or(prompt.len());
    prompt[start..end.max(start)].split("\n\n").map(str::to_string).collect()
}
