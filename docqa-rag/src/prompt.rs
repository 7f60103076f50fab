//! Prompt templates for the map and reduce steps.

use crate::error::{QaError, Result};

/// Sentence the model is told to answer with when the context lacks the answer.
pub const NOT_FOUND: &str = "I couldn't find that in the provided documents.";

/// Separator placed between partial answers in the reduce prompt.
pub const PARTIAL_ANSWER_DELIMITER: &str = "\n\n";

const CONTEXT_SLOT: &str = "{context}";
const QUESTION_SLOT: &str = "{question}";

const MAP_TEMPLATE: &str = "You are a helpful assistant for answering questions about research papers.\n\
Use ONLY the information from the provided context to answer.\n\
If the answer isn't in the context, say: I couldn't find that in the provided documents.\n\n\
When the question asks for metrics (e.g., accuracy, F1-score, precision, recall),\n\
extract the exact numbers and units if present. Be concise.\n\n\
Context:\n{context}\n\nQuestion: {question}\nAnswer:";

const REDUCE_TEMPLATE: &str = "You will receive partial answers from multiple document chunks.\n\
Synthesize them into a single, concise answer.\n\
If metrics are requested (accuracy, F1-score, etc.), extract the exact numbers verbatim if present.\n\
If none of the partial answers contains the information, say so clearly.\n\n\
Partial answers:\n{context}\n\nQuestion: {question}\nFinal answer:";

/// A prompt with exactly one `{context}` slot and any number of `{question}` slots.
///
/// Rendering enforces a character budget by dropping the oldest (leftmost)
/// part of the context. Instructions and the question are never cut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    before_context: String,
    after_context: String,
}

impl PromptTemplate {
    /// Parse a template.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Config`] unless the template contains exactly one
    /// `{context}` slot and at least one `{question}` slot.
    pub fn new(template: &str) -> Result<Self> {
        if template.matches(CONTEXT_SLOT).count() != 1 {
            return Err(QaError::Config(format!(
                "prompt template must contain exactly one {CONTEXT_SLOT} slot"
            )));
        }
        if !template.contains(QUESTION_SLOT) {
            return Err(QaError::Config(format!(
                "prompt template must contain a {QUESTION_SLOT} slot"
            )));
        }
        Ok(split_template(template))
    }

    /// Render the prompt, keeping it within `max_chars` characters where possible.
    ///
    /// If the instructions and question alone exceed the budget the context
    /// is emptied and the prompt is returned over budget.
    pub fn render(&self, context: &str, question: &str, max_chars: usize) -> String {
        let before = self.before_context.replace(QUESTION_SLOT, question);
        let after = self.after_context.replace(QUESTION_SLOT, question);
        let fixed = before.chars().count() + after.chars().count();
        let context = keep_tail(context, max_chars.saturating_sub(fixed));
        format!("{before}{context}{after}")
    }
}

/// The templates used by the synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// Prompt for a single chunk; `{context}` receives the chunk text.
    pub map: PromptTemplate,
    /// Prompt for the final answer; `{context}` receives the joined partial answers.
    pub reduce: PromptTemplate,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self { map: split_template(MAP_TEMPLATE), reduce: split_template(REDUCE_TEMPLATE) }
    }
}

fn split_template(template: &str) -> PromptTemplate {
    let (before, after) = template.split_once(CONTEXT_SLOT).unwrap_or((template, ""));
    PromptTemplate { before_context: before.to_string(), after_context: after.to_string() }
}

/// The last `max_chars` characters of `text`.
fn keep_tail(text: &str, max_chars: usize) -> &str {
    let len = text.chars().count();
    if len <= max_chars {
        return text;
    }
    let skip = len - max_chars;
    let start = text.char_indices().nth(skip).map_or(text.len(), |(i, _)| i);
    &text[start..]
}
