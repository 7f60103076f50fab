//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A source document: raw extracted text plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Source identifier (the file name).
    pub id: String,
    /// The raw extracted text. Empty when extraction produced nothing.
    pub text: String,
    /// Key-value metadata associated with the document.
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document without metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new() }
    }
}

/// A bounded-length passage of a [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier, `{source}_{index}`.
    pub id: String,
    /// The [`Document::id`] this chunk was cut from.
    pub source: String,
    /// Zero-based ordinal within the source document.
    pub index: usize,
    /// Byte offset of the chunk in the document text.
    pub start: usize,
    /// The text content of the chunk.
    pub text: String,
    /// Metadata inherited from the parent document plus `chunk_index`.
    pub metadata: HashMap<String, String>,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}

/// Reference to a retrieved chunk, reported alongside an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceRef {
    /// Id of the document the chunk came from.
    pub source: String,
    /// Ordinal of the chunk within that document.
    pub chunk_index: usize,
}

impl From<&Chunk> for SourceRef {
    fn from(chunk: &Chunk) -> Self {
        Self { source: chunk.source.clone(), chunk_index: chunk.index }
    }
}

/// The synthesized answer to a question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The final answer text.
    pub text: String,
    /// Per-chunk answers from the map step, in retrieval rank order.
    pub partial_answers: Vec<String>,
    /// The chunks the answer was synthesized from, in retrieval rank order.
    pub sources: Vec<SourceRef>,
}
