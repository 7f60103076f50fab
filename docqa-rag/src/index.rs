//! Vector index trait for storing and searching chunk embeddings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A [`Chunk`] together with its embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedEntry {
    /// The stored chunk.
    pub chunk: Chunk,
    /// Its embedding. Must match the index dimensionality.
    pub embedding: Vec<f32>,
}

impl IndexedEntry {
    /// Pair a chunk with its embedding.
    pub fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self { chunk, embedding }
    }
}

/// A storage backend for chunk embeddings with similarity search.
///
/// An index starts out *unbuilt*. The first [`add`](VectorIndex::add) builds
/// it, even with an empty batch. Querying an unbuilt index fails with
/// [`QaError::IndexUnavailable`](crate::QaError::IndexUnavailable); querying
/// a built but empty one returns no results.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{InMemoryVectorIndex, VectorIndex};
///
/// let index = InMemoryVectorIndex::new();
/// index.add(entries).await?;
/// let results = index.query(&query_embedding, 2).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Add entries to the index.
    ///
    /// The batch is validated as a whole before anything is stored, so a
    /// failed call leaves the index unchanged.
    async fn add(&self, entries: Vec<IndexedEntry>) -> Result<()>;

    /// Return at most `k` entries ordered by descending similarity.
    ///
    /// Ties keep insertion order, so identical contents and query always
    /// produce the same result.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Number of stored entries.
    async fn len(&self) -> usize;

    /// Whether [`add`](VectorIndex::add) has completed at least once.
    async fn is_built(&self) -> bool;
}
