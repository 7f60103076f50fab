//! In-memory vector index using cosine similarity.
//!
//! This module provides [`InMemoryVectorIndex`], a vector index backed by a
//! `Vec` protected by a `tokio::sync::RwLock`. Nothing is persisted; the
//! index lives as long as the process.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::SearchResult;
use crate::error::{QaError, Result};
use crate::index::{IndexedEntry, VectorIndex};

/// An in-memory vector index using cosine similarity for search.
///
/// Search is exhaustive, which is exact and fast enough for a few thousand
/// chunks.
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    state: RwLock<Option<IndexState>>,
}

#[derive(Debug, Default)]
struct IndexState {
    dimensions: Option<usize>,
    entries: Vec<IndexedEntry>,
}

impl InMemoryVectorIndex {
    /// Create a new, unbuilt index.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Check that every entry has the same, non-zero dimensionality.
fn validate_batch(entries: &[IndexedEntry], existing: Option<usize>) -> Result<Option<usize>> {
    let mut dimensions = existing;
    for entry in entries {
        let len = entry.embedding.len();
        if len == 0 {
            return Err(QaError::VectorIndex(format!(
                "chunk '{}' has an empty embedding",
                entry.chunk.id
            )));
        }
        match dimensions {
            Some(expected) if expected != len => {
                return Err(QaError::VectorIndex(format!(
                    "chunk '{}' has {len} dimensions, expected {expected}",
                    entry.chunk.id
                )));
            }
            Some(_) => {}
            None => dimensions = Some(len),
        }
    }
    Ok(dimensions)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn add(&self, entries: Vec<IndexedEntry>) -> Result<()> {
        let mut state = self.state.write().await;
        let existing = state.as_ref().and_then(|s| s.dimensions);
        let dimensions = validate_batch(&entries, existing)?;

        let state = state.get_or_insert_with(IndexState::default);
        state.dimensions = dimensions;
        state.entries.extend(entries);
        debug!(entry_count = state.entries.len(), ?dimensions, "vector index updated");
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let state = self.state.read().await;
        let state = state.as_ref().ok_or(QaError::IndexUnavailable)?;

        if let Some(expected) = state.dimensions {
            if embedding.len() != expected {
                return Err(QaError::VectorIndex(format!(
                    "query has {} dimensions, expected {expected}",
                    embedding.len()
                )));
            }
        }

        let mut scored: Vec<SearchResult> = state
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.embedding, embedding),
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    async fn len(&self) -> usize {
        self.state.read().await.as_ref().map_or(0, |s| s.entries.len())
    }

    async fn is_built(&self) -> bool {
        self.state.read().await.is_some()
    }
}
