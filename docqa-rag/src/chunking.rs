//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`RecursiveChunker`]: splits hierarchically by paragraphs, lines, sentences, then words
//! - [`FixedSizeChunker`]: sliding character windows with configurable overlap
//!
//! All lengths are measured in characters, never bytes, and every chunk is an
//! exact substring of the document text. Consecutive chunks of one document
//! share at most `chunk_overlap` characters.

use std::ops::Range;

use crate::document::{Chunk, Document};

/// Separators tried in order by [`RecursiveChunker`].
const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document text is empty or whitespace-only.
    /// Chunk indices start at 0 for every document.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// Text is first cut into pieces no longer than `chunk_size`, using the
/// coarsest separator that makes a piece fit. Pieces are then merged
/// greedily into windows; each new window re-includes the trailing pieces
/// of the previous one, up to `chunk_overlap` characters.
///
/// # Example
///
/// ```rust
/// use docqa_rag::{Chunker, Document, RecursiveChunker};
///
/// let chunker = RecursiveChunker::new(600, 100);
/// let chunks = chunker.chunk(&Document::new("paper.pdf", "Results. F1-score of 0.87."));
/// assert_eq!(chunks.len(), 1);
/// assert_eq!(chunks[0].index, 0);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: maximum number of characters shared by consecutive chunks
    ///
    /// Out-of-range values are clamped so that `chunk_size >= 1` and
    /// `chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let (chunk_size, chunk_overlap) = clamp_limits(chunk_size, chunk_overlap);
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let spans = split_spans(&document.text, self.chunk_size, self.chunk_overlap);
        build_chunks(document, spans)
    }
}

/// Splits text into fixed-size character windows with configurable overlap.
///
/// Each window after the first starts `chunk_size - chunk_overlap` characters
/// after the previous one, regardless of word or sentence boundaries.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// Out-of-range values are clamped as in [`RecursiveChunker::new`].
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let (chunk_size, chunk_overlap) = clamp_limits(chunk_size, chunk_overlap);
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        let text = &document.text;
        let bounds = char_boundaries(text);
        let char_count = bounds.len() - 1;
        let step = self.chunk_size - self.chunk_overlap;

        let mut spans = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            spans.push(bounds[start]..bounds[end]);
            if end == char_count {
                break;
            }
            start += step;
        }

        let spans = spans.into_iter().filter(|span| !text[span.clone()].trim().is_empty());
        build_chunks(document, spans.collect())
    }
}

/// Split `text` into chunk texts with the recursive strategy.
///
/// Convenience wrapper over [`split_spans`] for callers that only need the text.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<&str> {
    let (chunk_size, chunk_overlap) = clamp_limits(chunk_size, chunk_overlap);
    split_spans(text, chunk_size, chunk_overlap).into_iter().map(|span| &text[span]).collect()
}

fn clamp_limits(chunk_size: usize, chunk_overlap: usize) -> (usize, usize) {
    let chunk_size = chunk_size.max(1);
    (chunk_size, chunk_overlap.min(chunk_size - 1))
}

/// Byte ranges of the recursive chunks of `text`.
///
/// Expects limits already clamped. Whitespace-only windows are dropped.
fn split_spans(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<Range<usize>> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut pieces = Vec::new();
    split_pieces(text, 0, chunk_size, chunk_overlap, &SEPARATORS, &mut pieces);

    merge_pieces(text, &pieces, chunk_size, chunk_overlap)
        .into_iter()
        .filter(|span| !text[span.clone()].trim().is_empty())
        .collect()
}

/// Cut `text` into contiguous pieces of at most `chunk_size` characters.
///
/// `offset` is the byte position of `text` within the full document.
fn split_pieces(
    text: &str,
    offset: usize,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
    pieces: &mut Vec<Range<usize>>,
) {
    if text.is_empty() {
        return;
    }
    if char_len(text) <= chunk_size {
        pieces.push(offset..offset + text.len());
        return;
    }

    let Some((separator, remaining_separators)) = separators.split_first() else {
        hard_cut(text, offset, hard_cut_width(chunk_size, chunk_overlap), pieces);
        return;
    };

    let mut start = 0;
    for segment in split_keeping_separator(text, separator) {
        split_pieces(
            segment,
            offset + start,
            chunk_size,
            chunk_overlap,
            remaining_separators,
            pieces,
        );
        start += segment.len();
    }
}

/// Width of the pieces a separator-less run is cut into.
///
/// Pieces no wider than the overlap let the merge step carry exactly
/// `chunk_overlap` characters, which turns hard cuts into sliding windows.
fn hard_cut_width(chunk_size: usize, chunk_overlap: usize) -> usize {
    if chunk_overlap == 0 {
        chunk_size
    } else {
        chunk_overlap.min(chunk_size - chunk_overlap).max(1)
    }
}

fn hard_cut(text: &str, offset: usize, width: usize, pieces: &mut Vec<Range<usize>>) {
    let bounds = char_boundaries(text);
    let char_count = bounds.len() - 1;
    let mut start = 0;
    while start < char_count {
        let end = (start + width).min(char_count);
        pieces.push(offset + bounds[start]..offset + bounds[end]);
        start = end;
    }
}

/// Greedily merge contiguous pieces into windows of at most `chunk_size`
/// characters, carrying trailing pieces forward as overlap.
fn merge_pieces(
    text: &str,
    pieces: &[Range<usize>],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Range<usize>> {
    let lens: Vec<usize> = pieces.iter().map(|piece| char_len(&text[piece.clone()])).collect();
    let mut windows = Vec::new();
    let mut first = 0;

    while first < pieces.len() {
        // Every piece fits on its own, so a window always holds at least one.
        let mut end = first;
        let mut len = 0;
        while end < pieces.len() && len + lens[end] <= chunk_size {
            len += lens[end];
            end += 1;
        }
        windows.push(pieces[first].start..pieces[end - 1].end);
        if end == pieces.len() {
            break;
        }

        let mut next = end;
        let mut carried = 0;
        while next > first + 1
            && carried + lens[next - 1] <= chunk_overlap
            && carried + lens[next - 1] + lens[end] <= chunk_size
        {
            next -= 1;
            carried += lens[next];
        }
        first = next;
    }

    windows
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Byte offsets of every char boundary in `text`, including `text.len()`.
fn char_boundaries(text: &str) -> Vec<usize> {
    text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn build_chunks(document: &Document, spans: Vec<Range<usize>>) -> Vec<Chunk> {
    spans
        .into_iter()
        .enumerate()
        .map(|(i, span)| {
            let mut metadata = document.metadata.clone();
            metadata.insert("chunk_index".to_string(), i.to_string());
            Chunk {
                id: format!("{}_{i}", document.id),
                source: document.id.clone(),
                index: i,
                start: span.start,
                text: document.text[span].to_string(),
                metadata,
            }
        })
        .collect()
}
