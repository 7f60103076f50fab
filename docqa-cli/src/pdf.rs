//! PDF text extraction.

use std::path::Path;

use docqa_rag::{QaError, Result, TextExtractor};
use tracing::debug;

/// Extracts the text layer of PDF files.
///
/// Scanned PDFs without a text layer yield empty text and are skipped
/// during loading.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let text = pdf_extract::extract_text(path).map_err(|e| QaError::Extraction {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), chars = text.len(), "extracted pdf text");
        Ok(text)
    }
}
