//! Document discovery and text extraction.
//!
//! Extraction itself is delegated to a [`TextExtractor`]. Failures are
//! per-document and non-fatal: the document is logged, reported and skipped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::{StreamExt, stream};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::{QaError, Result};

/// Turns a file into raw text.
///
/// Implementations are synchronous and run on the blocking thread pool.
pub trait TextExtractor: Send + Sync {
    /// File extensions (lowercase, without the dot) this extractor handles.
    fn extensions(&self) -> &[&str];

    /// Extract the raw text of the file at `path`.
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Reads UTF-8 text and markdown files as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extensions(&self) -> &[&str] {
        &["txt", "md"]
    }

    fn extract(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| QaError::Extraction {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// List the files directly inside `dir` whose extension is in `extensions`.
///
/// Extension matching ignores case. The result is sorted so ingestion order
/// is reproducible.
///
/// # Errors
///
/// Returns [`QaError::Io`] if `dir` does not exist or is not a directory.
pub fn discover_documents(dir: impl AsRef<Path>, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(QaError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("document directory '{}' does not exist", dir.display()),
        )));
    }

    let mut files = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry.path().extension().and_then(|ext| ext.to_str()).is_some_and(|ext| {
                extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext))
            })
        })
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();

    files.sort();
    Ok(files)
}

/// Outcome of [`load_documents`].
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Documents with non-empty text, in input order.
    pub documents: Vec<Document>,
    /// One [`QaError::Extraction`] per skipped file, in input order.
    pub failures: Vec<QaError>,
}

/// Extract every file in `paths` using up to `workers` blocking threads.
///
/// Results are merged in input order regardless of completion order. Files
/// that fail to extract or contain no text are logged and skipped.
pub async fn load_documents(
    paths: Vec<PathBuf>,
    extractor: Arc<dyn TextExtractor>,
    workers: usize,
) -> LoadReport {
    let outcomes: Vec<(PathBuf, Result<String>)> = stream::iter(paths)
        .map(|path| {
            let extractor = Arc::clone(&extractor);
            async move {
                info!(path = %path.display(), "processing document");
                let task_path = path.clone();
                let result = tokio::task::spawn_blocking(move || extractor.extract(&task_path))
                    .await
                    .unwrap_or_else(|e| {
                        Err(QaError::Extraction { path: path.clone(), message: e.to_string() })
                    });
                (path, result)
            }
        })
        .buffered(workers.max(1))
        .collect()
        .await;

    let mut report = LoadReport::default();
    for (path, result) in outcomes {
        let outcome = result.and_then(|text| {
            if text.trim().is_empty() {
                Err(QaError::Extraction {
                    path: path.clone(),
                    message: "no extractable text".to_string(),
                })
            } else {
                Ok(text)
            }
        });

        match outcome {
            Ok(text) => report.documents.push(document_from_path(&path, text)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping document");
                report.failures.push(e);
            }
        }
    }

    info!(
        loaded = report.documents.len(),
        skipped = report.failures.len(),
        "document extraction finished"
    );
    report
}

fn document_from_path(path: &Path, text: String) -> Document {
    let id = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mut document = Document::new(id, text);
    document.metadata.insert("path".to_string(), path.display().to_string());
    document
}
