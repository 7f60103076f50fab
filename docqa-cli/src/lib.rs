//! # docqa-cli
//!
//! The `docqa` command: index a folder of PDF papers, then answer questions
//! about them interactively. Lines starting with `arxiv:` search arXiv
//! instead.

pub mod app;
pub mod args;
pub mod pdf;
pub mod shell;
pub mod telemetry;

pub use args::{Cli, Provider};
pub use pdf::PdfTextExtractor;
