//! # docqa-arxiv
//!
//! Paper search over the arXiv Atom API.
//!
//! [`ArxivClient`] implements [`PaperSearch`]; its errors surface as
//! `QaError::Service` so callers can treat paper search like any other
//! external service.

pub mod client;
pub mod error;
pub mod feed;
pub mod paper;

pub use client::{ArxivClient, DEFAULT_BASE_URL, DEFAULT_MAX_RESULTS, PaperSearch};
pub use error::{ArxivError, Result};
pub use feed::{collapse_whitespace, parse_feed};
pub use paper::Paper;
