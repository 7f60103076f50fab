//! Paper metadata.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    /// Title with whitespace collapsed.
    pub title: String,
    /// Author names in listed order.
    pub authors: Vec<String>,
    /// Abstract with whitespace collapsed.
    pub summary: String,
    /// Date of the first version.
    pub published: NaiveDate,
}

impl fmt::Display for Paper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f, "   Authors: {}", self.authors.join(", "))?;
        writeln!(f, "   Published: {}", self.published.format("%Y-%m-%d"))?;
        write!(f, "   Summary: {}", self.summary)
    }
}
