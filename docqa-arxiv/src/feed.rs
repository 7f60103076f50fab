//! Atom feed parsing for arXiv API responses.

use chrono::DateTime;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{ArxivError, Result};
use crate::paper::Paper;

/// Marker in the `<id>` of the entry arXiv returns for a rejected query.
const API_ERROR_ID: &str = "/api/errors";

#[derive(Default)]
struct EntryBuilder {
    id: String,
    title: String,
    authors: Vec<String>,
    summary: String,
    published: String,
}

impl EntryBuilder {
    fn finish(self) -> Result<Paper> {
        if self.id.contains(API_ERROR_ID) {
            return Err(ArxivError::Feed(format!("query rejected: {}", self.summary)));
        }
        let published = DateTime::parse_from_rfc3339(&self.published)
            .map_err(|e| {
                ArxivError::Feed(format!(
                    "entry '{}' has invalid published date '{}': {e}",
                    self.title, self.published
                ))
            })?
            .date_naive();
        Ok(Paper { title: self.title, authors: self.authors, summary: self.summary, published })
    }
}

/// Parse the entries of an arXiv Atom feed, in feed order.
///
/// # Errors
///
/// Returns [`ArxivError::Feed`] for malformed XML, an entry without a valid
/// `published` timestamp, or the error entry arXiv emits for a bad query.
pub fn parse_feed(xml: &str) -> Result<Vec<Paper>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut papers = Vec::new();
    let mut entry: Option<EntryBuilder> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"entry" {
                    entry = Some(EntryBuilder::default());
                }
                text.clear();
            }
            Ok(Event::Text(e)) => {
                let unescaped = e.unescape().map_err(|e| ArxivError::Feed(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Ok(Event::CData(e)) => text.push_str(&String::from_utf8_lossy(&e)),
            Ok(Event::End(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"entry" {
                    if let Some(done) = entry.take() {
                        papers.push(done.finish()?);
                    }
                } else if let Some(current) = entry.as_mut() {
                    match name.as_ref() {
                        b"id" => current.id = text.trim().to_string(),
                        b"title" => current.title = collapse_whitespace(&text),
                        b"summary" => current.summary = collapse_whitespace(&text),
                        b"published" => current.published = text.trim().to_string(),
                        b"name" => current.authors.push(collapse_whitespace(&text)),
                        _ => {}
                    }
                }
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ArxivError::Feed(format!("XML parse error: {e}"))),
            _ => {}
        }
    }

    Ok(papers)
}

/// Replace every run of whitespace, including line breaks, with one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
