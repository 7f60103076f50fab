//! The interactive prompt.
//!
//! Each line is either a question for the QA system, an `arxiv:` paper
//! search, or `exit`.

use docqa_arxiv::{Paper, PaperSearch};
use docqa_rag::QaSystem;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::error;

const PROMPT: &str = "Enter your query: ";
const PAPER_PREFIX: &str = "arxiv:";

/// Shown when a paper search fails or finds nothing.
pub const NO_PAPERS: &str = "Could not find any papers matching your description.";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// Leave the shell.
    Exit,
    /// Nothing to do.
    Blank,
    /// Search arXiv with the text after the prefix.
    PaperSearch(&'a str),
    /// Ask the QA system.
    Question(&'a str),
}

/// Classify a line of input. Keywords and the `arxiv:` prefix ignore case.
pub fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Blank;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return Command::Exit;
    }
    match line.get(..PAPER_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(PAPER_PREFIX) => {
            Command::PaperSearch(line[PAPER_PREFIX.len()..].trim())
        }
        _ => Command::Question(line),
    }
}

/// Render search hits as a numbered list.
pub fn format_papers(papers: &[Paper]) -> String {
    papers
        .iter()
        .enumerate()
        .map(|(i, paper)| format!("\n{}. {paper}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Routes input lines to the QA system or the paper search.
pub struct Shell<'a> {
    qa: &'a QaSystem,
    papers: &'a dyn PaperSearch,
    max_results: usize,
}

impl<'a> Shell<'a> {
    /// Create a shell over an indexed QA system.
    pub fn new(qa: &'a QaSystem, papers: &'a dyn PaperSearch, max_results: usize) -> Self {
        Self { qa, papers, max_results }
    }

    /// The reply to a question. Never fails; errors become text.
    pub async fn answer(&self, question: &str) -> String {
        format!("\nAnswer: {}", self.qa.ask_or_explain(question).await)
    }

    /// The listing for a paper search. Never fails; errors become text.
    pub async fn search_papers(&self, query: &str) -> String {
        match self.papers.search(query, self.max_results).await {
            Ok(papers) if !papers.is_empty() => format_papers(&papers),
            Ok(_) => NO_PAPERS.to_string(),
            Err(e) => {
                error!(error = %e, query, "paper search failed");
                NO_PAPERS.to_string()
            }
        }
    }

    /// Read and answer lines until `exit`, end of input or Ctrl-C.
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut editor = DefaultEditor::new()?;

        loop {
            println!();
            let line = match tokio::task::block_in_place(|| editor.readline(PROMPT)) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };

            match parse_command(&line) {
                Command::Exit => break,
                Command::Blank => continue,
                Command::PaperSearch(query) => {
                    let _ = editor.add_history_entry(line.as_str());
                    println!("Searching arXiv for: '{query}'");
                    println!("{}", self.search_papers(query).await);
                }
                Command::Question(question) => {
                    let _ = editor.add_history_entry(line.as_str());
                    println!("{}", self.answer(question).await);
                }
            }
        }

        Ok(())
    }
}
