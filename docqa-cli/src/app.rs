//! Startup: models, document loading, indexing, then the shell.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use docqa_arxiv::ArxivClient;
use docqa_model::{
    HuggingFaceEmbeddingProvider, HuggingFaceTextGenerator, OpenAIChatModel,
    OpenAIEmbeddingProvider,
};
use docqa_rag::{
    EmbeddingProvider, LanguageModel, QaSystem, TextExtractor, discover_documents, load_documents,
};
use tracing::info;

use crate::args::{Cli, Provider};
use crate::pdf::PdfTextExtractor;
use crate::shell::Shell;

/// Run the application until the user leaves the shell.
///
/// Setup problems the user can fix (missing token, empty documents folder)
/// are reported on stdout and end the run without an error.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.qa_config().context("invalid configuration")?;

    let Some((embedder, model)) = build_models(&cli)? else {
        return Ok(());
    };

    if !cli.documents_dir.exists() {
        create_documents_dir(&cli.documents_dir)?;
        return Ok(());
    }

    println!("Starting document ingestion...");
    let extractor: Arc<dyn TextExtractor> = Arc::new(PdfTextExtractor);
    let paths = discover_documents(&cli.documents_dir, extractor.extensions())
        .with_context(|| format!("cannot read {}", cli.documents_dir.display()))?;
    let loaded = load_documents(paths, extractor, cli.extract_workers).await;
    if loaded.documents.is_empty() {
        println!("No documents processed. Exiting.");
        return Ok(());
    }
    println!("Successfully processed {} documents.", loaded.documents.len());

    let mut qa = QaSystem::builder()
        .config(config)
        .embedding_provider(embedder)
        .language_model(model)
        .build()?;
    let report = qa.ingest(&loaded.documents).await.context("failed to build the document index")?;
    info!(chunk_count = report.chunk_count, "ready for questions");

    let papers = paper_search(&cli)?;
    println!("\nDocument Q&A AI Agent");
    println!("Ask questions about the documents or use 'arxiv:' to search for a paper.");
    println!("Type 'exit' to quit.");
    Shell::new(&qa, &papers, cli.arxiv_results).run().await?;

    qa.shutdown().await?;
    info!("goodbye");
    Ok(())
}

type Models = (Arc<dyn EmbeddingProvider>, Arc<dyn LanguageModel>);

/// Build the embedding and generation backends, or print how to supply
/// the missing credential and return `None`.
fn build_models(cli: &Cli) -> anyhow::Result<Option<Models>> {
    match cli.provider {
        Provider::HuggingFace => {
            let Some(token) = cli.hf_token.clone().filter(|t| !t.trim().is_empty()) else {
                println!("Error: HUGGINGFACEHUB_API_TOKEN environment variable not set.");
                println!("Please set it to your Hugging Face API token.");
                return Ok(None);
            };

            let mut embedder = HuggingFaceEmbeddingProvider::new(token.clone())?;
            let mut generator =
                HuggingFaceTextGenerator::new(token)?.with_task(cli.generation_task.into());
            if let Some(url) = &cli.base_url {
                embedder = embedder.with_base_url(url);
                generator = generator.with_base_url(url);
            }
            if let Some(name) = &cli.embedding_model {
                let dimensions = cli.embedding_dimensions.unwrap_or(embedder.dimensions());
                embedder = embedder.with_model(name, dimensions);
            }
            if let Some(name) = &cli.generation_model {
                generator = generator.with_model(name);
            }
            let embedder: Arc<dyn EmbeddingProvider> = Arc::new(embedder);
            let generator: Arc<dyn LanguageModel> = Arc::new(generator);
            Ok(Some((embedder, generator)))
        }
        Provider::OpenAi => {
            let Some(key) = cli.openai_api_key.clone().filter(|k| !k.is_empty()) else {
                println!("Error: OPENAI_API_KEY environment variable not set.");
                println!("Please set it to your API key, or any placeholder for a local server.");
                return Ok(None);
            };

            let mut embedder = OpenAIEmbeddingProvider::new(key.clone())?;
            let mut chat = OpenAIChatModel::new(key)?;
            if let Some(url) = &cli.base_url {
                embedder = embedder.with_base_url(url);
                chat = chat.with_base_url(url);
            }
            if let Some(name) = &cli.embedding_model {
                embedder = embedder.with_model(name);
                if let Some(dimensions) = cli.embedding_dimensions {
                    embedder = embedder.with_dimensions(dimensions);
                }
            }
            if let Some(name) = &cli.generation_model {
                chat = chat.with_model(name);
            }
            let embedder: Arc<dyn EmbeddingProvider> = Arc::new(embedder);
            let chat: Arc<dyn LanguageModel> = Arc::new(chat);
            Ok(Some((embedder, chat)))
        }
    }
}

/// The arXiv client, bounded by the same timeout as the model calls.
fn paper_search(cli: &Cli) -> anyhow::Result<ArxivClient> {
    Ok(ArxivClient::new().with_timeout(Duration::from_secs(cli.timeout_secs))?)
}

fn create_documents_dir(dir: &Path) -> anyhow::Result<()> {
    if dir.is_file() {
        bail!("{} exists and is not a directory", dir.display());
    }
    std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    println!("Created directory: {}", dir.display());
    println!("Please add your PDF documents to this directory.");
    Ok(())
}
