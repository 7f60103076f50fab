//! End-to-end tests for the question-answering pipeline.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{BagOfWordsEmbedder, ScriptedModel, UnreachableEmbedder, context_of, is_reduce};
use docqa_rag::{
    Chunk, Chunker, Document, InMemoryVectorIndex, MapReduceSynthesizer, NOT_FOUND,
    NOT_INITIALIZED, QaConfig, QaError, QaSystem, RecursiveChunker, VectorIndex,
};

const PAPER: &str = "Abstract. We evaluate a transformer classifier on clinical notes.\n\n\
Results. The model achieved an F1-score of 0.87 on the test set, as reported in Table 2.";
const RELATED: &str = "Related work. Earlier systems relied on hand-written rules and keyword lists.";

fn corpus() -> Vec<Document> {
    vec![Document::new("paper.pdf", PAPER), Document::new("related.pdf", RELATED)]
}

fn qa_system(model: Arc<ScriptedModel>, config: QaConfig) -> QaSystem {
    QaSystem::builder()
        .config(config)
        .embedding_provider(Arc::new(BagOfWordsEmbedder::new(256)))
        .language_model(model)
        .build()
        .unwrap()
}

fn chunk(source: &str, index: usize, text: &str) -> Chunk {
    Chunk {
        id: format!("{source}_{index}"),
        source: source.to_string(),
        index,
        start: 0,
        text: text.to_string(),
        metadata: Default::default(),
    }
}

#[tokio::test]
async fn answers_metric_question_with_exact_number() {
    let model = Arc::new(ScriptedModel::extractive("0.87"));
    let mut qa = qa_system(Arc::clone(&model), QaConfig::default());

    let report = qa.ingest(&corpus()).await.unwrap();
    assert_eq!(report.document_count, 2);
    assert!(report.chunk_count >= 2);

    let answer = qa.ask("What is the reported F1-score?").await.unwrap();
    assert!(answer.text.contains("0.87"), "answer was: {}", answer.text);
    assert_eq!(answer.partial_answers.len(), 2);
    assert!(answer.sources.iter().any(|s| s.source == "paper.pdf"));
    // two map calls and one reduce call
    assert_eq!(model.call_count(), 3);
}

#[tokio::test]
async fn never_built_index_reports_not_initialized() {
    let model = Arc::new(ScriptedModel::extractive("0.87"));
    let qa = qa_system(Arc::clone(&model), QaConfig::default());

    let err = qa.ask("What is the reported F1-score?").await.unwrap_err();
    assert!(matches!(err, QaError::IndexUnavailable));
    assert_eq!(qa.ask_or_explain("What is the reported F1-score?").await, NOT_INITIALIZED);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn ingesting_only_empty_documents_leaves_index_unbuilt() {
    let model = Arc::new(ScriptedModel::extractive("0.87"));
    let mut qa = qa_system(model, QaConfig::default());

    let report = qa.ingest(&[Document::new("scan.pdf", "  \n ")]).await.unwrap();
    assert_eq!(report.skipped, vec!["scan.pdf".to_string()]);
    assert_eq!(report.chunk_count, 0);
    assert_eq!(qa.ask_or_explain("anything?").await, NOT_INITIALIZED);
}

#[tokio::test(start_paused = true)]
async fn reduce_timeout_is_contained_as_error_text() {
    let model = Arc::new(
        ScriptedModel::extractive("0.87")
            .with_delay(|prompt| if is_reduce(prompt) { Duration::from_secs(600) } else { Duration::ZERO }),
    );
    let config = QaConfig::builder().service_timeout(Duration::from_secs(5)).build().unwrap();
    let mut qa = qa_system(Arc::clone(&model), config);
    qa.ingest(&corpus()).await.unwrap();

    let err = qa.ask("What is the reported F1-score?").await.unwrap_err();
    assert!(matches!(err, QaError::ServiceTimeout { .. }), "unexpected error: {err:?}");

    let reply = qa.ask_or_explain("What is the reported F1-score?").await;
    assert!(reply.starts_with("An error occurred"), "reply was: {reply}");
}

#[tokio::test]
async fn embedding_failure_during_question_is_contained() {
    let model = Arc::new(ScriptedModel::extractive("0.87"));
    let index = Arc::new(InMemoryVectorIndex::new());
    index.add(Vec::new()).await.unwrap();
    let qa = QaSystem::builder()
        .embedding_provider(Arc::new(UnreachableEmbedder))
        .language_model(model)
        .vector_index(index)
        .build()
        .unwrap();

    let reply = qa.ask_or_explain("What is the reported F1-score?").await;
    assert!(reply.starts_with("An error occurred"));
    assert!(reply.contains("connection refused"));
}

#[tokio::test]
async fn ingestion_failure_leaves_index_unbuilt() {
    let model = Arc::new(ScriptedModel::extractive("0.87"));
    let mut qa = QaSystem::builder()
        .embedding_provider(Arc::new(UnreachableEmbedder))
        .language_model(model)
        .build()
        .unwrap();

    assert!(qa.ingest(&corpus()).await.is_err());
    assert!(!qa.vector_index().is_built().await);
}

#[tokio::test]
async fn built_but_empty_index_answers_not_found_without_model_calls() {
    let model = Arc::new(ScriptedModel::extractive("0.87"));
    let index = Arc::new(InMemoryVectorIndex::new());
    index.add(Vec::new()).await.unwrap();
    let qa = QaSystem::builder()
        .embedding_provider(Arc::new(BagOfWordsEmbedder::new(64)))
        .language_model(Arc::clone(&model) as _)
        .vector_index(index)
        .build()
        .unwrap();

    let answer = qa.ask("What is the reported F1-score?").await.unwrap();
    assert_eq!(answer.text, NOT_FOUND);
    assert!(answer.sources.is_empty());
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn reduce_runs_even_when_every_partial_is_not_found() {
    let model = Arc::new(ScriptedModel::extractive("accuracy of 99%"));
    let mut qa = qa_system(Arc::clone(&model), QaConfig::default());
    qa.ingest(&corpus()).await.unwrap();

    let answer = qa.ask("What accuracy was reported?").await.unwrap();
    assert_eq!(answer.text, NOT_FOUND);
    assert!(answer.partial_answers.iter().all(|a| a == NOT_FOUND));

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(is_reduce(prompts.last().unwrap()));
}

#[tokio::test]
async fn answering_is_repeatable() {
    let model = Arc::new(ScriptedModel::extractive("0.87"));
    let mut qa = qa_system(model, QaConfig::default());
    qa.ingest(&corpus()).await.unwrap();

    let first = qa.ask("What is the reported F1-score?").await.unwrap();
    let second = qa.ask("What is the reported F1-score?").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn partial_answers_keep_retrieval_rank_order() {
    // Earlier ranks answer slower, so completion order is the reverse of rank order.
    let model = Arc::new(
        ScriptedModel::new(|prompt| Ok(if is_reduce(prompt) { "done".into() } else { context_of(prompt).to_string() }))
            .with_delay(|prompt| {
                let context = context_of(prompt);
                let rank: u64 = context.trim_start_matches("chunk ").parse().unwrap_or(0);
                Duration::from_millis(1000 - rank * 100)
            }),
    );
    let chunks: Vec<Chunk> = (0..5).map(|i| chunk("doc.pdf", i, &format!("chunk {i}"))).collect();
    let config = QaConfig::builder().map_concurrency(5).build().unwrap();
    let synthesizer = MapReduceSynthesizer::new(Arc::clone(&model) as _, &config);

    let answer = synthesizer.synthesize("order?", &chunks).await.unwrap();
    assert_eq!(answer.partial_answers, vec!["chunk 0", "chunk 1", "chunk 2", "chunk 3", "chunk 4"]);
    assert_eq!(answer.text, "done");

    let reduce_prompt = model.prompts().pop().unwrap();
    assert!(reduce_prompt.contains("chunk 0\n\nchunk 1\n\nchunk 2\n\nchunk 3\n\nchunk 4"));
}

#[tokio::test(start_paused = true)]
async fn map_calls_stay_within_concurrency_limit() {
    let model = Arc::new(
        ScriptedModel::new(|_| Ok("partial".to_string())).with_delay(|_| Duration::from_millis(200)),
    );
    let chunks: Vec<Chunk> = (0..5).map(|i| chunk("doc.pdf", i, &format!("chunk {i}"))).collect();
    let config = QaConfig::builder().map_concurrency(2).build().unwrap();
    let synthesizer = MapReduceSynthesizer::new(Arc::clone(&model) as _, &config);

    let answer = synthesizer.synthesize("limit?", &chunks).await.unwrap();
    assert_eq!(answer.partial_answers.len(), 5);
    // five map calls and one reduce call
    assert_eq!(model.call_count(), 6);
    assert_eq!(model.peak_in_flight(), 2);
}

#[tokio::test]
async fn empty_reduce_output_falls_back_to_not_found() {
    let model = Arc::new(ScriptedModel::new(|prompt| {
        Ok(if is_reduce(prompt) { "   ".to_string() } else { "partial".to_string() })
    }));
    let synthesizer = MapReduceSynthesizer::new(model, &QaConfig::default());
    let answer = synthesizer.synthesize("q?", &[chunk("a.pdf", 0, "text")]).await.unwrap();
    assert_eq!(answer.text, NOT_FOUND);
    assert_eq!(answer.partial_answers, vec!["partial"]);
}

#[tokio::test]
async fn map_failure_propagates_to_caller() {
    let model = Arc::new(ScriptedModel::new(|_| Err(QaError::service("scripted", "rate limited"))));
    let synthesizer = MapReduceSynthesizer::new(model, &QaConfig::default());
    let err = synthesizer.synthesize("q?", &[chunk("a.pdf", 0, "text")]).await.unwrap_err();
    assert!(matches!(err, QaError::Service { .. }));
}

#[tokio::test]
async fn chunk_ordinals_restart_for_each_source() {
    let paragraph = "Transformers process tokens in parallel using attention. ".repeat(30);
    let chunker = RecursiveChunker::new(600, 100);

    let mut all = Vec::new();
    for source in ["a.pdf", "b.pdf"] {
        let chunks = chunker.chunk(&Document::new(source, paragraph.clone()));
        assert!(chunks.len() > 2);
        let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, (0..chunks.len()).collect::<Vec<_>>());
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 600));
        all.extend(chunks);
    }

    let model = Arc::new(ScriptedModel::extractive("attention"));
    let mut qa = qa_system(model, QaConfig::default());
    let report = qa
        .ingest(&[Document::new("a.pdf", paragraph.clone()), Document::new("b.pdf", paragraph)])
        .await
        .unwrap();
    assert_eq!(report.chunk_count, all.len());
    assert_eq!(qa.vector_index().len().await, all.len());
}

#[tokio::test]
async fn shutdown_releases_services() {
    let model = Arc::new(ScriptedModel::extractive("0.87"));
    let qa = qa_system(model, QaConfig::default());
    qa.shutdown().await.unwrap();
}
