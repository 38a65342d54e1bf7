//! Integration tests for the extraction pipeline

use gleaner_domain::{Chunk, Metadata, ModelError, PromptArgs, ResponseKind, UNKNOWN_ENTITY_TYPE};
use gleaner_extractor::{
    EntityTypeSet, ExtractionOrchestrator, ExtractionWorker, ExtractorError, TemplateRenderer,
    DOMAIN_ARG, ENTITY_TYPES_ARG, EXAMPLE_QUERIES_ARG,
};
use gleaner_llm::MockProvider;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Helper to create an orchestrator over a scripted model
fn create_orchestrator(
    model: MockProvider,
    max_gleaning_steps: usize,
) -> ExtractionOrchestrator<MockProvider, TemplateRenderer> {
    ExtractionOrchestrator::new(create_worker(model, max_gleaning_steps), None)
}

fn create_worker(
    model: MockProvider,
    max_gleaning_steps: usize,
) -> ExtractionWorker<MockProvider, TemplateRenderer> {
    ExtractionWorker::new(
        Arc::new(model),
        Arc::new(TemplateRenderer::with_defaults()),
        EntityTypeSet::new(["Character", "Place", "Object"]),
        max_gleaning_steps,
    )
}

fn prompt_args() -> PromptArgs {
    PromptArgs::new()
        .with(DOMAIN_ARG, "A Christmas Carol")
        .with_list(EXAMPLE_QUERIES_ARG, ["Who visits Scrooge?", "Who was Marley?"])
        .with(ENTITY_TYPES_ARG, "CHARACTER,PLACE,OBJECT")
}

fn chunk(content: &str) -> Chunk {
    Chunk::new(content, Metadata::new())
}

#[tokio::test]
async fn test_merge_across_chunks_keeps_provenance() {
    let model = MockProvider::new()
        .respond_when_prompt_contains(
            "first stave",
            ResponseKind::Graph,
            r#"{
                "entities": [{"name": "Scrooge", "type": "character", "description": "A miser"}],
                "relationships": [{"source": "Scrooge", "target": "Marley", "description": "Partners"}]
            }"#,
        )
        .respond_when_prompt_contains(
            "second stave",
            ResponseKind::Graph,
            r#"{
                "entities": [{"name": "SCROOGE ", "type": "Character", "description": "Sole executor"}],
                "relationships": [{"source": "scrooge", "target": "marley", "description": "Partners"}]
            }"#,
        );
    let orchestrator = create_orchestrator(model, 0);
    let first = chunk("The first stave: Marley was dead.");
    let second = chunk("The second stave: Scrooge signed it.");

    let result = orchestrator
        .extract_document(vec![first.clone(), second.clone()], prompt_args(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.graph.entities.len(), 1);
    assert_eq!(result.graph.entities[0].entity_type, "CHARACTER");
    assert!(result.graph.entities[0].description.contains("A miser"));
    assert!(result.graph.entities[0].description.contains("Sole executor"));

    assert_eq!(result.graph.relationships.len(), 1);
    let chunks = &result.graph.relationships[0].chunks;
    assert_eq!(chunks.len(), 2);
    assert!(chunks.contains(&first.id));
    assert!(chunks.contains(&second.id));
}

#[tokio::test]
async fn test_unknown_types_normalized() {
    let model = MockProvider::with_graph(
        r#"{"entities": [
            {"name": "Counting-house", "type": " place "},
            {"name": "Sword", "type": "Weapon"}
        ]}"#,
    );
    let orchestrator = create_orchestrator(model, 0);

    let result = orchestrator
        .extract_document(vec![chunk("text")], prompt_args(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.graph.entities[0].entity_type, "PLACE");
    assert_eq!(result.graph.entities[1].entity_type, UNKNOWN_ENTITY_TYPE);
}

#[tokio::test]
async fn test_gleaning_terminates_at_step_limit() {
    let model = MockProvider::new()
        .with_default(ResponseKind::GleaningStatus, r#"{"status": "continue"}"#);
    let orchestrator = create_orchestrator(model.clone(), 3);

    let result = orchestrator
        .extract_document(vec![chunk("text")], prompt_args(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.metadata.gleaning_rounds, 3);
    assert_eq!(model.calls_for(ResponseKind::Graph), 4);
    assert_eq!(model.calls_for(ResponseKind::GleaningStatus), 3);
}

#[tokio::test]
async fn test_one_failing_chunk_fails_document() {
    let model = MockProvider::new().fail_when_prompt_contains(
        "bad chunk",
        ResponseKind::Graph,
        ModelError::Invocation("model unavailable".to_string()),
    );
    let orchestrator = create_orchestrator(model.clone(), 0);
    let bad = chunk("a bad chunk");
    let chunks = vec![chunk("good one"), bad.clone(), chunk("good two")];

    let err = orchestrator
        .extract_document(chunks, prompt_args(), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.chunk_id(), Some(bad.id));
    assert!(matches!(err.root_cause(), ExtractorError::ModelInvocation(_)));
    // Siblings still ran to completion
    assert_eq!(model.call_count(), 3);
}

#[tokio::test]
async fn test_decode_failure_fails_document() {
    let model = MockProvider::with_graph("I found some entities!");
    let orchestrator = create_orchestrator(model, 0);

    let err = orchestrator
        .extract_document(vec![chunk("text")], prompt_args(), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractorError::Worker { .. }));
    assert!(matches!(err.root_cause(), ExtractorError::ResponseDecode(_)));
}

#[tokio::test]
async fn test_cancellation_fails_document() {
    let model = MockProvider::new().with_delay(Duration::from_secs(30));
    let orchestrator = create_orchestrator(model, 1);
    let cancel = CancellationToken::new();

    let handles = orchestrator.extract_all(
        vec![vec![chunk("one"), chunk("two")]],
        &prompt_args(),
        &cancel,
    );
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    let err = handles.into_iter().next().unwrap().wait().await.unwrap_err();
    assert!(matches!(err, ExtractorError::Worker { .. }));
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_extract_all_runs_documents_independently() {
    let model = MockProvider::with_graph(r#"{"entities": [{"name": "Fred", "type": "Character"}]}"#);
    let orchestrator = create_orchestrator(model, 0);

    let handles = orchestrator.extract_all(
        vec![vec![chunk("a")], vec![chunk("b"), chunk("c")], Vec::new()],
        &prompt_args(),
        &CancellationToken::new(),
    );
    assert_eq!(handles.len(), 3);

    let mut counts = Vec::new();
    for handle in handles {
        let result = handle.wait().await.unwrap();
        counts.push(result.metadata.chunk_count);
    }
    assert_eq!(counts, vec![1, 2, 0]);
}

#[tokio::test]
async fn test_prompt_args_are_not_shared_between_chunks() {
    let model = MockProvider::new();
    let orchestrator = create_orchestrator(model.clone(), 0);

    orchestrator
        .extract_document(vec![chunk("alpha"), chunk("beta")], prompt_args(), CancellationToken::new())
        .await
        .unwrap();

    let prompts: Vec<String> = model.requests().into_iter().map(|r| r.prompt).collect();
    assert_eq!(prompts.len(), 2);
    assert!(prompts.iter().any(|p| p.contains("alpha") && !p.contains("beta")));
    assert!(prompts.iter().any(|p| p.contains("beta") && !p.contains("alpha")));
}

#[tokio::test]
async fn test_bounded_concurrency_finishes_every_chunk() {
    let model = MockProvider::new().with_delay(Duration::from_millis(5));
    let orchestrator = ExtractionOrchestrator::new(create_worker(model.clone(), 0), NonZeroUsize::new(1));
    let chunks = vec![chunk("one"), chunk("two"), chunk("three")];

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator.extract_document(chunks, prompt_args(), CancellationToken::new()),
    )
    .await
    .expect("bounded extraction should not stall")
    .unwrap();

    assert_eq!(result.metadata.chunk_count, 3);
    assert_eq!(model.call_count(), 3);
}
