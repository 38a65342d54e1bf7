//! Per-chunk extraction with gleaning

use crate::error::ExtractorError;
use crate::normalize::EntityTypeSet;
use crate::prompt::{
    CONTINUE_TEMPLATE, EXAMPLE_ARG, EXTRACTION_EXAMPLE, EXTRACTION_TEMPLATE,
    GLEANING_DONE_TEMPLATE, INPUT_TEXT_ARG,
};
use crate::types::ChunkExtraction;
use gleaner_domain::{
    Chunk, GleaningStatus, Graph, Message, ModelClient, ModelRequest, ModelResponse,
    PromptArgs, PromptRenderer, ResponseKind,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Extracts a graph from one chunk, then gleans for missed entities
///
/// Every call keeps its own conversation history, so one worker can be
/// shared across concurrent chunks.
pub struct ExtractionWorker<M, R> {
    model: Arc<M>,
    renderer: Arc<R>,
    entity_types: EntityTypeSet,
    max_gleaning_steps: usize,
}

impl<M, R> ExtractionWorker<M, R>
where
    M: ModelClient,
    R: PromptRenderer,
{
    /// Create a new worker
    pub fn new(
        model: Arc<M>,
        renderer: Arc<R>,
        entity_types: EntityTypeSet,
        max_gleaning_steps: usize,
    ) -> Self {
        Self {
            model,
            renderer,
            entity_types,
            max_gleaning_steps,
        }
    }

    /// Allowed entity types
    pub fn entity_types(&self) -> &EntityTypeSet {
        &self.entity_types
    }

    /// Extract a graph from `chunk`
    ///
    /// `prompt_args` is extended with the chunk text and the worked example.
    /// Entity types are normalized and every relation is tagged with the
    /// chunk id before returning.
    pub async fn extract(
        &self,
        chunk: &Chunk,
        mut prompt_args: PromptArgs,
        cancel: &CancellationToken,
    ) -> Result<ChunkExtraction, ExtractorError> {
        prompt_args.insert(INPUT_TEXT_ARG, chunk.content.clone());
        prompt_args.insert(EXAMPLE_ARG, EXTRACTION_EXAMPLE);

        let mut history = Vec::new();
        let prompt = self.renderer.render(EXTRACTION_TEMPLATE, &prompt_args)?;
        let mut graph = self.request_graph(&mut history, prompt, cancel).await?;

        let gleaning_rounds = self.glean(&mut graph, &mut history, cancel).await?;

        self.entity_types.apply(&mut graph);
        for relation in graph.all_relations_mut() {
            relation.chunks.push(chunk.id);
        }

        debug!(
            chunk_id = %chunk.id,
            entities = graph.entities.len(),
            relationships = graph.relationships.len(),
            gleaning_rounds,
            "Extracted chunk"
        );

        Ok(ChunkExtraction {
            chunk_id: chunk.id,
            graph,
            gleaning_rounds,
        })
    }

    /// Ask for missed entities until the model says done or the round limit
    /// is reached; returns the number of rounds performed
    async fn glean(
        &self,
        graph: &mut Graph,
        history: &mut Vec<Message>,
        cancel: &CancellationToken,
    ) -> Result<usize, ExtractorError> {
        let args = PromptArgs::new();
        let mut rounds = 0;

        while rounds < self.max_gleaning_steps {
            let prompt = self.renderer.render(CONTINUE_TEMPLATE, &args)?;
            let gleaned = self.request_graph(history, prompt, cancel).await?;
            graph.extend(gleaned);
            rounds += 1;

            let prompt = self.renderer.render(GLEANING_DONE_TEMPLATE, &args)?;
            let status = self.request_status(history, prompt, cancel).await?;
            if status.is_done() {
                break;
            }
        }

        Ok(rounds)
    }

    async fn request_graph(
        &self,
        history: &mut Vec<Message>,
        prompt: String,
        cancel: &CancellationToken,
    ) -> Result<Graph, ExtractorError> {
        match self.send(history, prompt, ResponseKind::Graph, cancel).await? {
            ModelResponse::Graph(graph) => Ok(graph),
            other => Err(ExtractorError::UnexpectedResponse {
                expected: ResponseKind::Graph,
                actual: other.kind(),
            }),
        }
    }

    async fn request_status(
        &self,
        history: &mut Vec<Message>,
        prompt: String,
        cancel: &CancellationToken,
    ) -> Result<GleaningStatus, ExtractorError> {
        match self
            .send(history, prompt, ResponseKind::GleaningStatus, cancel)
            .await?
        {
            ModelResponse::GleaningStatus(status) => Ok(status),
            other => Err(ExtractorError::UnexpectedResponse {
                expected: ResponseKind::GleaningStatus,
                actual: other.kind(),
            }),
        }
    }

    /// Send one prompt with the conversation so far, racing cancellation
    async fn send(
        &self,
        history: &mut Vec<Message>,
        prompt: String,
        kind: ResponseKind,
        cancel: &CancellationToken,
    ) -> Result<ModelResponse, ExtractorError> {
        let request = ModelRequest::new(prompt.clone(), kind).with_history(history.clone());

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ExtractorError::Cancelled),
            response = self.model.send(request) => response?,
        };

        history.push(Message::user(prompt));
        history.push(Message::model(transcript(&response)));
        Ok(response)
    }
}

/// Text recorded in history for a model turn
fn transcript(response: &ModelResponse) -> String {
    match response {
        ModelResponse::Text(text) => text.clone(),
        ModelResponse::Graph(graph) => serde_json::to_string(graph).unwrap_or_default(),
        ModelResponse::GleaningStatus(status) => serde_json::to_string(status).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{DOMAIN_ARG, ENTITY_TYPES_ARG, EXAMPLE_QUERIES_ARG};
    use crate::TemplateRenderer;
    use gleaner_domain::{Metadata, ModelError, Role, UNKNOWN_ENTITY_TYPE};
    use gleaner_llm::MockProvider;

    const SCROOGE_GRAPH: &str = r#"{
        "entities": [
            {"name": "Scrooge", "type": "character", "description": "A miser"},
            {"name": "Counting-house", "type": "building"}
        ],
        "relationships": [
            {"source": "Scrooge", "target": "Counting-house", "description": "works in"}
        ],
        "other_relationships": [
            {"source": "Scrooge", "target": "Fog"}
        ]
    }"#;

    fn args() -> PromptArgs {
        PromptArgs::new()
            .with(DOMAIN_ARG, "fiction")
            .with(EXAMPLE_QUERIES_ARG, "Who is Scrooge?")
            .with(ENTITY_TYPES_ARG, "CHARACTER,PLACE")
    }

    fn worker(model: MockProvider, max_gleaning_steps: usize) -> ExtractionWorker<MockProvider, TemplateRenderer> {
        ExtractionWorker::new(
            Arc::new(model),
            Arc::new(TemplateRenderer::with_defaults()),
            EntityTypeSet::new(["Character", "Place"]),
            max_gleaning_steps,
        )
    }

    fn chunk(content: &str) -> Chunk {
        Chunk::new(content, Metadata::new())
    }

    #[tokio::test]
    async fn test_extract_normalizes_and_tags() {
        let model = MockProvider::with_graph(SCROOGE_GRAPH);
        let chunk = chunk("Scrooge sat in his counting-house.");

        let result = worker(model.clone(), 0)
            .extract(&chunk, args(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.chunk_id, chunk.id);
        assert_eq!(result.gleaning_rounds, 0);
        assert_eq!(result.graph.entities[0].entity_type, "CHARACTER");
        assert_eq!(result.graph.entities[1].entity_type, UNKNOWN_ENTITY_TYPE);
        assert_eq!(result.graph.relationships[0].chunks, vec![chunk.id]);
        assert_eq!(result.graph.other_relationships[0].chunks, vec![chunk.id]);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_prompt_contains_chunk_and_example() {
        let model = MockProvider::new();
        let chunk = chunk("Marley was dead.");
        let caller_args = args();

        worker(model.clone(), 0)
            .extract(&chunk, caller_args.clone(), &CancellationToken::new())
            .await
            .unwrap();

        let prompt = &model.requests()[0].prompt;
        assert!(prompt.contains("Marley was dead."));
        assert!(prompt.contains("Bob Cratchit"));
        assert!(!caller_args.contains_key(INPUT_TEXT_ARG));
    }

    #[tokio::test]
    async fn test_gleaning_stops_on_done() {
        let model = MockProvider::new()
            .push_response(ResponseKind::GleaningStatus, r#"{"status": "continue"}"#);

        let result = worker(model.clone(), 5)
            .extract(&chunk("text"), args(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.gleaning_rounds, 2);
        assert_eq!(model.calls_for(ResponseKind::Graph), 3);
        assert_eq!(model.calls_for(ResponseKind::GleaningStatus), 2);
    }

    #[tokio::test]
    async fn test_gleaning_respects_step_limit() {
        let model = MockProvider::new()
            .with_default(ResponseKind::GleaningStatus, r#"{"status": "continue"}"#);

        let result = worker(model.clone(), 3)
            .extract(&chunk("text"), args(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.gleaning_rounds, 3);
        assert_eq!(model.calls_for(ResponseKind::Graph), 4);
        assert_eq!(model.calls_for(ResponseKind::GleaningStatus), 3);
    }

    #[tokio::test]
    async fn test_gleaned_entities_are_appended() {
        let model = MockProvider::new()
            .respond_when_prompt_contains(
                "MANY entities",
                ResponseKind::Graph,
                r#"{"entities": [{"name": "Marley", "type": "Character"}]}"#,
            )
            .push_response(
                ResponseKind::Graph,
                r#"{"entities": [{"name": "Scrooge", "type": "Character"}]}"#,
            );

        let result = worker(model, 1)
            .extract(&chunk("text"), args(), &CancellationToken::new())
            .await
            .unwrap();

        let names: Vec<&str> = result.graph.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Scrooge", "Marley"]);
    }

    #[tokio::test]
    async fn test_history_carries_conversation() {
        let model = MockProvider::new();

        worker(model.clone(), 1)
            .extract(&chunk("text"), args(), &CancellationToken::new())
            .await
            .unwrap();

        let requests = model.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].history.is_empty());
        assert_eq!(requests[1].history.len(), 2);
        assert_eq!(requests[1].history[0].role, Role::User);
        assert_eq!(requests[1].history[1].role, Role::Model);
        assert_eq!(requests[2].history.len(), 4);
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let model = MockProvider::new()
            .with_default_error(ResponseKind::Graph, ModelError::Invocation("down".to_string()));

        let err = worker(model, 1)
            .extract(&chunk("text"), args(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractorError::ModelInvocation(_)));
    }

    #[tokio::test]
    async fn test_malformed_graph_is_decode_error() {
        let model = MockProvider::with_graph("not json");

        let err = worker(model, 0)
            .extract(&chunk("text"), args(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractorError::ResponseDecode(_)));
    }

    #[tokio::test]
    async fn test_missing_prompt_argument() {
        let model = MockProvider::new();

        let err = worker(model.clone(), 0)
            .extract(&chunk("text"), PromptArgs::new(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractorError::TemplateRender(_)));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let model = MockProvider::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = worker(model, 0)
            .extract(&chunk("text"), args(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractorError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_slow_model() {
        let model = MockProvider::new().with_delay(std::time::Duration::from_secs(30));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = worker(model, 0)
            .extract(&chunk("text"), args(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractorError::Cancelled));
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }
}
