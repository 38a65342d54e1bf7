//! Core Extractor implementation

use crate::chunking::ChunkingService;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::normalize::EntityTypeSet;
use crate::orchestrator::{DocumentExtraction, ExtractionOrchestrator};
use crate::prompt::{TemplateRenderer, ENTITY_TYPES_ARG};
use crate::worker::ExtractionWorker;
use gleaner_domain::{Chunk, Document, ModelClient, PromptArgs, PromptRenderer};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The Extractor turns documents into knowledge graphs
pub struct Extractor<M, R = TemplateRenderer> {
    model: Arc<M>,
    renderer: Arc<R>,
    chunking: ChunkingService,
    config: ExtractorConfig,
}

impl<M> Extractor<M, TemplateRenderer>
where
    M: ModelClient + 'static,
{
    /// Create a new Extractor with the built-in prompt templates
    pub fn new(model: M, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        Self::with_renderer(model, TemplateRenderer::with_defaults(), config)
    }
}

impl<M, R> Extractor<M, R>
where
    M: ModelClient + 'static,
    R: PromptRenderer + 'static,
{
    /// Create a new Extractor with a custom prompt renderer
    pub fn with_renderer(model: M, renderer: R, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate()?;
        let chunking = ChunkingService::new(&config.chunking)?;

        Ok(Self {
            model: Arc::new(model),
            renderer: Arc::new(renderer),
            chunking,
            config,
        })
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Split documents into deduplicated chunks, one list per document
    pub fn chunk(&self, documents: &[Document]) -> Vec<Vec<Chunk>> {
        let chunked = self.chunking.extract(documents);
        info!(
            documents = documents.len(),
            chunks = chunked.iter().map(Vec::len).sum::<usize>(),
            "Chunked documents"
        );
        chunked
    }

    /// Chunk and extract documents
    ///
    /// If `prompt_args` has no `entity_types`, the canonical allowed types
    /// are supplied. Must be called from within a Tokio runtime.
    pub fn extract<S>(
        &self,
        documents: &[Document],
        prompt_args: &PromptArgs,
        entity_types: &[S],
        cancel: &CancellationToken,
    ) -> Vec<DocumentExtraction>
    where
        S: AsRef<str>,
    {
        let chunks = self.chunk(documents);
        self.extract_chunks(chunks, prompt_args, entity_types, cancel)
    }

    /// Extract already-chunked documents
    pub fn extract_chunks<S>(
        &self,
        documents: Vec<Vec<Chunk>>,
        prompt_args: &PromptArgs,
        entity_types: &[S],
        cancel: &CancellationToken,
    ) -> Vec<DocumentExtraction>
    where
        S: AsRef<str>,
    {
        let entity_types = EntityTypeSet::new(entity_types);
        let mut prompt_args = prompt_args.clone();
        if !prompt_args.contains_key(ENTITY_TYPES_ARG) {
            prompt_args.insert(ENTITY_TYPES_ARG, entity_types.to_prompt_list());
        }

        let worker = ExtractionWorker::new(
            Arc::clone(&self.model),
            Arc::clone(&self.renderer),
            entity_types,
            self.config.max_gleaning_steps,
        );
        // Validated at construction, so zero never reaches this point
        let max_concurrency = self.config.max_concurrency.and_then(NonZeroUsize::new);
        ExtractionOrchestrator::new(worker, max_concurrency)
            .extract_all(documents, &prompt_args, cancel)
    }
}
