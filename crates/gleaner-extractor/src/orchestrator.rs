//! Concurrent extraction across chunks and documents
//!
//! Each document runs in its own task and fans out one task per chunk. All
//! chunk tasks of a document are awaited before its result is produced. If
//! any chunk fails, the document fails with the first recorded error and no
//! partial graph is returned. Sibling chunks are not cancelled by a failure;
//! only the caller's cancellation token stops in-flight work.

use crate::error::ExtractorError;
use crate::merge::GraphMerger;
use crate::types::{ChunkExtraction, DocumentGraph, ExtractionMetadata};
use crate::worker::ExtractionWorker;
use gleaner_domain::{Chunk, ChunkId, ModelClient, PromptArgs, PromptRenderer};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Results gathered from chunk tasks, in completion order
#[derive(Default)]
struct Collector {
    extractions: Vec<ChunkExtraction>,
    first_error: Option<ExtractorError>,
}

impl Collector {
    fn with_capacity(chunk_count: usize) -> Self {
        Self {
            extractions: Vec::with_capacity(chunk_count),
            first_error: None,
        }
    }

    fn record(&mut self, chunk_id: ChunkId, result: Result<ChunkExtraction, ExtractorError>) {
        match result {
            Ok(extraction) => self.extractions.push(extraction),
            Err(e) => self.record_failure(ExtractorError::worker(chunk_id, e)),
        }
    }

    fn record_failure(&mut self, error: ExtractorError) {
        if self.first_error.is_none() {
            self.first_error = Some(error);
        } else {
            debug!(error = %error, "Additional chunk failure ignored");
        }
    }
}

/// Handle to one document's extraction running in the background
pub struct DocumentExtraction {
    index: usize,
    handle: JoinHandle<Result<DocumentGraph, ExtractorError>>,
}

impl DocumentExtraction {
    /// Position of the document in the input
    pub fn index(&self) -> usize {
        self.index
    }

    /// True if the document task has finished
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the document task; `wait` then reports a join error
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the merged graph
    pub async fn wait(self) -> Result<DocumentGraph, ExtractorError> {
        self.handle
            .await
            .map_err(|e| ExtractorError::TaskJoin(e.to_string()))?
    }
}

/// Runs extraction workers concurrently and merges their graphs
pub struct ExtractionOrchestrator<M, R> {
    worker: Arc<ExtractionWorker<M, R>>,
    merger: GraphMerger,
    max_concurrency: Option<NonZeroUsize>,
}

impl<M, R> Clone for ExtractionOrchestrator<M, R> {
    fn clone(&self) -> Self {
        Self {
            worker: Arc::clone(&self.worker),
            merger: self.merger.clone(),
            max_concurrency: self.max_concurrency,
        }
    }
}

impl<M, R> ExtractionOrchestrator<M, R>
where
    M: ModelClient + 'static,
    R: PromptRenderer + 'static,
{
    /// Create an orchestrator around a worker
    ///
    /// `max_concurrency` bounds the chunks extracted at once per document;
    /// `None` runs every chunk concurrently. A bound of zero is not
    /// representable, so every document always makes progress.
    pub fn new(worker: ExtractionWorker<M, R>, max_concurrency: Option<NonZeroUsize>) -> Self {
        Self {
            worker: Arc::new(worker),
            merger: GraphMerger::new(),
            max_concurrency,
        }
    }

    /// Replace the graph merger
    pub fn with_merger(mut self, merger: GraphMerger) -> Self {
        self.merger = merger;
        self
    }

    /// Start extraction for every document and return one handle per document
    ///
    /// Must be called from within a Tokio runtime. Handles are returned in
    /// input order and complete independently.
    pub fn extract_all(
        &self,
        documents: Vec<Vec<Chunk>>,
        prompt_args: &PromptArgs,
        cancel: &CancellationToken,
    ) -> Vec<DocumentExtraction> {
        info!(documents = documents.len(), "Starting extraction");

        documents
            .into_iter()
            .enumerate()
            .map(|(index, chunks)| {
                let orchestrator = self.clone();
                let prompt_args = prompt_args.clone();
                let cancel = cancel.clone();
                let handle = tokio::spawn(async move {
                    orchestrator
                        .extract_document(chunks, prompt_args, cancel)
                        .await
                });
                DocumentExtraction { index, handle }
            })
            .collect()
    }

    /// Extract and merge one document's chunks
    pub async fn extract_document(
        &self,
        chunks: Vec<Chunk>,
        prompt_args: PromptArgs,
        cancel: CancellationToken,
    ) -> Result<DocumentGraph, ExtractorError> {
        let start = Instant::now();
        let chunk_count = chunks.len();
        let collector = Arc::new(Mutex::new(Collector::with_capacity(chunk_count)));
        let semaphore = self
            .max_concurrency
            .map(|n| Arc::new(Semaphore::new(n.get())));
        let mut tasks = JoinSet::new();

        for chunk in chunks {
            let worker = Arc::clone(&self.worker);
            let collector = Arc::clone(&collector);
            let semaphore = semaphore.clone();
            let prompt_args = prompt_args.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => match semaphore.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(e) => {
                            collector
                                .lock()
                                .await
                                .record(chunk.id, Err(ExtractorError::TaskJoin(e.to_string())));
                            return;
                        }
                    },
                    None => None,
                };

                let result = worker.extract(&chunk, prompt_args, &cancel).await;
                collector.lock().await.record(chunk.id, result);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                collector
                    .lock()
                    .await
                    .record_failure(ExtractorError::TaskJoin(e.to_string()));
            }
        }

        let collected = std::mem::take(&mut *collector.lock().await);
        if let Some(error) = collected.first_error {
            warn!(chunk_id = ?error.chunk_id(), error = %error, "Document extraction failed");
            return Err(error);
        }

        let gleaning_rounds = collected.extractions.iter().map(|e| e.gleaning_rounds).sum();
        let raw_entity_count = collected
            .extractions
            .iter()
            .map(|e| e.graph.entities.len())
            .sum();
        let graph = self
            .merger
            .merge(collected.extractions.into_iter().map(|e| e.graph));

        let metadata = ExtractionMetadata {
            chunk_count,
            gleaning_rounds,
            raw_entity_count,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            chunks = chunk_count,
            entities = graph.entities.len(),
            relationships = graph.relationships.len(),
            time_ms = metadata.processing_time_ms,
            "Document extraction complete"
        );

        Ok(DocumentGraph { graph, metadata })
    }
}
