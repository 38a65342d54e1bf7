//! Error types for the Extractor

use gleaner_domain::{ChunkId, ModelError, RenderError, ResponseKind};
use thiserror::Error;

/// Errors that can occur during chunking and extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The model call failed (network, rate limit, auth, missing model)
    #[error("Model invocation error: {0}")]
    ModelInvocation(String),

    /// The model output did not match the requested shape
    #[error("Response decode error: {0}")]
    ResponseDecode(String),

    /// Prompt formatting failed
    #[error("Template render error: {0}")]
    TemplateRender(#[from] RenderError),

    /// The model client answered with a different shape than requested
    #[error("Unexpected response: expected {expected:?}, got {actual:?}")]
    UnexpectedResponse {
        /// Requested kind
        expected: ResponseKind,
        /// Returned kind
        actual: ResponseKind,
    },

    /// The caller's cancellation token fired
    #[error("Extraction cancelled")]
    Cancelled,

    /// Extraction of one chunk failed
    #[error("Worker for chunk {chunk_id} failed: {source}")]
    Worker {
        /// Chunk being processed
        chunk_id: ChunkId,
        /// Underlying failure
        source: Box<ExtractorError>,
    },

    /// A worker or document task panicked or was aborted
    #[error("Task join error: {0}")]
    TaskJoin(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Tag `source` with the chunk it came from
    pub fn worker(chunk_id: ChunkId, source: ExtractorError) -> Self {
        ExtractorError::Worker {
            chunk_id,
            source: Box::new(source),
        }
    }

    /// The failing chunk, if this is a worker failure
    pub fn chunk_id(&self) -> Option<ChunkId> {
        match self {
            ExtractorError::Worker { chunk_id, .. } => Some(*chunk_id),
            _ => None,
        }
    }

    /// The innermost error, unwrapping worker tags
    pub fn root_cause(&self) -> &ExtractorError {
        match self {
            ExtractorError::Worker { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// True if the failure was caused by cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), ExtractorError::Cancelled)
    }
}

impl From<ModelError> for ExtractorError {
    fn from(e: ModelError) -> Self {
        if e.is_decode() {
            ExtractorError::ResponseDecode(e.to_string())
        } else {
            ExtractorError::ModelInvocation(e.to_string())
        }
    }
}
