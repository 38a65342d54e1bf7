//! Result types for extraction

use gleaner_domain::{ChunkId, Graph};
use serde::{Deserialize, Serialize};

/// Graph extracted from a single chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkExtraction {
    /// Chunk the graph was extracted from
    pub chunk_id: ChunkId,

    /// Normalized graph with provenance attached to every relation
    pub graph: Graph,

    /// Gleaning rounds actually performed
    pub gleaning_rounds: usize,
}

/// Merged graph for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentGraph {
    /// The merged knowledge graph
    #[serde(flatten)]
    pub graph: Graph,

    /// Metadata about the extraction
    pub metadata: ExtractionMetadata,
}

/// Metadata about an extraction operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Number of chunks extracted
    pub chunk_count: usize,

    /// Total gleaning rounds across all chunks
    pub gleaning_rounds: usize,

    /// Entities before merging
    pub raw_entity_count: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
