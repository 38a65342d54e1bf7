//! Gleaner Domain Layer
//!
//! This crate contains the data model shared by every Gleaner crate and the
//! trait interfaces for the collaborators the extraction pipeline depends on.
//!
//! ## Key Concepts
//!
//! - **Document**: Raw input text plus an open metadata map
//! - **Chunk**: A bounded slice of a document, identified by the hash of its content
//! - **Graph**: Entities and relationships extracted from a chunk or a whole document
//! - **Gleaning**: Re-querying the model to recover entities missed in the first pass
//!
//! ## Architecture
//!
//! - Pure data types and value objects
//! - No I/O; model clients and prompt renderers live behind traits
//! - Infrastructure implementations live in other crates (`gleaner-llm`,
//!   `gleaner-extractor`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod document;
pub mod graph;
pub mod prompt;
pub mod traits;

// Re-exports for convenience
pub use chunk::{Chunk, ChunkId};
pub use document::{Document, Metadata};
pub use graph::{Entity, GleaningStatus, Graph, Relation, Status, UNKNOWN_ENTITY_TYPE};
pub use prompt::PromptArgs;
pub use traits::{
    Message, ModelClient, ModelError, ModelRequest, ModelResponse, PromptRenderer,
    RenderError, ResponseKind, Role,
};
