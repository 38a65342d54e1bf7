//! Knowledge graph types produced by extraction
//!
//! Field names match the JSON shape the model is asked to populate, so the
//! same types are used for decoding model output and for emitting results.

use crate::chunk::ChunkId;
use serde::{Deserialize, Serialize};

/// Sentinel type assigned to entities whose type is not in the allowed set
pub const UNKNOWN_ENTITY_TYPE: &str = "UNKNOWN";

/// An entity (graph node)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity name as written by the model
    pub name: String,

    /// Entity type, normalized against the allowed set after extraction
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Free-text description
    #[serde(default)]
    pub description: String,
}

impl Entity {
    /// Create a new entity
    pub fn new(
        name: impl Into<String>,
        entity_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            description: description.into(),
        }
    }
}

/// A directed relationship (graph edge) between two entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Source entity name
    pub source: String,

    /// Target entity name
    pub target: String,

    /// Free-text description of the relationship
    #[serde(default)]
    pub description: String,

    /// Ids of every chunk that contributed evidence, in encounter order
    #[serde(default)]
    pub chunks: Vec<ChunkId>,
}

impl Relation {
    /// Create a new relation with no provenance yet
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            description: description.into(),
            chunks: Vec::new(),
        }
    }
}

/// Entities and relationships for a chunk or a whole document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    /// Graph nodes
    #[serde(default)]
    pub entities: Vec<Entity>,

    /// Relationships between entities
    #[serde(default)]
    pub relationships: Vec<Relation>,

    /// Relationships the model reports outside the main set
    #[serde(default)]
    pub other_relationships: Vec<Relation>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Append everything from `other` to this graph
    pub fn extend(&mut self, other: Graph) {
        self.entities.extend(other.entities);
        self.relationships.extend(other.relationships);
        self.other_relationships.extend(other.other_relationships);
    }

    /// Iterate mutably over `relationships` followed by `other_relationships`
    pub fn all_relations_mut(&mut self) -> impl Iterator<Item = &mut Relation> {
        self.relationships
            .iter_mut()
            .chain(self.other_relationships.iter_mut())
    }

    /// True if the graph has no entities and no relationships
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
            && self.relationships.is_empty()
            && self.other_relationships.is_empty()
    }
}

/// Model verdict at the end of a gleaning round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Extraction is complete
    Done,
    /// More entities remain to be added
    Continue,
}

/// Control signal returned by the "is extraction complete" prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GleaningStatus {
    /// The model's verdict
    pub status: Status,
}

impl GleaningStatus {
    /// A `done` status
    pub fn done() -> Self {
        Self { status: Status::Done }
    }

    /// A `continue` status
    pub fn continuing() -> Self {
        Self {
            status: Status::Continue,
        }
    }

    /// True if the model reports extraction is complete
    pub fn is_done(&self) -> bool {
        self.status == Status::Done
    }
}
