//! Merging chunk graphs into one document graph
//!
//! Entities are keyed by name with case and whitespace differences ignored.
//! Relations are keyed by their (source, target) entity keys, so direction
//! matters. The first spelling of a name wins, descriptions accumulate, and
//! relation provenance is concatenated in encounter order.

use gleaner_domain::{Entity, Graph, Relation, UNKNOWN_ENTITY_TYPE};
use indexmap::IndexMap;

/// Identity of an entity for merging purposes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(String);

impl EntityKey {
    /// Key for an entity name: trimmed, inner whitespace collapsed, uppercased
    pub fn from_name(name: &str) -> Self {
        Self(name.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase())
    }

    /// The key text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity of a directed relation for merging purposes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationKey {
    /// Source entity key
    pub source: EntityKey,
    /// Target entity key
    pub target: EntityKey,
}

impl RelationKey {
    /// Key for a relation
    pub fn of(relation: &Relation) -> Self {
        Self {
            source: EntityKey::from_name(&relation.source),
            target: EntityKey::from_name(&relation.target),
        }
    }
}

/// An item being merged, plus the distinct descriptions seen so far
struct Accumulated<T> {
    item: T,
    descriptions: Vec<String>,
}

impl<T> Accumulated<T> {
    fn new(item: T, description: &str) -> Self {
        let mut acc = Self {
            item,
            descriptions: Vec::new(),
        };
        acc.add_description(description);
        acc
    }

    fn add_description(&mut self, description: &str) {
        let description = description.trim();
        if !description.is_empty() && !self.descriptions.iter().any(|d| d == description) {
            self.descriptions.push(description.to_string());
        }
    }
}

/// Combines per-chunk graphs into one deduplicated graph
#[derive(Debug, Clone)]
pub struct GraphMerger {
    description_separator: String,
}

impl GraphMerger {
    /// Create a merger that joins descriptions with newlines
    pub fn new() -> Self {
        Self {
            description_separator: "\n".to_string(),
        }
    }

    /// Set the string placed between merged descriptions
    pub fn with_description_separator(mut self, separator: impl Into<String>) -> Self {
        self.description_separator = separator.into();
        self
    }

    /// Merge graphs in the given order
    ///
    /// Output lists keep first-encounter order, so the same inputs in the
    /// same order always produce the same graph.
    pub fn merge<I>(&self, graphs: I) -> Graph
    where
        I: IntoIterator<Item = Graph>,
    {
        let mut entities: IndexMap<EntityKey, Accumulated<Entity>> = IndexMap::new();
        let mut relationships: IndexMap<RelationKey, Accumulated<Relation>> = IndexMap::new();
        let mut other_relationships: IndexMap<RelationKey, Accumulated<Relation>> = IndexMap::new();

        for graph in graphs {
            for entity in graph.entities {
                merge_entity(&mut entities, entity);
            }
            for relation in graph.relationships {
                merge_relation(&mut relationships, relation);
            }
            for relation in graph.other_relationships {
                merge_relation(&mut other_relationships, relation);
            }
        }

        Graph {
            entities: entities
                .into_values()
                .map(|acc| Entity {
                    description: acc.descriptions.join(&self.description_separator),
                    ..acc.item
                })
                .collect(),
            relationships: self.finish_relations(relationships),
            other_relationships: self.finish_relations(other_relationships),
        }
    }

    fn finish_relations(
        &self,
        relations: IndexMap<RelationKey, Accumulated<Relation>>,
    ) -> Vec<Relation> {
        relations
            .into_values()
            .map(|acc| Relation {
                description: acc.descriptions.join(&self.description_separator),
                ..acc.item
            })
            .collect()
    }
}

impl Default for GraphMerger {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_entity(entities: &mut IndexMap<EntityKey, Accumulated<Entity>>, entity: Entity) {
    let key = EntityKey::from_name(&entity.name);
    match entities.get_mut(&key) {
        Some(existing) => {
            if existing.item.entity_type == UNKNOWN_ENTITY_TYPE
                && entity.entity_type != UNKNOWN_ENTITY_TYPE
            {
                existing.item.entity_type = entity.entity_type;
            }
            existing.add_description(&entity.description);
        }
        None => {
            let description = entity.description.clone();
            entities.insert(key, Accumulated::new(entity, &description));
        }
    }
}

fn merge_relation(relations: &mut IndexMap<RelationKey, Accumulated<Relation>>, relation: Relation) {
    let key = RelationKey::of(&relation);
    match relations.get_mut(&key) {
        Some(existing) => {
            existing.add_description(&relation.description);
            existing.item.chunks.extend(relation.chunks);
        }
        None => {
            let description = relation.description.clone();
            relations.insert(key, Accumulated::new(relation, &description));
        }
    }
}
