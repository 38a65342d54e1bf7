//! Entity type normalization against an allowed set

use gleaner_domain::{Graph, UNKNOWN_ENTITY_TYPE};
use std::collections::HashSet;

/// Canonical form of an entity type: spaces removed, uppercased
pub fn normalize_entity_type(raw: &str) -> String {
    raw.chars().filter(|c| *c != ' ').collect::<String>().to_uppercase()
}

/// The allowed entity types, stored in canonical form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityTypeSet {
    types: HashSet<String>,
    ordered: Vec<String>,
}

impl EntityTypeSet {
    /// Build a set from caller-supplied type names
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for raw in types {
            let canonical = normalize_entity_type(raw.as_ref());
            if set.types.insert(canonical.clone()) {
                set.ordered.push(canonical);
            }
        }
        set
    }

    /// True if `raw` normalizes to a member of the set
    pub fn contains(&self, raw: &str) -> bool {
        self.types.contains(&normalize_entity_type(raw))
    }

    /// Canonical form of `raw` if allowed, otherwise [`UNKNOWN_ENTITY_TYPE`]
    pub fn normalize(&self, raw: &str) -> String {
        let canonical = normalize_entity_type(raw);
        if self.types.contains(&canonical) {
            canonical
        } else {
            UNKNOWN_ENTITY_TYPE.to_string()
        }
    }

    /// Rewrite every entity type in `graph`
    pub fn apply(&self, graph: &mut Graph) {
        for entity in &mut graph.entities {
            entity.entity_type = self.normalize(&entity.entity_type);
        }
    }

    /// Comma-joined canonical types, in first-insertion order
    pub fn to_prompt_list(&self) -> String {
        self.ordered.join(",")
    }

    /// Number of distinct types
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// True if no types are allowed
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gleaner_domain::Entity;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_entity_type() {
        assert_eq!(normalize_entity_type(" place "), "PLACE");
        assert_eq!(normalize_entity_type("Public Figure"), "PUBLICFIGURE");
    }

    #[test]
    fn test_set_membership() {
        let types = EntityTypeSet::new(["Place", "Character"]);

        assert_eq!(types.normalize(" place "), "PLACE");
        assert_eq!(types.normalize("CHARACTER"), "CHARACTER");
        assert_eq!(types.normalize("Spaceship"), UNKNOWN_ENTITY_TYPE);
        assert!(types.contains("character"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let types = EntityTypeSet::new(["Place", "PLACE", "pla ce", "Event"]);
        assert_eq!(types.len(), 2);
        assert_eq!(types.to_prompt_list(), "PLACE,EVENT");
    }

    #[test]
    fn test_empty_set_maps_everything_to_unknown() {
        let types = EntityTypeSet::default();
        assert!(types.is_empty());
        assert_eq!(types.normalize("Place"), UNKNOWN_ENTITY_TYPE);
    }

    #[test]
    fn test_apply_to_graph() {
        let types = EntityTypeSet::new(["Character"]);
        let mut graph = Graph {
            entities: vec![
                Entity::new("Scrooge", "character", ""),
                Entity::new("London", "city", ""),
            ],
            ..Graph::default()
        };

        types.apply(&mut graph);
        assert_eq!(graph.entities[0].entity_type, "CHARACTER");
        assert_eq!(graph.entities[1].entity_type, UNKNOWN_ENTITY_TYPE);
    }

    proptest! {
        #[test]
        fn prop_normalized_type_is_member_or_unknown(raw in "[A-Za-z ]{0,12}") {
            let types = EntityTypeSet::new(["Character", "Place", "Event"]);
            let normalized = types.normalize(&raw);
            prop_assert!(normalized == UNKNOWN_ENTITY_TYPE || types.contains(&normalized));
        }
    }
}
