//! # Graph Schema
//!
//! Node labels with their property keys and relationship types with their
//! direction and property policies.
//!
//! All maps are `BTreeMap` so schemas print and serialize in a stable order.

use crate::types::{Aggregation, Direction, GraphError, NodeLabel, RelationshipType, ValueType};
use serde::Serialize;
use std::collections::BTreeMap;

/// Policy and default of one relationship property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipPropertySchema {
    pub aggregation: Aggregation,
    pub default_value: f64,
}

/// Direction and properties of one relationship type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipSchemaEntry {
    pub direction: Direction,
    pub properties: BTreeMap<String, RelationshipPropertySchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphSchema {
    pub node_labels: BTreeMap<NodeLabel, BTreeMap<String, ValueType>>,
    pub relationship_types: BTreeMap<RelationshipType, RelationshipSchemaEntry>,
}

impl GraphSchema {
    /// Whether every relationship type is undirected. Vacuously false when empty.
    #[must_use]
    pub fn is_undirected(&self) -> bool {
        !self.relationship_types.is_empty()
            && self
                .relationship_types
                .values()
                .all(|entry| entry.direction == Direction::Undirected)
    }

    /// Merge two schemas.
    ///
    /// Fails with [`GraphError::ConflictingDirectionality`] naming every
    /// relationship type that is directed on one side and undirected on the other.
    pub fn union(&self, other: &GraphSchema) -> Result<GraphSchema, GraphError> {
        let conflicts: Vec<String> = self
            .relationship_types
            .iter()
            .filter_map(|(ty, entry)| {
                let theirs = other.relationship_types.get(ty)?;
                (theirs.direction != entry.direction).then(|| ty.name().to_string())
            })
            .collect();
        if !conflicts.is_empty() {
            return Err(GraphError::ConflictingDirectionality { types: conflicts });
        }

        let mut merged = self.clone();
        for (label, properties) in &other.node_labels {
            merged
                .node_labels
                .entry(label.clone())
                .or_default()
                .extend(properties.iter().map(|(k, v)| (k.clone(), *v)));
        }
        for (ty, entry) in &other.relationship_types {
            match merged.relationship_types.get_mut(ty) {
                Some(existing) => existing
                    .properties
                    .extend(entry.properties.iter().map(|(k, v)| (k.clone(), v.clone()))),
                None => {
                    merged.relationship_types.insert(ty.clone(), entry.clone());
                }
            }
        }
        Ok(merged)
    }

    /// Keep only the given node labels.
    #[must_use]
    pub fn filter_node_labels(&self, labels: &[NodeLabel]) -> GraphSchema {
        GraphSchema {
            node_labels: self
                .node_labels
                .iter()
                .filter(|(label, _)| labels.contains(label))
                .map(|(label, props)| (label.clone(), props.clone()))
                .collect(),
            relationship_types: self.relationship_types.clone(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
