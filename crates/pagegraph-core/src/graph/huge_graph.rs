//! # Huge Graph
//!
//! A view over one relationship type of a graph store, in the root node space.

use super::api::Graph;
use super::id_map::IdMap;
use super::node_properties::NodePropertyValues;
use super::relationships::SingleTypeRelationships;
use super::schema::{GraphSchema, RelationshipSchemaEntry};
use crate::adjacency::{AdjacencyCursor, CompressedAdjacencyCursor, PropertyCursor};
use crate::primitives::NOT_FOUND;
use crate::types::{GraphError, NodeLabel, RelationshipType, ValueType};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Node property columns by key.
pub type NodePropertyMap = BTreeMap<String, Arc<dyn NodePropertyValues>>;

/// Single-type view with an optional selected relationship property.
pub struct HugeGraph {
    id_map: Arc<IdMap>,
    node_properties: Arc<NodePropertyMap>,
    relationships: Arc<SingleTypeRelationships>,
    property: Option<usize>,
    cursor_cache: Cell<Option<CompressedAdjacencyCursor>>,
    property_cache: Cell<Option<PropertyCursor>>,
}

impl fmt::Debug for HugeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HugeGraph")
            .field("relationship_type", self.relationships.relationship_type())
            .field("node_count", &self.id_map.node_count())
            .field("property", &self.property)
            .finish_non_exhaustive()
    }
}

impl HugeGraph {
    /// Fails with [`GraphError::UnknownPropertyKey`] when `property` is not stored for the type.
    pub fn new(
        id_map: Arc<IdMap>,
        node_properties: Arc<NodePropertyMap>,
        relationships: Arc<SingleTypeRelationships>,
        property: Option<&str>,
    ) -> Result<Self, GraphError> {
        let property = match property {
            Some(key) => Some(
                relationships
                    .property_index(key)
                    .ok_or_else(|| GraphError::UnknownPropertyKey(key.to_string()))?,
            ),
            None => None,
        };
        Ok(Self {
            id_map,
            node_properties,
            relationships,
            property,
            cursor_cache: Cell::new(None),
            property_cache: Cell::new(None),
        })
    }

    /// A graph over `id_map` without relationships.
    pub fn empty(id_map: Arc<IdMap>, node_properties: Arc<NodePropertyMap>) -> Self {
        let relationships = Arc::new(SingleTypeRelationships::empty(
            RelationshipType::all_relationships(),
            id_map.node_count(),
        ));
        Self {
            id_map,
            node_properties,
            relationships,
            property: None,
            cursor_cache: Cell::new(None),
            property_cache: Cell::new(None),
        }
    }

    /// A copy sharing all storage, with its own cursor caches.
    #[must_use]
    pub fn copy(&self) -> Self {
        Self {
            id_map: Arc::clone(&self.id_map),
            node_properties: Arc::clone(&self.node_properties),
            relationships: Arc::clone(&self.relationships),
            property: self.property,
            cursor_cache: Cell::new(None),
            property_cache: Cell::new(None),
        }
    }

    #[must_use]
    pub fn relationships(&self) -> &Arc<SingleTypeRelationships> {
        &self.relationships
    }

    /// A fresh cursor over `node`'s targets, for callers that walk lists themselves.
    #[must_use]
    pub fn adjacency_cursor(&self, node: u64) -> CompressedAdjacencyCursor {
        self.relationships.topology().adjacency().adjacency_cursor(node)
    }

    /// Check `types` against this graph's type; an empty selection keeps it.
    pub fn filter_types(&self, types: &[RelationshipType]) -> Result<HugeGraph, GraphError> {
        let own = self.relationships.relationship_type();
        if own.is_all_relationships() || types.iter().all(|ty| ty == own) {
            return Ok(self.copy());
        }
        Err(GraphError::UnsupportedRelationshipTypes {
            requested: types.iter().map(|t| t.name().to_string()).collect(),
            available: vec![own.name().to_string()],
        })
    }

    fn take_cursor(&self, node: u64) -> CompressedAdjacencyCursor {
        let adjacency = self.relationships.topology().adjacency();
        match self.cursor_cache.take() {
            Some(mut cursor) => {
                adjacency.adjacency_cursor_reuse(&mut cursor, node);
                cursor
            }
            None => adjacency.adjacency_cursor(node),
        }
    }

    fn take_property_cursor(&self, column: usize, node: u64) -> PropertyCursor {
        let adjacency = self.relationships.topology().adjacency();
        match self.property_cache.take() {
            Some(mut cursor) => {
                adjacency.property_cursor_reuse(&mut cursor, node);
                cursor
            }
            None => adjacency.property_cursor(&self.relationships.properties()[column].values, node),
        }
    }

    fn schema_entry(&self) -> RelationshipSchemaEntry {
        let mut entry = self.relationships.schema_entry();
        let selected = self
            .property
            .map(|column| self.relationships.properties()[column].key.as_str());
        entry.properties.retain(|key, _| Some(key.as_str()) == selected);
        entry
    }

    pub(crate) fn node_schema(
        id_map: &IdMap,
        node_properties: &NodePropertyMap,
    ) -> BTreeMap<NodeLabel, BTreeMap<String, ValueType>> {
        let keys: BTreeMap<String, ValueType> = node_properties
            .iter()
            .map(|(key, values)| (key.clone(), values.value_type()))
            .collect();
        let mut labels: Vec<NodeLabel> = id_map.available_labels().cloned().collect();
        if labels.is_empty() {
            labels.push(NodeLabel::all_nodes());
        }
        labels.into_iter().map(|label| (label, keys.clone())).collect()
    }
}

impl Graph for HugeGraph {
    fn node_count(&self) -> u64 {
        self.id_map.node_count()
    }

    fn root_node_count(&self) -> u64 {
        self.id_map.node_count()
    }

    fn relationship_count(&self) -> u64 {
        self.relationships.topology().relationship_count()
    }

    fn schema(&self) -> Result<GraphSchema, GraphError> {
        let mut schema = GraphSchema {
            node_labels: Self::node_schema(&self.id_map, &self.node_properties),
            relationship_types: BTreeMap::new(),
        };
        let own = self.relationships.relationship_type();
        if !own.is_all_relationships() {
            schema
                .relationship_types
                .insert(own.clone(), self.schema_entry());
        }
        Ok(schema)
    }

    fn relationship_types(&self) -> Vec<RelationshipType> {
        let own = self.relationships.relationship_type();
        if own.is_all_relationships() {
            return Vec::new();
        }
        vec![own.clone()]
    }

    fn is_undirected(&self) -> bool {
        self.relationships.direction() == crate::types::Direction::Undirected
    }

    fn is_multi_graph(&self) -> bool {
        self.relationships.topology().is_multi_graph()
    }

    fn has_relationship_property(&self) -> bool {
        self.property.is_some()
    }

    fn degree(&self, node: u64) -> usize {
        self.relationships.topology().adjacency().degree(node)
    }

    fn for_each_relationship(&self, node: u64, consumer: &mut dyn FnMut(u64, u64) -> bool) {
        let mut cursor = self.take_cursor(node);
        while cursor.has_next() {
            if !consumer(node, cursor.next_id()) {
                break;
            }
        }
        self.cursor_cache.set(Some(cursor));
    }

    fn for_each_relationship_with_property(
        &self,
        node: u64,
        fallback: f64,
        consumer: &mut dyn FnMut(u64, u64, f64) -> bool,
    ) {
        let Some(column) = self.property else {
            self.for_each_relationship(node, &mut |source, target| {
                consumer(source, target, fallback)
            });
            return;
        };
        let mut cursor = self.take_cursor(node);
        let mut properties = self.take_property_cursor(column, node);
        while cursor.has_next() {
            let target = cursor.next_id();
            if !consumer(node, target, properties.next_property()) {
                break;
            }
        }
        self.cursor_cache.set(Some(cursor));
        self.property_cache.set(Some(properties));
    }

    fn find_relationship_property(&self, source: u64, target: u64, fallback: f64) -> Option<f64> {
        let mut cursor = self.take_cursor(source);
        let found = cursor.advance(target) == target;
        let position = cursor.size() - cursor.remaining();
        self.cursor_cache.set(Some(cursor));
        if !found {
            return None;
        }
        let Some(column) = self.property else {
            return Some(fallback);
        };
        // the matching target was the last one consumed
        let adjacency = self.relationships.topology().adjacency();
        let index = adjacency.relationship_offset(source) + (position - 1) as u64;
        Some(self.relationships.properties()[column].values.get(index))
    }

    fn exists(&self, source: u64, target: u64) -> bool {
        let mut cursor = self.take_cursor(source);
        let found = cursor.advance(target) == target;
        self.cursor_cache.set(Some(cursor));
        found
    }

    fn nth_target(&self, node: u64, offset: usize) -> u64 {
        if offset >= self.degree(node) {
            return NOT_FOUND;
        }
        let mut cursor = self.take_cursor(node);
        let target = cursor.advance_by(offset);
        self.cursor_cache.set(Some(cursor));
        target
    }

    fn to_root_node_id(&self, node: u64) -> u64 {
        node
    }

    fn to_mapped_node_id(&self, root: u64) -> u64 {
        if root < self.id_map.node_count() {
            root
        } else {
            NOT_FOUND
        }
    }

    fn node_labels(&self, node: u64) -> Vec<NodeLabel> {
        self.id_map.node_labels(node)
    }

    fn has_label(&self, node: u64, label: &NodeLabel) -> bool {
        self.id_map.has_label(node, label)
    }

    fn node_properties(&self, key: &str) -> Option<Arc<dyn NodePropertyValues>> {
        self.node_properties.get(key).cloned()
    }

    fn relationship_type_filtered_graph(
        &self,
        types: &[RelationshipType],
    ) -> Result<Box<dyn Graph>, GraphError> {
        Ok(Box::new(self.filter_types(types)?))
    }

    fn concurrent_copy(&self) -> Box<dyn Graph> {
        Box::new(self.copy())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::relationships::{PropertyConfig, RelationshipsBuilder, RelationshipsConfig};

    fn weighted_graph() -> HugeGraph {
        let mut config = RelationshipsConfig::of("R");
        config.properties = vec![PropertyConfig::of("w")];
        let mut builder = RelationshipsBuilder::new(4, config).expect("builder");
        for (s, t, w) in [(0, 1, 1.0), (0, 3, 3.0), (0, 3, 4.0), (2, 0, 5.0)] {
            builder.add_with_properties(s, t, &[w]).expect("add");
        }
        let relationships = Arc::new(builder.build().expect("build"));
        HugeGraph::new(
            Arc::new(IdMap::new(4)),
            Arc::new(BTreeMap::new()),
            relationships,
            Some("w"),
        )
        .expect("graph")
    }

    #[test]
    fn iterates_with_properties() {
        let graph = weighted_graph();
        let mut seen = Vec::new();
        graph.for_each_relationship_with_property(0, f64::NAN, &mut |s, t, w| {
            seen.push((s, t, w));
            true
        });
        assert_eq!(seen, vec![(0, 1, 1.0), (0, 3, 3.0), (0, 3, 4.0)]);
        assert_eq!(graph.relationship_count(), 4);
    }

    #[test]
    fn early_stop() {
        let graph = weighted_graph();
        let mut visited = 0;
        graph.for_each_relationship(0, &mut |_, _| {
            visited += 1;
            false
        });
        assert_eq!(visited, 1);
        // the cursor goes back into the cache and is reset on the next call
        let mut all = Vec::new();
        graph.for_each_relationship(0, &mut |_, t| {
            all.push(t);
            true
        });
        assert_eq!(all, vec![1, 3, 3]);
    }

    #[test]
    fn point_lookups() {
        let graph = weighted_graph();
        assert_eq!(graph.relationship_property(0, 3, 0.0), 3.0);
        assert_eq!(graph.relationship_property(0, 2, -1.0), -1.0);
        assert_eq!(graph.relationship_property(2, 0, -1.0), 5.0);
        assert!(graph.exists(0, 1));
        assert!(!graph.exists(1, 0));
        assert_eq!(graph.nth_target(0, 2), 3);
        assert_eq!(graph.nth_target(0, 3), NOT_FOUND);
        assert_eq!(graph.degree(0), 3);
        assert_eq!(graph.degree_without_parallel_relationships(0), 2);
    }

    #[test]
    fn unknown_property_is_rejected() {
        let relationships = Arc::new(SingleTypeRelationships::empty(RelationshipType::of("R"), 2));
        let err = HugeGraph::new(
            Arc::new(IdMap::new(2)),
            Arc::new(BTreeMap::new()),
            relationships,
            Some("w"),
        )
        .expect_err("unknown key");
        assert_eq!(err, GraphError::UnknownPropertyKey("w".to_string()));
    }

    #[test]
    fn type_filter_accepts_only_own_type() {
        let graph = weighted_graph();
        assert!(graph.relationship_type_filtered_graph(&[]).is_ok());
        assert!(graph
            .relationship_type_filtered_graph(&[RelationshipType::of("R")])
            .is_ok());
        assert!(graph
            .relationship_type_filtered_graph(&[RelationshipType::of("X")])
            .is_err());
    }

    #[test]
    fn empty_graph_has_no_types() {
        let graph = HugeGraph::empty(Arc::new(IdMap::new(3)), Arc::new(BTreeMap::new()));
        assert!(graph.relationship_types().is_empty());
        assert_eq!(graph.relationship_count(), 0);
        assert_eq!(graph.degree(2), 0);
        assert!(!graph.exists(0, 1));
        assert!(graph.schema().expect("schema").relationship_types.is_empty());
    }

    #[test]
    fn schema_lists_selected_property() {
        let graph = weighted_graph();
        let schema = graph.schema().expect("schema");
        let entry = &schema.relationship_types[&RelationshipType::of("R")];
        assert!(entry.properties.contains_key("w"));
        assert!(schema.node_labels.contains_key(&NodeLabel::all_nodes()));
    }
}
