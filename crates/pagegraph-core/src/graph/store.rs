//! # Graph Store
//!
//! Owns the node space, node properties and every relationship type, and
//! composes graph views over them.
//!
//! ## View composition
//!
//! ```text
//! get_graph(labels, types, property)
//!   per type     -> HugeGraph
//!   label filter -> NodeFilteredGraph (one shared FilteredIdMap)
//!   > 1 type     -> UnionGraph
//! ```

use super::api::Graph;
use super::composite::CompositeRelationshipIterator;
use super::filtered::NodeFilteredGraph;
use super::huge_graph::{HugeGraph, NodePropertyMap};
use super::id_map::{FilteredIdMap, IdMap};
use super::node_properties::NodePropertyValues;
use super::relationships::SingleTypeRelationships;
use super::schema::GraphSchema;
use super::union::UnionGraph;
use crate::adjacency::AdjacencyList;
use crate::collections::HugeArray;
use crate::mem::{self, MemoryRange};
use crate::types::{GraphError, NodeLabel, RelationshipType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// GRAPH STORE
// =============================================================================

#[derive(Debug)]
pub struct GraphStore {
    id_map: Arc<IdMap>,
    node_properties: Arc<NodePropertyMap>,
    relationships: BTreeMap<RelationshipType, Arc<SingleTypeRelationships>>,
}

impl GraphStore {
    #[must_use]
    pub fn node_count(&self) -> u64 {
        self.id_map.node_count()
    }

    /// Stored relationships over all types.
    #[must_use]
    pub fn relationship_count(&self) -> u64 {
        self.relationships
            .values()
            .map(|r| r.topology().relationship_count())
            .sum()
    }

    #[must_use]
    pub fn id_map(&self) -> &Arc<IdMap> {
        &self.id_map
    }

    pub fn relationship_types(&self) -> impl Iterator<Item = &RelationshipType> + '_ {
        self.relationships.keys()
    }

    pub fn node_property_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.node_properties.keys().map(String::as_str)
    }

    pub fn relationships(&self, ty: &RelationshipType) -> Result<&Arc<SingleTypeRelationships>, GraphError> {
        self.relationships
            .get(ty)
            .ok_or_else(|| GraphError::UnknownRelationshipType(ty.name().to_string()))
    }

    #[must_use]
    pub fn schema(&self) -> GraphSchema {
        GraphSchema {
            node_labels: HugeGraph::node_schema(&self.id_map, &self.node_properties),
            relationship_types: self
                .relationships
                .iter()
                .map(|(ty, rels)| (ty.clone(), rels.schema_entry()))
                .collect(),
        }
    }

    /// Compose a view.
    ///
    /// - `labels`: empty or `ALL_NODES` keeps every node
    /// - `types`: empty selects every stored type
    /// - `property`: must exist on every selected type
    pub fn get_graph(
        &self,
        labels: &[NodeLabel],
        types: &[RelationshipType],
        property: Option<&str>,
    ) -> Result<Box<dyn Graph>, GraphError> {
        let selected: Vec<&Arc<SingleTypeRelationships>> = if types.is_empty() {
            self.relationships.values().collect()
        } else {
            types.iter().map(|ty| self.relationships(ty)).collect::<Result<_, _>>()?
        };

        let mut graphs = Vec::with_capacity(selected.len().max(1));
        for relationships in selected {
            graphs.push(HugeGraph::new(
                Arc::clone(&self.id_map),
                Arc::clone(&self.node_properties),
                Arc::clone(relationships),
                property,
            )?);
        }
        if graphs.is_empty() {
            graphs.push(HugeGraph::empty(
                Arc::clone(&self.id_map),
                Arc::clone(&self.node_properties),
            ));
        }

        let filter_nodes = !labels.is_empty() && !labels.iter().any(NodeLabel::is_all_nodes);
        let views: Vec<Box<dyn Graph>> = if filter_nodes {
            let filter = Arc::new(FilteredIdMap::from_labels(&self.id_map, labels)?);
            graphs
                .into_iter()
                .map(|g| {
                    Box::new(NodeFilteredGraph::new(g, Arc::clone(&filter), labels.to_vec()))
                        as Box<dyn Graph>
                })
                .collect()
        } else {
            graphs.into_iter().map(|g| Box::new(g) as Box<dyn Graph>).collect()
        };
        UnionGraph::of(views)
    }

    /// Iterate `ty` with the property columns named by `keys`, in that order.
    pub fn composite_relationship_iterator(
        &self,
        ty: &RelationshipType,
        keys: &[&str],
    ) -> Result<CompositeRelationshipIterator, GraphError> {
        let relationships = self.relationships(ty)?;
        Ok(CompositeRelationshipIterator::new(Arc::clone(relationships), keys))
    }

    #[must_use]
    pub fn size_of(&self) -> u64 {
        self.id_map.size_of()
            + self.node_properties.values().map(|p| p.size_of()).sum::<u64>()
            + self.relationships.values().map(|r| r.size_of()).sum::<u64>()
    }

    /// Bytes a store of `dimensions` would occupy.
    #[must_use]
    pub fn memory_estimation(dimensions: &GraphDimensions) -> MemoryRange {
        let id_map = IdMap::memory_estimation(dimensions.node_count, dimensions.label_count);
        let node_properties =
            dimensions.node_property_count * HugeArray::<f64>::memory_estimation(dimensions.node_count);
        let relationship_properties = dimensions.relationship_property_count
            * HugeArray::<f64>::memory_estimation(dimensions.relationship_count);
        MemoryRange::of(mem::size_of_instance::<Self>() + id_map + node_properties + relationship_properties)
            + AdjacencyList::memory_estimation(dimensions.node_count, dimensions.relationship_count)
    }
}

/// Sizes a memory estimate is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDimensions {
    pub node_count: u64,
    pub relationship_count: u64,
    #[serde(default)]
    pub node_property_count: u64,
    #[serde(default)]
    pub relationship_property_count: u64,
    #[serde(default)]
    pub label_count: u64,
}

// =============================================================================
// BUILDER
// =============================================================================

/// Assembles a [`GraphStore`] from a node space and built relationship types.
#[derive(Debug)]
pub struct GraphStoreBuilder {
    id_map: IdMap,
    node_properties: NodePropertyMap,
    relationships: BTreeMap<RelationshipType, Arc<SingleTypeRelationships>>,
}

impl GraphStoreBuilder {
    pub fn new(node_count: u64) -> Self {
        Self {
            id_map: IdMap::new(node_count),
            node_properties: BTreeMap::new(),
            relationships: BTreeMap::new(),
        }
    }

    pub fn add_label(&mut self, node: u64, label: NodeLabel) -> Result<&mut Self, GraphError> {
        self.id_map.add_label(node, label)?;
        Ok(self)
    }

    /// Fails when `values` does not hold one value per node.
    pub fn add_node_property(
        &mut self,
        key: &str,
        values: Arc<dyn NodePropertyValues>,
    ) -> Result<&mut Self, GraphError> {
        let expected = self.id_map.node_count();
        if values.node_count() != expected {
            return Err(GraphError::PropertyCountMismatch {
                expected: expected as usize,
                actual: values.node_count() as usize,
            });
        }
        self.node_properties.insert(key.to_string(), values);
        Ok(self)
    }

    /// Add a relationship type, replacing an earlier one of the same type.
    pub fn add_relationships(&mut self, relationships: SingleTypeRelationships) -> &mut Self {
        self.relationships
            .insert(relationships.relationship_type().clone(), Arc::new(relationships));
        self
    }

    pub fn build(self) -> GraphStore {
        let store = GraphStore {
            id_map: Arc::new(self.id_map),
            node_properties: Arc::new(self.node_properties),
            relationships: self.relationships,
        };
        tracing::debug!(
            node_count = store.node_count(),
            relationship_count = store.relationship_count(),
            relationship_types = store.relationships.len(),
            size = %mem::human_readable(store.size_of()),
            "built graph store"
        );
        store
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node_properties::DoubleArrayNodePropertyValues;
    use crate::graph::relationships::{PropertyConfig, RelationshipsBuilder, RelationshipsConfig};
    use crate::primitives::NOT_FOUND;
    use crate::types::Orientation;

    fn store() -> GraphStore {
        let mut builder = GraphStoreBuilder::new(4);
        builder
            .add_label(0, NodeLabel::of("Person"))
            .and_then(|b| b.add_label(1, NodeLabel::of("Person")))
            .and_then(|b| b.add_label(2, NodeLabel::of("City")))
            .expect("labels");
        builder
            .add_node_property(
                "score",
                Arc::new(DoubleArrayNodePropertyValues::new(HugeArray::from_vec(vec![
                    0.1, 0.2, 0.3, 0.4,
                ]))),
            )
            .expect("property");

        let mut knows = RelationshipsConfig::of("KNOWS");
        knows.properties = vec![PropertyConfig::of("since")];
        let mut rels = RelationshipsBuilder::new(4, knows).expect("builder");
        rels.add_with_properties(0, 1, &[2001.0]).expect("add");
        rels.add_with_properties(1, 0, &[2002.0]).expect("add");
        rels.add_with_properties(0, 3, &[2003.0]).expect("add");
        builder.add_relationships(rels.build().expect("build"));

        let mut lives = RelationshipsConfig::of("LIVES_IN");
        lives.orientation = Orientation::Undirected;
        let mut rels = RelationshipsBuilder::new(4, lives).expect("builder");
        rels.add(0, 2).expect("add");
        rels.add(1, 2).expect("add");
        builder.add_relationships(rels.build().expect("build"));
        builder.build()
    }

    #[test]
    fn counts_and_schema() {
        let store = store();
        assert_eq!(store.node_count(), 4);
        assert_eq!(store.relationship_count(), 7);
        let schema = store.schema();
        assert_eq!(schema.node_labels.len(), 2);
        assert_eq!(schema.relationship_types.len(), 2);
        assert!(store.size_of() > 0);
    }

    #[test]
    fn union_of_all_types() {
        let store = store();
        let graph = store.get_graph(&[], &[], None).expect("graph");
        assert_eq!(graph.degree(0), 3);
        assert_eq!(graph.degree(2), 2);
        assert_eq!(graph.relationship_types().len(), 2);
        assert!(graph.schema().is_ok());
    }

    #[test]
    fn single_type_with_property() {
        let store = store();
        let graph = store
            .get_graph(&[], &[RelationshipType::of("KNOWS")], Some("since"))
            .expect("graph");
        assert_eq!(graph.relationship_property(1, 0, 0.0), 2002.0);
        assert!(graph.has_relationship_property());

        let err = store
            .get_graph(&[], &[RelationshipType::of("LIVES_IN")], Some("since"))
            .expect_err("missing property");
        assert_eq!(err, GraphError::UnknownPropertyKey("since".to_string()));
    }

    #[test]
    fn label_filtered_view() {
        let store = store();
        let graph = store
            .get_graph(&[NodeLabel::of("Person")], &[RelationshipType::of("KNOWS")], None)
            .expect("graph");
        assert_eq!(graph.node_count(), 2);
        // 0 -> 3 leaves the filter
        assert_eq!(graph.degree(0), 1);
        assert_eq!(graph.to_mapped_node_id(3), NOT_FOUND);
        let scores = graph.node_properties("score").expect("score");
        assert_eq!(scores.double_value(1), 0.2);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let store = store();
        assert_eq!(
            store
                .get_graph(&[], &[RelationshipType::of("NOPE")], None)
                .expect_err("type"),
            GraphError::UnknownRelationshipType("NOPE".to_string())
        );
        assert_eq!(
            store
                .get_graph(&[NodeLabel::of("Nope")], &[], None)
                .expect_err("label"),
            GraphError::UnknownNodeLabel("Nope".to_string())
        );
    }

    #[test]
    fn composite_iterator_from_store() {
        let store = store();
        let mut iter = store
            .composite_relationship_iterator(&RelationshipType::of("KNOWS"), &["since"])
            .expect("iterator");
        let mut years = Vec::new();
        iter.for_each_relationship(0, |_, _, props| {
            years.push(props[0]);
            true
        });
        assert_eq!(years, vec![2001.0, 2003.0]);
    }

    #[test]
    fn store_without_types_yields_empty_graph() {
        let store = GraphStoreBuilder::new(3).build();
        let graph = store.get_graph(&[], &[], None).expect("graph");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.relationship_count(), 0);
    }

    #[test]
    fn node_property_size_must_match() {
        let mut builder = GraphStoreBuilder::new(3);
        let err = builder
            .add_node_property(
                "x",
                Arc::new(DoubleArrayNodePropertyValues::new(HugeArray::from_vec(vec![1.0]))),
            )
            .expect_err("mismatch");
        assert_eq!(err, GraphError::PropertyCountMismatch { expected: 3, actual: 1 });
    }

    #[test]
    fn estimation_grows_with_properties() {
        let base = GraphDimensions {
            node_count: 1_000,
            relationship_count: 10_000,
            ..GraphDimensions::default()
        };
        let with_properties = GraphDimensions {
            relationship_property_count: 2,
            ..base
        };
        let a = GraphStore::memory_estimation(&base);
        let b = GraphStore::memory_estimation(&with_properties);
        assert!(a.min <= a.max);
        assert!(b.min > a.min);
    }
}
