//! # Union Graph
//!
//! Several single-type views over the same node space, read as one
//! multi-type graph.
//!
//! Iteration visits each constituent in turn, so a node's targets come type
//! by type, each in its own sorted order. The merged schema is resolved on
//! request; a relationship type that is directed in one constituent and
//! undirected in another fails there.

use super::api::Graph;
use super::node_properties::NodePropertyValues;
use super::schema::GraphSchema;
use crate::primitives::NOT_FOUND;
use crate::types::{GraphError, NodeLabel, RelationshipType};
use std::sync::Arc;

#[derive(Debug)]
pub struct UnionGraph {
    graphs: Vec<Box<dyn Graph>>,
}

impl UnionGraph {
    /// Combine `graphs`; a single graph is returned as is.
    pub fn of(mut graphs: Vec<Box<dyn Graph>>) -> Result<Box<dyn Graph>, GraphError> {
        match graphs.len() {
            0 => Err(GraphError::EmptyUnion),
            1 => graphs.pop().ok_or(GraphError::EmptyUnion),
            _ => Ok(Box::new(Self { graphs })),
        }
    }

    fn first(&self) -> &dyn Graph {
        self.graphs[0].as_ref()
    }
}

impl Graph for UnionGraph {
    fn node_count(&self) -> u64 {
        self.first().node_count()
    }

    fn root_node_count(&self) -> u64 {
        self.first().root_node_count()
    }

    fn relationship_count(&self) -> u64 {
        self.graphs.iter().map(|g| g.relationship_count()).sum()
    }

    fn schema(&self) -> Result<GraphSchema, GraphError> {
        let mut merged = self.first().schema()?;
        for graph in &self.graphs[1..] {
            merged = merged.union(&graph.schema()?)?;
        }
        Ok(merged)
    }

    fn relationship_types(&self) -> Vec<RelationshipType> {
        self.graphs.iter().flat_map(|g| g.relationship_types()).collect()
    }

    fn is_undirected(&self) -> bool {
        self.graphs.iter().all(|g| g.is_undirected())
    }

    fn is_multi_graph(&self) -> bool {
        true
    }

    fn has_relationship_property(&self) -> bool {
        self.graphs.iter().all(|g| g.has_relationship_property())
    }

    fn degree(&self, node: u64) -> usize {
        self.graphs.iter().map(|g| g.degree(node)).sum()
    }

    fn for_each_relationship(&self, node: u64, consumer: &mut dyn FnMut(u64, u64) -> bool) {
        for graph in &self.graphs {
            let mut keep_going = true;
            graph.for_each_relationship(node, &mut |source, target| {
                keep_going = consumer(source, target);
                keep_going
            });
            if !keep_going {
                return;
            }
        }
    }

    fn for_each_relationship_with_property(
        &self,
        node: u64,
        fallback: f64,
        consumer: &mut dyn FnMut(u64, u64, f64) -> bool,
    ) {
        for graph in &self.graphs {
            let mut keep_going = true;
            graph.for_each_relationship_with_property(node, fallback, &mut |source, target, value| {
                keep_going = consumer(source, target, value);
                keep_going
            });
            if !keep_going {
                return;
            }
        }
    }

    fn find_relationship_property(&self, source: u64, target: u64, fallback: f64) -> Option<f64> {
        self.graphs
            .iter()
            .find_map(|g| g.find_relationship_property(source, target, fallback))
    }

    fn exists(&self, source: u64, target: u64) -> bool {
        self.graphs.iter().any(|g| g.exists(source, target))
    }

    fn nth_target(&self, node: u64, offset: usize) -> u64 {
        let mut offset = offset;
        for graph in &self.graphs {
            let degree = graph.degree(node);
            if offset < degree {
                return graph.nth_target(node, offset);
            }
            offset -= degree;
        }
        NOT_FOUND
    }

    fn to_root_node_id(&self, node: u64) -> u64 {
        self.first().to_root_node_id(node)
    }

    fn to_mapped_node_id(&self, root: u64) -> u64 {
        self.first().to_mapped_node_id(root)
    }

    fn node_labels(&self, node: u64) -> Vec<NodeLabel> {
        self.first().node_labels(node)
    }

    fn has_label(&self, node: u64, label: &NodeLabel) -> bool {
        self.first().has_label(node, label)
    }

    fn node_properties(&self, key: &str) -> Option<Arc<dyn NodePropertyValues>> {
        self.first().node_properties(key)
    }

    fn relationship_type_filtered_graph(
        &self,
        types: &[RelationshipType],
    ) -> Result<Box<dyn Graph>, GraphError> {
        if types.is_empty() {
            return Ok(self.concurrent_copy());
        }
        let mut selected = Vec::new();
        for graph in &self.graphs {
            let own: Vec<RelationshipType> = graph
                .relationship_types()
                .into_iter()
                .filter(|ty| types.contains(ty))
                .collect();
            if !own.is_empty() {
                selected.push(graph.relationship_type_filtered_graph(&own)?);
            }
        }
        if selected.is_empty() {
            return Err(GraphError::UnsupportedRelationshipTypes {
                requested: types.iter().map(|t| t.name().to_string()).collect(),
                available: self
                    .relationship_types()
                    .iter()
                    .map(|t| t.name().to_string())
                    .collect(),
            });
        }
        Self::of(selected)
    }

    fn concurrent_copy(&self) -> Box<dyn Graph> {
        Box::new(Self {
            graphs: self.graphs.iter().map(|g| g.concurrent_copy()).collect(),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
