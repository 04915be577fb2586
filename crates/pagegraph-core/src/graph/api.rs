//! # Graph Trait
//!
//! The read API every graph view implements.
//!
//! Node ids passed to and returned from a view are *mapped* ids in
//! `[0, node_count)`. Views over the full node space use the root ids
//! unchanged; filtered views renumber.
//!
//! A view instance caches cursors between calls and must stay on one
//! thread. Parallel readers each take their own [`Graph::concurrent_copy`].

use super::node_properties::NodePropertyValues;
use super::schema::GraphSchema;
use crate::types::{GraphError, NodeLabel, RelationshipType};
use std::fmt;
use std::sync::Arc;

/// Read access to a graph view.
pub trait Graph: Send + fmt::Debug {
    /// Number of nodes in this view.
    fn node_count(&self) -> u64;

    /// Number of nodes in the underlying root space.
    fn root_node_count(&self) -> u64;

    /// Number of stored relationships visible in this view.
    fn relationship_count(&self) -> u64;

    /// The schema of this view. Fails when constituent types conflict.
    fn schema(&self) -> Result<GraphSchema, GraphError>;

    fn relationship_types(&self) -> Vec<RelationshipType>;

    fn is_undirected(&self) -> bool;

    /// Whether parallel relationships may occur.
    fn is_multi_graph(&self) -> bool;

    /// Whether a relationship property was selected for this view.
    fn has_relationship_property(&self) -> bool;

    fn degree(&self, node: u64) -> usize;

    /// Number of distinct targets of `node`.
    fn degree_without_parallel_relationships(&self, node: u64) -> usize {
        if !self.is_multi_graph() {
            return self.degree(node);
        }
        let mut targets = Vec::with_capacity(self.degree(node));
        self.for_each_relationship(node, &mut |_, target| {
            targets.push(target);
            true
        });
        targets.sort_unstable();
        targets.dedup();
        targets.len()
    }

    /// Call `consumer(node, target)` for each relationship of `node` until it returns `false`.
    fn for_each_relationship(&self, node: u64, consumer: &mut dyn FnMut(u64, u64) -> bool);

    /// Like [`for_each_relationship`](Self::for_each_relationship) with the
    /// selected property value, or `fallback` when none was selected.
    fn for_each_relationship_with_property(
        &self,
        node: u64,
        fallback: f64,
        consumer: &mut dyn FnMut(u64, u64, f64) -> bool,
    );

    /// Property of the first `source -> target` relationship, or `None` when
    /// there is no such relationship. A view without a selected property
    /// yields `fallback` for relationships that exist.
    fn find_relationship_property(&self, source: u64, target: u64, fallback: f64) -> Option<f64>;

    /// Property of the first `source -> target` relationship, or `fallback`.
    fn relationship_property(&self, source: u64, target: u64, fallback: f64) -> f64 {
        self.find_relationship_property(source, target, fallback)
            .unwrap_or(fallback)
    }

    fn exists(&self, source: u64, target: u64) -> bool {
        let mut found = false;
        self.for_each_relationship(source, &mut |_, t| {
            found = t == target;
            !found
        });
        found
    }

    /// The `offset`-th target of `node`, or `NOT_FOUND` past its degree.
    fn nth_target(&self, node: u64, offset: usize) -> u64;

    fn to_root_node_id(&self, node: u64) -> u64;

    /// Mapped id of a root node, or `NOT_FOUND` when the view excludes it.
    fn to_mapped_node_id(&self, root: u64) -> u64;

    fn node_labels(&self, node: u64) -> Vec<NodeLabel>;

    fn has_label(&self, node: u64, label: &NodeLabel) -> bool;

    /// Values of node property `key`, addressed by mapped id.
    fn node_properties(&self, key: &str) -> Option<Arc<dyn NodePropertyValues>>;

    /// A view restricted to `types`.
    fn relationship_type_filtered_graph(
        &self,
        types: &[RelationshipType],
    ) -> Result<Box<dyn Graph>, GraphError>;

    /// An independent view over the same storage for another thread.
    fn concurrent_copy(&self) -> Box<dyn Graph>;
}
