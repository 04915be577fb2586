//! # Node-Filtered Graph
//!
//! A view exposing only the nodes of a [`FilteredIdMap`] and the
//! relationships between them.
//!
//! Nodes are renumbered densely; every read translates filtered ids to root
//! ids, reads the shared topology, and translates targets back. Targets
//! outside the filter are skipped while iterating. No topology bytes are copied.

use super::api::Graph;
use super::huge_graph::HugeGraph;
use super::id_map::FilteredIdMap;
use super::node_properties::{
    FilteredNodePropertyValues, NodePropertyValues, OriginalNodePropertyValues,
};
use super::schema::GraphSchema;
use crate::adjacency::{AdjacencyCursor, CompressedAdjacencyCursor};
use crate::collections::{ConstantPages, HugeAtomicArray};
use crate::primitives::NOT_FOUND;
use crate::types::{GraphError, NodeLabel, RelationshipType};
use std::sync::{Arc, OnceLock};

// =============================================================================
// FILTERING CURSOR
// =============================================================================

/// Wraps a root-space cursor and yields only root ids inside the filter.
///
/// Keeps one member of lookahead so `has_next` is exact. `remaining()` is an
/// upper bound: the inner cursor's remaining ids may still be filtered out.
#[derive(Debug)]
pub struct NodeFilteredAdjacencyCursor<C: AdjacencyCursor> {
    inner: C,
    filter: Arc<FilteredIdMap>,
    next: u64,
}

impl<C: AdjacencyCursor> NodeFilteredAdjacencyCursor<C> {
    pub fn new(inner: C, filter: Arc<FilteredIdMap>) -> Self {
        let mut cursor = Self {
            inner,
            filter,
            next: NOT_FOUND,
        };
        cursor.fetch();
        cursor
    }

    /// Load the next member from the inner cursor into the lookahead.
    fn fetch(&mut self) {
        self.next = NOT_FOUND;
        while self.inner.has_next() {
            let candidate = self.inner.next_id();
            if self.filter.contains_root_node_id(candidate) {
                self.next = candidate;
                return;
            }
        }
    }

    /// Return `candidate` or the first member after it, refilling the lookahead.
    fn settle(&mut self, mut candidate: u64) -> u64 {
        while candidate != NOT_FOUND && !self.filter.contains_root_node_id(candidate) {
            candidate = self.inner.next_id();
        }
        self.fetch();
        candidate
    }
}

impl<C: AdjacencyCursor> AdjacencyCursor for NodeFilteredAdjacencyCursor<C> {
    fn size(&self) -> usize {
        self.inner.size()
    }

    fn remaining(&self) -> usize {
        self.inner.remaining() + usize::from(self.next != NOT_FOUND)
    }

    fn has_next(&self) -> bool {
        self.next != NOT_FOUND
    }

    fn next_id(&mut self) -> u64 {
        let value = self.next;
        if value != NOT_FOUND {
            self.fetch();
        }
        value
    }

    fn peek_id(&mut self) -> u64 {
        self.next
    }

    fn skip_until(&mut self, target: u64) -> u64 {
        if self.next == NOT_FOUND {
            return NOT_FOUND;
        }
        if self.next > target {
            return self.next_id();
        }
        let candidate = self.inner.skip_until(target);
        self.settle(candidate)
    }

    fn advance(&mut self, target: u64) -> u64 {
        if self.next == NOT_FOUND {
            return NOT_FOUND;
        }
        if self.next >= target {
            return self.next_id();
        }
        let candidate = self.inner.advance(target);
        self.settle(candidate)
    }

    fn advance_by(&mut self, n: usize) -> u64 {
        for _ in 0..n {
            if self.next_id() == NOT_FOUND {
                return NOT_FOUND;
            }
        }
        self.next_id()
    }
}

// =============================================================================
// FILTERED VIEW
// =============================================================================

const UNKNOWN_DEGREE: i64 = -1;

/// A [`HugeGraph`] restricted to the nodes of a filter.
#[derive(Debug)]
pub struct NodeFilteredGraph {
    inner: HugeGraph,
    filter: Arc<FilteredIdMap>,
    labels: Vec<NodeLabel>,
    degrees: Arc<HugeAtomicArray<i64>>,
    relationship_count: Arc<OnceLock<u64>>,
}

impl NodeFilteredGraph {
    /// `labels` names the filter in the schema; pass none for a predicate filter.
    pub fn new(inner: HugeGraph, filter: Arc<FilteredIdMap>, labels: Vec<NodeLabel>) -> Self {
        let degrees = Arc::new(HugeAtomicArray::of(
            filter.node_count(),
            ConstantPages(UNKNOWN_DEGREE),
        ));
        Self {
            inner,
            filter,
            labels,
            degrees,
            relationship_count: Arc::new(OnceLock::new()),
        }
    }

    #[must_use]
    pub fn filter(&self) -> &Arc<FilteredIdMap> {
        &self.filter
    }

    /// Cursor over the root ids of `node`'s targets inside the filter.
    #[must_use]
    pub fn adjacency_cursor(&self, node: u64) -> NodeFilteredAdjacencyCursor<CompressedAdjacencyCursor> {
        let root = self.filter.to_root_node_id(node);
        NodeFilteredAdjacencyCursor::new(self.inner.adjacency_cursor(root), Arc::clone(&self.filter))
    }

    /// Expose values computed in this view's id space by root id.
    #[must_use]
    pub fn original_node_properties(
        &self,
        values: Arc<dyn NodePropertyValues>,
    ) -> Arc<dyn NodePropertyValues> {
        Arc::new(OriginalNodePropertyValues::new(values, Arc::clone(&self.filter)))
    }

    /// A copy over the same topology, sharing the degree cache.
    fn copy(&self) -> Self {
        Self {
            inner: self.inner.copy(),
            filter: Arc::clone(&self.filter),
            labels: self.labels.clone(),
            degrees: Arc::clone(&self.degrees),
            relationship_count: Arc::clone(&self.relationship_count),
        }
    }

    /// The same filter over a type-filtered inner graph, with fresh caches.
    fn filter_types(&self, types: &[RelationshipType]) -> Result<Self, GraphError> {
        let inner = self.inner.filter_types(types)?;
        Ok(Self::new(inner, Arc::clone(&self.filter), self.labels.clone()))
    }
}

impl Graph for NodeFilteredGraph {
    fn node_count(&self) -> u64 {
        self.filter.node_count()
    }

    fn root_node_count(&self) -> u64 {
        self.inner.root_node_count()
    }

    fn relationship_count(&self) -> u64 {
        *self.relationship_count.get_or_init(|| {
            (0..self.node_count())
                .map(|node| self.degree(node) as u64)
                .sum()
        })
    }

    fn schema(&self) -> Result<GraphSchema, GraphError> {
        let schema = self.inner.schema()?;
        if self.labels.is_empty() || self.labels.iter().any(NodeLabel::is_all_nodes) {
            return Ok(schema);
        }
        Ok(schema.filter_node_labels(&self.labels))
    }

    fn relationship_types(&self) -> Vec<RelationshipType> {
        self.inner.relationship_types()
    }

    fn is_undirected(&self) -> bool {
        self.inner.is_undirected()
    }

    fn is_multi_graph(&self) -> bool {
        self.inner.is_multi_graph()
    }

    fn has_relationship_property(&self) -> bool {
        self.inner.has_relationship_property()
    }

    fn degree(&self, node: u64) -> usize {
        let cached = self.degrees.get(node);
        if cached != UNKNOWN_DEGREE {
            return cached as usize;
        }
        let mut cursor = self.adjacency_cursor(node);
        let mut degree = 0usize;
        while cursor.next_id() != NOT_FOUND {
            degree += 1;
        }
        self.degrees.compare_and_set(node, UNKNOWN_DEGREE, degree as i64);
        degree
    }

    fn for_each_relationship(&self, node: u64, consumer: &mut dyn FnMut(u64, u64) -> bool) {
        let root = self.filter.to_root_node_id(node);
        self.inner.for_each_relationship(root, &mut |_, target| {
            let mapped = self.filter.to_filtered_node_id(target);
            mapped == NOT_FOUND || consumer(node, mapped)
        });
    }

    fn for_each_relationship_with_property(
        &self,
        node: u64,
        fallback: f64,
        consumer: &mut dyn FnMut(u64, u64, f64) -> bool,
    ) {
        let root = self.filter.to_root_node_id(node);
        self.inner
            .for_each_relationship_with_property(root, fallback, &mut |_, target, value| {
                let mapped = self.filter.to_filtered_node_id(target);
                mapped == NOT_FOUND || consumer(node, mapped, value)
            });
    }

    fn find_relationship_property(&self, source: u64, target: u64, fallback: f64) -> Option<f64> {
        if source >= self.node_count() || target >= self.node_count() {
            return None;
        }
        self.inner.find_relationship_property(
            self.filter.to_root_node_id(source),
            self.filter.to_root_node_id(target),
            fallback,
        )
    }

    fn exists(&self, source: u64, target: u64) -> bool {
        if target >= self.node_count() {
            return false;
        }
        let root_target = self.filter.to_root_node_id(target);
        self.adjacency_cursor(source).advance(root_target) == root_target
    }

    fn nth_target(&self, node: u64, offset: usize) -> u64 {
        let root = self.adjacency_cursor(node).advance_by(offset);
        if root == NOT_FOUND {
            return NOT_FOUND;
        }
        self.filter.to_filtered_node_id(root)
    }

    fn to_root_node_id(&self, node: u64) -> u64 {
        self.inner.to_root_node_id(self.filter.to_root_node_id(node))
    }

    fn to_mapped_node_id(&self, root: u64) -> u64 {
        self.filter.to_filtered_node_id(root)
    }

    fn node_labels(&self, node: u64) -> Vec<NodeLabel> {
        self.inner.node_labels(self.filter.to_root_node_id(node))
    }

    fn has_label(&self, node: u64, label: &NodeLabel) -> bool {
        self.inner.has_label(self.filter.to_root_node_id(node), label)
    }

    fn node_properties(&self, key: &str) -> Option<Arc<dyn NodePropertyValues>> {
        let root = self.inner.node_properties(key)?;
        Some(Arc::new(FilteredNodePropertyValues::new(root, Arc::clone(&self.filter))))
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
