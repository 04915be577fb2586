//! # Id Maps
//!
//! Node id spaces of graph views.
//!
//! - [`IdMap`]: the dense root space `[0, node_count)` with its label sets
//! - [`FilteredIdMap`]: a subset of the root space renumbered densely
//!
//! Mapped ids are the ids a view hands out; root ids are the ids the
//! topology stores.

use crate::collections::{HugeArray, HugeArrayBuilder, HugeBitSet, SparseLongArray};
use crate::mem;
use crate::types::{GraphError, NodeLabel};
use std::collections::BTreeMap;

// =============================================================================
// ROOT ID MAP
// =============================================================================

/// The root node space and its node-label multimap.
#[derive(Debug)]
pub struct IdMap {
    node_count: u64,
    labels: BTreeMap<NodeLabel, HugeBitSet>,
}

impl IdMap {
    /// A node space without labels; every node is in `ALL_NODES`.
    pub fn new(node_count: u64) -> Self {
        Self {
            node_count,
            labels: BTreeMap::new(),
        }
    }

    /// Add `label` to `node`. Fails when `node` is not in the space.
    pub fn add_label(&mut self, node: u64, label: NodeLabel) -> Result<(), GraphError> {
        if node >= self.node_count {
            return Err(GraphError::NodeOutOfRange {
                node,
                node_count: self.node_count,
            });
        }
        let node_count = self.node_count;
        self.labels
            .entry(label)
            .or_insert_with(|| HugeBitSet::new(node_count))
            .set(node);
        Ok(())
    }

    #[must_use]
    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    /// Labels that were explicitly assigned, in name order.
    pub fn available_labels(&self) -> impl Iterator<Item = &NodeLabel> + '_ {
        self.labels.keys()
    }

    #[must_use]
    pub fn has_label(&self, node: u64, label: &NodeLabel) -> bool {
        if label.is_all_nodes() {
            return node < self.node_count;
        }
        self.labels.get(label).is_some_and(|set| set.get(node))
    }

    /// Labels of `node`. An unlabelled node reports `ALL_NODES`.
    #[must_use]
    pub fn node_labels(&self, node: u64) -> Vec<NodeLabel> {
        let labels: Vec<NodeLabel> = self
            .labels
            .iter()
            .filter(|(_, set)| set.get(node))
            .map(|(label, _)| label.clone())
            .collect();
        if labels.is_empty() {
            vec![NodeLabel::all_nodes()]
        } else {
            labels
        }
    }

    /// Membership set of `label`, if it was assigned to any node.
    #[must_use]
    pub fn label_set(&self, label: &NodeLabel) -> Option<&HugeBitSet> {
        self.labels.get(label)
    }

    #[must_use]
    pub fn size_of(&self) -> u64 {
        mem::size_of_instance::<Self>()
            + self.labels.values().map(HugeBitSet::size_of).sum::<u64>()
    }

    /// Bytes of an id map with `label_count` label sets.
    #[must_use]
    pub fn memory_estimation(node_count: u64, label_count: u64) -> u64 {
        mem::size_of_instance::<Self>() + label_count * HugeBitSet::memory_estimation(node_count)
    }
}

// =============================================================================
// FILTERED ID MAP
// =============================================================================

/// A dense renumbering of the root nodes that pass a filter.
///
/// Filtered ids follow root order: the smallest member gets filtered id `0`.
/// The root side is a rank/select bit set, so a sparse filter over a large
/// root space costs one bit per root node.
#[derive(Debug)]
pub struct FilteredIdMap {
    filtered_to_root: HugeArray<u64>,
    root_to_filtered: SparseLongArray,
}

impl FilteredIdMap {
    /// Keep the root nodes for which `predicate` holds.
    pub fn from_predicate(root_node_count: u64, predicate: impl Fn(u64) -> bool) -> Self {
        let root_to_filtered = SparseLongArray::from_predicate(root_node_count, predicate);
        let mut filtered_to_root = HugeArrayBuilder::new();
        for root in root_to_filtered.iter() {
            filtered_to_root.push(root);
        }
        Self {
            filtered_to_root: filtered_to_root.build(),
            root_to_filtered,
        }
    }

    /// Keep the nodes carrying any of `labels`.
    ///
    /// Fails with [`GraphError::UnknownNodeLabel`] for a label no node carries.
    pub fn from_labels(id_map: &IdMap, labels: &[NodeLabel]) -> Result<Self, GraphError> {
        let mut sets = Vec::with_capacity(labels.len());
        for label in labels {
            if label.is_all_nodes() {
                return Ok(Self::from_predicate(id_map.node_count(), |_| true));
            }
            let set = id_map
                .label_set(label)
                .ok_or_else(|| GraphError::UnknownNodeLabel(label.name().to_string()))?;
            sets.push(set);
        }
        Ok(Self::from_predicate(id_map.node_count(), |node| {
            sets.iter().any(|set| set.get(node))
        }))
    }

    #[must_use]
    pub fn node_count(&self) -> u64 {
        self.filtered_to_root.size()
    }

    #[must_use]
    pub fn root_node_count(&self) -> u64 {
        self.root_to_filtered.capacity()
    }

    #[inline]
    #[must_use]
    pub fn to_root_node_id(&self, filtered: u64) -> u64 {
        self.filtered_to_root.get(filtered)
    }

    /// Filtered id of `root`, or [`NOT_FOUND`](crate::NOT_FOUND) when it is filtered out.
    #[inline]
    #[must_use]
    pub fn to_filtered_node_id(&self, root: u64) -> u64 {
        self.root_to_filtered.to_mapped_node_id(root)
    }

    #[inline]
    #[must_use]
    pub fn contains_root_node_id(&self, root: u64) -> bool {
        self.root_to_filtered.contains(root)
    }

    #[must_use]
    pub fn size_of(&self) -> u64 {
        self.filtered_to_root.size_of() + self.root_to_filtered.size_of()
    }
}

// =============================================================================
// TESTS
// =============================================================================
