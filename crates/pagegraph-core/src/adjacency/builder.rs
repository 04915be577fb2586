//! Builds an [`AdjacencyList`] and its property columns from per-node batches.
//!
//! Each node is added at most once with all its targets. Batches are sorted,
//! aggregated, compressed and placed into the current byte page; a batch that
//! does not fit seals the page and starts a new one.

use super::list::{AdjacencyList, AdjacencyPages};
use super::properties::AdjacencyProperties;
use crate::collections::{HugeArray, HugeArrayBuilder};
use crate::compression::DeltaVarLongCompressor;
use crate::compression::aggregation::{resolve_aggregations, sort_and_aggregate};
use crate::primitives::{ADJACENCY_PAGE_SHIFT, ADJACENCY_PAGE_SIZE};
use crate::types::{Aggregation, GraphError};

pub struct AdjacencyListBuilder {
    aggregations: Vec<Aggregation>,
    collapse: bool,
    compressor: DeltaVarLongCompressor,
    scratch: Vec<u8>,
    sealed: Vec<Box<[u8]>>,
    current: Vec<u8>,
    degrees: HugeArray<u32>,
    offsets: HugeArray<u64>,
    relationship_offsets: HugeArray<u64>,
    relationship_count: u64,
    properties: Vec<HugeArrayBuilder<f64>>,
}

/// Degrees are stored as `u32`.
fn stored_degree(degree: usize) -> Result<u32, GraphError> {
    u32::try_from(degree).map_err(|_| GraphError::CountOverflow {
        what: "degree",
        value: degree as u64,
        width: "u32",
    })
}

impl AdjacencyListBuilder {
    /// Fails when `NONE` is mixed with collapsing property aggregations.
    pub fn new(
        node_count: u64,
        type_aggregation: Aggregation,
        property_aggregations: &[Aggregation],
    ) -> Result<Self, GraphError> {
        let (aggregations, collapse) =
            resolve_aggregations(type_aggregation, property_aggregations)?;
        let properties = aggregations.iter().map(|_| HugeArrayBuilder::new()).collect();
        Ok(Self {
            aggregations,
            collapse,
            compressor: DeltaVarLongCompressor::new(),
            scratch: Vec::new(),
            sealed: Vec::new(),
            current: Vec::new(),
            degrees: HugeArray::new(node_count),
            offsets: HugeArray::new(node_count),
            relationship_offsets: HugeArray::new(node_count),
            relationship_count: 0,
            properties,
        })
    }

    /// Number of property columns the built list carries.
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.aggregations.len()
    }

    /// Add all relationships of `node`.
    ///
    /// `properties` holds one row of `property_count()` values per target.
    /// Both buffers are reordered in place. Returns the degree stored.
    pub fn add(
        &mut self,
        node: u64,
        targets: &mut Vec<u64>,
        properties: &mut Vec<f64>,
    ) -> Result<usize, GraphError> {
        let node_count = self.degrees.size();
        if node >= node_count {
            return Err(GraphError::NodeOutOfRange { node, node_count });
        }
        let stride = self.aggregations.len();
        let expected = targets.len() * stride;
        if properties.len() != expected {
            return Err(GraphError::PropertyCountMismatch {
                expected,
                actual: properties.len(),
            });
        }

        let degree = sort_and_aggregate(targets, properties, &self.aggregations, self.collapse);
        let stored = stored_degree(degree)?;

        self.scratch.clear();
        self.compressor.compress(targets, &mut self.scratch);
        let address = self.place();

        self.degrees.set(node, stored);
        self.offsets.set(node, address);
        self.relationship_offsets.set(node, self.relationship_count);
        self.relationship_count += degree as u64;

        for (column, builder) in self.properties.iter_mut().enumerate() {
            for row in 0..degree {
                builder.push(properties[row * stride + column]);
            }
        }
        Ok(degree)
    }

    /// Copy the scratch bytes into a page and return their address.
    fn place(&mut self) -> u64 {
        let len = self.scratch.len();
        if self.current.len() + len > ADJACENCY_PAGE_SIZE {
            self.seal();
        }
        if len > ADJACENCY_PAGE_SIZE {
            let page = self.sealed.len() as u64;
            self.sealed.push(self.scratch.clone().into_boxed_slice());
            return page << ADJACENCY_PAGE_SHIFT;
        }
        if len > 0 && self.current.capacity() == 0 {
            self.current.reserve_exact(ADJACENCY_PAGE_SIZE);
        }
        let page = self.sealed.len() as u64;
        let offset = self.current.len() as u64;
        self.current.extend_from_slice(&self.scratch);
        (page << ADJACENCY_PAGE_SHIFT) | offset
    }

    fn seal(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let page = std::mem::take(&mut self.current);
        self.sealed.push(page.into_boxed_slice());
    }

    pub fn build(mut self) -> (AdjacencyList, Vec<AdjacencyProperties>) {
        self.seal();
        let pages = AdjacencyPages::new(self.sealed);
        tracing::trace!(
            pages = pages.page_count(),
            relationships = self.relationship_count,
            "built adjacency list"
        );
        let list = AdjacencyList::new(
            pages,
            self.degrees,
            self.offsets,
            self.relationship_offsets,
            self.relationship_count,
        );
        let properties = self
            .properties
            .into_iter()
            .map(|builder| AdjacencyProperties::new(builder.build()))
            .collect();
        (list, properties)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::AdjacencyCursor;

    #[test]
    fn unsorted_input_is_sorted() {
        let mut builder = AdjacencyListBuilder::new(10, Aggregation::None, &[]).expect("builder");
        builder.add(3, &mut vec![9, 1, 5, 1], &mut Vec::new()).expect("add");
        let (list, properties) = builder.build();
        assert!(properties.is_empty());
        assert_eq!(list.adjacency_cursor(3).collect_remaining(), vec![1, 1, 5, 9]);
    }

    #[test]
    fn sum_collapses_parallel_relationships() {
        let mut builder =
            AdjacencyListBuilder::new(4, Aggregation::Sum, &[Aggregation::Default]).expect("builder");
        let degree = builder.add(0, &mut vec![2, 1, 2], &mut vec![1.0, 5.0, 3.0]).expect("add");
        assert_eq!(degree, 2);
        builder.add(1, &mut vec![3], &mut vec![7.0]).expect("add");
        let (list, properties) = builder.build();
        assert_eq!(list.relationship_count(), 3);
        assert_eq!(list.adjacency_cursor(0).collect_remaining(), vec![1, 2]);

        let mut cursor = list.property_cursor(&properties[0], 0);
        assert_eq!(cursor.next_property(), 5.0);
        assert_eq!(cursor.next_property(), 4.0);
        assert!(!cursor.has_next());
        list.property_cursor_reuse(&mut cursor, 1);
        assert_eq!(cursor.next_property(), 7.0);
    }

    #[test]
    fn mixed_aggregations_are_rejected() {
        let result =
            AdjacencyListBuilder::new(4, Aggregation::None, &[Aggregation::Max, Aggregation::None]);
        assert!(matches!(result, Err(GraphError::ConflictingAggregations)));
    }

    #[test]
    fn properties_follow_sorted_targets() {
        let mut builder = AdjacencyListBuilder::new(4, Aggregation::None, &[Aggregation::None])
            .expect("builder");
        builder.add(0, &mut vec![3, 1, 2], &mut vec![30.0, 10.0, 20.0]).expect("add");
        let (list, properties) = builder.build();
        let mut cursor = list.property_cursor(&properties[0], 0);
        let mut targets = list.adjacency_cursor(0);
        while targets.has_next() {
            let target = targets.next_id();
            assert_eq!(cursor.next_property(), target as f64 * 10.0);
        }
    }

    #[test]
    fn short_property_buffer_is_rejected() {
        let mut builder =
            AdjacencyListBuilder::new(4, Aggregation::Sum, &[Aggregation::Sum]).expect("builder");
        let err = builder.add(0, &mut vec![1, 2, 3], &mut vec![1.0]).expect_err("one value for three targets");
        assert_eq!(err, GraphError::PropertyCountMismatch { expected: 3, actual: 1 });

        let err = builder.add(4, &mut vec![1], &mut vec![1.0]).expect_err("node past the end");
        assert_eq!(err, GraphError::NodeOutOfRange { node: 4, node_count: 4 });

        builder.add(0, &mut vec![1, 2], &mut vec![1.0, 2.0]).expect("well-formed batch");
        let (list, _) = builder.build();
        assert_eq!(list.degree(0), 2);
    }

    #[test]
    fn degree_above_u32_is_an_error() {
        assert_eq!(stored_degree(u32::MAX as usize), Ok(u32::MAX));
        assert_eq!(
            stored_degree(u32::MAX as usize + 1),
            Err(GraphError::CountOverflow {
                what: "degree",
                value: u64::from(u32::MAX) + 1,
                width: "u32",
            })
        );
    }

    #[test]
    fn untouched_nodes_have_no_targets() {
        let builder = AdjacencyListBuilder::new(3, Aggregation::None, &[]).expect("builder");
        let (list, _) = builder.build();
        assert_eq!(list.degree(2), 0);
        assert_eq!(list.adjacency_cursor(2).next_id(), crate::primitives::NOT_FOUND);
    }
}
