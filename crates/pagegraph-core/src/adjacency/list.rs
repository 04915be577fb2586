//! # Compressed Adjacency List
//!
//! All target lists of one topology, compressed into shared byte pages.
//!
//! ## Layout
//!
//! - `pages`: 256 KiB byte pages; a list never spans two pages, lists larger
//!   than a page get an oversized page of their own
//! - `offsets[node]`: address of the node's list, `page << 18 | offset`
//! - `degrees[node]`: number of targets
//! - `relationship_offsets[node]`: index of the node's first relationship in
//!   the parallel property arrays

use super::cursor::CompressedAdjacencyCursor;
use super::properties::{AdjacencyProperties, PropertyCursor};
use crate::collections::HugeArray;
use crate::compression::varlong;
use crate::mem::{self, MemoryRange};
use crate::primitives::{ADJACENCY_PAGE_SIZE, BLOCK_SIZE};
use std::sync::Arc;

/// Immutable byte pages holding compressed lists.
#[derive(Debug, Default)]
pub struct AdjacencyPages {
    pages: Vec<Box<[u8]>>,
}

impl AdjacencyPages {
    pub(crate) fn new(pages: Vec<Box<[u8]>>) -> Self {
        Self { pages }
    }

    #[inline]
    pub(crate) fn page(&self, index: usize) -> &[u8] {
        &self.pages[index]
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Compressed bytes held, excluding the page table.
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        self.pages.iter().map(|p| p.len() as u64).sum()
    }

    #[must_use]
    pub fn size_of(&self) -> u64 {
        mem::size_of_vec::<Box<[u8]>>(self.pages.len() as u64) + self.byte_size()
    }
}

/// Compressed targets of every node of one topology.
#[derive(Debug)]
pub struct AdjacencyList {
    pages: Arc<AdjacencyPages>,
    degrees: HugeArray<u32>,
    offsets: HugeArray<u64>,
    relationship_offsets: HugeArray<u64>,
    relationship_count: u64,
}

impl AdjacencyList {
    pub(crate) fn new(
        pages: AdjacencyPages,
        degrees: HugeArray<u32>,
        offsets: HugeArray<u64>,
        relationship_offsets: HugeArray<u64>,
        relationship_count: u64,
    ) -> Self {
        Self {
            pages: Arc::new(pages),
            degrees,
            offsets,
            relationship_offsets,
            relationship_count,
        }
    }

    /// A list with `node_count` nodes and no relationships.
    pub fn empty(node_count: u64) -> Self {
        Self::new(
            AdjacencyPages::default(),
            HugeArray::new(node_count),
            HugeArray::new(node_count),
            HugeArray::new(node_count),
            0,
        )
    }

    #[must_use]
    pub fn node_count(&self) -> u64 {
        self.degrees.size()
    }

    #[must_use]
    pub fn relationship_count(&self) -> u64 {
        self.relationship_count
    }

    #[inline]
    #[must_use]
    pub fn degree(&self, node: u64) -> usize {
        self.degrees.get(node) as usize
    }

    /// Index of `node`'s first relationship in the property arrays.
    #[inline]
    #[must_use]
    pub fn relationship_offset(&self, node: u64) -> u64 {
        self.relationship_offsets.get(node)
    }

    /// A cursor not yet positioned on any node.
    #[must_use]
    pub fn raw_adjacency_cursor(&self) -> CompressedAdjacencyCursor {
        CompressedAdjacencyCursor::new(Arc::clone(&self.pages))
    }

    /// A fresh cursor over `node`'s targets.
    #[must_use]
    pub fn adjacency_cursor(&self, node: u64) -> CompressedAdjacencyCursor {
        let mut cursor = self.raw_adjacency_cursor();
        self.adjacency_cursor_reuse(&mut cursor, node);
        cursor
    }

    /// Re-position `reuse` on `node` without allocating.
    #[inline]
    pub fn adjacency_cursor_reuse(&self, reuse: &mut CompressedAdjacencyCursor, node: u64) {
        reuse.init(self.offsets.get(node), self.degree(node));
    }

    /// A fresh cursor over the property values of `node`'s relationships.
    #[must_use]
    pub fn property_cursor(&self, properties: &AdjacencyProperties, node: u64) -> PropertyCursor {
        let mut cursor = properties.raw_property_cursor();
        self.property_cursor_reuse(&mut cursor, node);
        cursor
    }

    #[inline]
    pub fn property_cursor_reuse(&self, reuse: &mut PropertyCursor, node: u64) {
        reuse.init(self.relationship_offset(node), self.degree(node));
    }

    /// Compressed bytes, excluding degrees and offsets.
    #[must_use]
    pub fn compressed_bytes(&self) -> u64 {
        self.pages.byte_size()
    }

    #[must_use]
    pub fn size_of(&self) -> u64 {
        self.pages.size_of()
            + self.degrees.size_of()
            + self.offsets.size_of()
            + self.relationship_offsets.size_of()
    }

    /// Drop this list's hold on its pages and arrays; returns the bytes it accounted for.
    ///
    /// Cursors created earlier keep the pages alive until they are dropped.
    pub fn release(&mut self) -> u64 {
        let arrays =
            self.degrees.release() + self.offsets.release() + self.relationship_offsets.release();
        if arrays == 0 {
            return 0;
        }
        let freed = arrays + self.pages.size_of();
        self.pages = Arc::new(AdjacencyPages::default());
        tracing::trace!(freed, "released adjacency list");
        freed
    }

    /// Range of bytes a list with these counts compresses to.
    ///
    /// The lower bound assumes one byte per delta, the upper bound deltas as
    /// wide as an evenly spread neighbourhood produces.
    #[must_use]
    pub fn memory_estimation(node_count: u64, relationship_count: u64) -> MemoryRange {
        let arrays = HugeArray::<u32>::memory_estimation(node_count)
            + 2 * HugeArray::<u64>::memory_estimation(node_count)
            + mem::size_of_instance::<Self>();
        if node_count == 0 || relationship_count == 0 {
            return MemoryRange::of(arrays);
        }
        let average_degree = relationship_count.div_ceil(node_count);
        let blocks = average_degree.div_ceil(BLOCK_SIZE as u64);

        let best_per_node = average_degree + blocks * 2;

        let max_delta = node_count / average_degree;
        let header = (varlong::encoded_size(node_count)
            + varlong::encoded_size((BLOCK_SIZE * varlong::MAX_ENCODED_SIZE) as u64))
            as u64;
        let worst_per_node = varlong::encoded_size(node_count) as u64
            + (average_degree - 1) * varlong::encoded_size(max_delta) as u64
            + blocks * header;

        let pages = |bytes: u64| {
            let page_count = bytes.div_ceil(ADJACENCY_PAGE_SIZE as u64);
            mem::size_of_vec::<Box<[u8]>>(page_count) + bytes
        };
        MemoryRange::between(
            arrays + pages(best_per_node * node_count),
            arrays + pages(worst_per_node * node_count),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::{AdjacencyCursor, AdjacencyListBuilder};
    use crate::types::Aggregation;

    #[test]
    fn lists_share_pages() {
        let mut builder =
            AdjacencyListBuilder::new(4, Aggregation::None, &[]).expect("builder");
        builder.add(0, &mut vec![1, 2, 3], &mut Vec::new()).expect("add");
        builder.add(2, &mut vec![0, 3], &mut Vec::new()).expect("add");
        let (list, _) = builder.build();
        assert_eq!(list.node_count(), 4);
        assert_eq!(list.relationship_count(), 5);
        assert_eq!(list.degree(1), 0);
        assert_eq!(list.relationship_offset(2), 3);
        let mut cursor = list.adjacency_cursor(2);
        assert_eq!(cursor.collect_remaining(), vec![0, 3]);
        list.adjacency_cursor_reuse(&mut cursor, 0);
        assert_eq!(cursor.next_id(), 1);
    }

    #[test]
    fn oversized_lists_get_their_own_page() {
        let mut builder = AdjacencyListBuilder::new(3, Aggregation::None, &[]).expect("builder");
        // two bytes per delta, more than one page in total
        let big: Vec<u64> = (0..140_000).map(|i| i * 130).collect();
        builder.add(1, &mut vec![5, 6], &mut Vec::new()).expect("add");
        builder.add(0, &mut big.clone(), &mut Vec::new()).expect("add");
        builder.add(2, &mut vec![7], &mut Vec::new()).expect("add");
        let (list, _) = builder.build();
        assert!(list.pages.page_count() >= 2);
        assert_eq!(list.adjacency_cursor(0).collect_remaining(), big);
        assert_eq!(list.adjacency_cursor(1).collect_remaining(), vec![5, 6]);
        assert_eq!(list.adjacency_cursor(2).collect_remaining(), vec![7]);
    }

    #[test]
    fn estimation_brackets_actual_size() {
        let node_count = 1000u64;
        let mut builder =
            AdjacencyListBuilder::new(node_count, Aggregation::None, &[]).expect("builder");
        for node in 0..node_count {
            let mut targets: Vec<u64> = (0..10).map(|i| (node * 7 + i * 97) % node_count).collect();
            builder.add(node, &mut targets, &mut Vec::new()).expect("add");
        }
        let (list, _) = builder.build();
        let estimate = AdjacencyList::memory_estimation(node_count, list.relationship_count());
        assert!(estimate.min <= estimate.max);
        assert!(list.compressed_bytes() <= estimate.max);
    }

    #[test]
    fn release_twice() {
        let mut list = AdjacencyList::empty(10);
        assert!(list.release() > 0);
        assert_eq!(list.release(), 0);
    }
}
