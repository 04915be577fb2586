//! # Adjacency Cursors
//!
//! Reusable readers over one node's target list.
//!
//! A cursor is initialised for a node, read forward, then either dropped or
//! re-initialised for the next node. Re-initialising never allocates.
//! One cursor must not be shared between threads; each thread takes its own,
//! all of them reading the same immutable pages.

use super::list::AdjacencyPages;
use crate::compression::AdjacencyDecompressingReader;
use crate::primitives::{ADJACENCY_PAGE_SHIFT, NOT_FOUND};
use std::sync::Arc;

/// Forward-only iteration over an ascending list of target ids.
///
/// Operations that run off the end return [`NOT_FOUND`] and leave the cursor
/// exhausted.
pub trait AdjacencyCursor {
    /// Number of targets of the current node.
    fn size(&self) -> usize;

    /// Targets not yet consumed.
    fn remaining(&self) -> usize;

    fn has_next(&self) -> bool {
        self.remaining() > 0
    }

    /// Consume and return the next target.
    fn next_id(&mut self) -> u64;

    /// Return the next target without consuming it.
    fn peek_id(&mut self) -> u64;

    /// Consume targets `<= target` and return the first one above it.
    fn skip_until(&mut self, target: u64) -> u64;

    /// Consume targets `< target` and return the first one at or above it.
    fn advance(&mut self, target: u64) -> u64;

    /// Skip `n` targets and consume and return the one after them.
    fn advance_by(&mut self, n: usize) -> u64;
}

/// Cursor over a compressed list in shared adjacency pages.
#[derive(Debug, Clone)]
pub struct CompressedAdjacencyCursor {
    pages: Arc<AdjacencyPages>,
    page: usize,
    reader: AdjacencyDecompressingReader,
    degree: usize,
    remaining: usize,
}

impl CompressedAdjacencyCursor {
    /// An uninitialised cursor over `pages`; it reports no targets until [`init`](Self::init).
    pub fn new(pages: Arc<AdjacencyPages>) -> Self {
        Self {
            pages,
            page: 0,
            reader: AdjacencyDecompressingReader::new(),
            degree: 0,
            remaining: 0,
        }
    }

    /// Position the cursor at the list stored at `address` with `degree` targets.
    #[inline]
    pub fn init(&mut self, address: u64, degree: usize) {
        self.page = (address >> ADJACENCY_PAGE_SHIFT) as usize;
        let mask = (1u64 << ADJACENCY_PAGE_SHIFT) - 1;
        self.reader.reset((address & mask) as usize);
        self.degree = degree;
        self.remaining = degree;
    }

    /// Copy this cursor's position into `dest` without allocating.
    pub fn shallow_copy_into(&self, dest: &mut Self) {
        if !Arc::ptr_eq(&self.pages, &dest.pages) {
            dest.pages = Arc::clone(&self.pages);
        }
        dest.page = self.page;
        dest.reader.copy_from(&self.reader);
        dest.degree = self.degree;
        dest.remaining = self.remaining;
    }

    /// Collect the remaining targets. Intended for tests and small lists.
    pub fn collect_remaining(&mut self) -> Vec<u64> {
        let mut out = Vec::with_capacity(self.remaining);
        while self.has_next() {
            out.push(self.next_id());
        }
        out
    }
}

impl AdjacencyCursor for CompressedAdjacencyCursor {
    #[inline]
    fn size(&self) -> usize {
        self.degree
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.remaining
    }

    #[inline]
    fn next_id(&mut self) -> u64 {
        if self.remaining == 0 {
            return NOT_FOUND;
        }
        let value = self.reader.next(self.pages.page(self.page), self.remaining);
        self.remaining -= 1;
        value
    }

    #[inline]
    fn peek_id(&mut self) -> u64 {
        if self.remaining == 0 {
            return NOT_FOUND;
        }
        self.reader.peek(self.pages.page(self.page), self.remaining)
    }

    fn skip_until(&mut self, target: u64) -> u64 {
        if self.remaining == 0 {
            return NOT_FOUND;
        }
        let (value, consumed) =
            self.reader
                .skip_until(self.pages.page(self.page), target, self.remaining);
        if value == NOT_FOUND {
            self.remaining = 0;
        } else {
            self.remaining -= consumed;
        }
        value
    }

    fn advance(&mut self, target: u64) -> u64 {
        if self.remaining == 0 {
            return NOT_FOUND;
        }
        let (value, consumed) = self
            .reader
            .advance(self.pages.page(self.page), target, self.remaining);
        if consumed == 0 {
            self.remaining = 0;
            return NOT_FOUND;
        }
        self.remaining -= consumed;
        value
    }

    fn advance_by(&mut self, n: usize) -> u64 {
        if n >= self.remaining {
            self.remaining = 0;
            return NOT_FOUND;
        }
        let (value, consumed) = self
            .reader
            .advance_by(self.pages.page(self.page), n, self.remaining);
        self.remaining -= consumed;
        value
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::AdjacencyListBuilder;
    use crate::adjacency::list::AdjacencyList;
    use crate::types::Aggregation;

    fn list_of(targets: &[u64]) -> AdjacencyList {
        let node_count = targets.iter().max().map_or(1, |m| m + 1);
        let mut builder =
            AdjacencyListBuilder::new(node_count, Aggregation::None, &[]).expect("builder");
        builder.add(0, &mut targets.to_vec(), &mut Vec::new()).expect("add");
        builder.build().0
    }

    #[test]
    fn skip_until_with_duplicates() {
        let list = list_of(&[0, 1, 2, 2, 3]);
        let mut cursor = list.adjacency_cursor(0);
        assert_eq!(cursor.skip_until(1), 2);
        assert_eq!(cursor.next_id(), 2);
        assert_eq!(cursor.next_id(), 3);
        assert!(!cursor.has_next());
    }

    #[test]
    fn skip_until_past_end() {
        let list = list_of(&[0, 1, 2, 2, 3]);
        let mut cursor = list.adjacency_cursor(0);
        assert_eq!(cursor.skip_until(3), NOT_FOUND);
        assert!(!cursor.has_next());

        let mut cursor = list.adjacency_cursor(0);
        assert_eq!(cursor.skip_until(5), NOT_FOUND);
    }

    #[test]
    fn advance_with_duplicates() {
        let list = list_of(&[0, 1, 2, 2, 3]);
        let mut cursor = list.adjacency_cursor(0);
        assert_eq!(cursor.advance(1), 1);
        assert_eq!(cursor.collect_remaining(), vec![2, 2, 3]);

        let mut cursor = list.adjacency_cursor(0);
        assert_eq!(cursor.advance(3), 3);
        assert!(!cursor.has_next());

        let mut cursor = list.adjacency_cursor(0);
        assert_eq!(cursor.advance(5), NOT_FOUND);
        assert!(!cursor.has_next());
    }

    #[test]
    fn advance_by_within_list() {
        let list = list_of(&[0, 1, 2, 3, 4]);
        for n in 0..5 {
            let mut cursor = list.adjacency_cursor(0);
            assert_eq!(cursor.advance_by(n), n as u64);
            assert_eq!(cursor.remaining(), 4 - n);
        }
        let mut cursor = list.adjacency_cursor(0);
        assert_eq!(cursor.advance_by(5), NOT_FOUND);
        assert!(!cursor.has_next());
    }

    #[test]
    fn advance_by_across_blocks() {
        let targets: Vec<u64> = (0..100).collect();
        let list = list_of(&targets);
        let mut cursor = list.adjacency_cursor(0);
        assert_eq!(cursor.advance_by(64), 64);
        assert_eq!(cursor.next_id(), 65);

        let mut cursor = list.adjacency_cursor(0);
        cursor.next_id();
        assert_eq!(cursor.advance_by(64), 65);
    }

    #[test]
    fn peek_across_blocks() {
        let targets: Vec<u64> = (0..100).collect();
        let list = list_of(&targets);
        let mut cursor = list.adjacency_cursor(0);
        for expected in 0..100 {
            assert_eq!(cursor.peek_id(), expected);
            assert_eq!(cursor.next_id(), expected);
        }
        assert_eq!(cursor.peek_id(), NOT_FOUND);
    }

    #[test]
    fn shallow_copy_across_blocks() {
        let targets: Vec<u64> = (0..100).collect();
        let list = list_of(&targets);
        let mut cursor = list.adjacency_cursor(0);
        cursor.advance_by(69);
        let mut copy = list.raw_adjacency_cursor();
        cursor.shallow_copy_into(&mut copy);
        assert_eq!(copy.remaining(), cursor.remaining());
        assert_eq!(copy.next_id(), 70);
        assert_eq!(cursor.next_id(), 70);
        assert_eq!(copy.collect_remaining(), (71..100).collect::<Vec<_>>());
    }

    #[test]
    fn block_boundary_skip_scenario() {
        let targets: Vec<u64> = (0..128).collect();
        let list = list_of(&targets);
        let mut cursor = list.adjacency_cursor(0);
        assert_eq!(cursor.skip_until(0), 1);
        assert_eq!(cursor.remaining(), 126);
        assert_eq!(cursor.skip_until(62), 63);
        assert_eq!(cursor.remaining(), 64);
        assert_eq!(cursor.skip_until(128), NOT_FOUND);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn empty_list_reports_not_found() {
        let list = list_of(&[]);
        let mut cursor = list.adjacency_cursor(0);
        assert_eq!(cursor.size(), 0);
        assert_eq!(cursor.next_id(), NOT_FOUND);
        assert_eq!(cursor.advance(0), NOT_FOUND);
    }
}
