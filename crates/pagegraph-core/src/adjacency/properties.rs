//! Relationship property values stored parallel to an adjacency list.
//!
//! Values of node `n` occupy `relationship_offset(n) .. relationship_offset(n) + degree(n)`,
//! in the same order as the node's sorted targets.

use crate::collections::HugeArray;
use crate::mem;
use crate::primitives::NO_PROPERTY_VALUE;
use std::sync::Arc;

/// One property column of a topology.
#[derive(Debug, Clone)]
pub struct AdjacencyProperties {
    values: Arc<HugeArray<f64>>,
}

impl AdjacencyProperties {
    pub fn new(values: HugeArray<f64>) -> Self {
        Self {
            values: Arc::new(values),
        }
    }

    /// Number of stored values, one per relationship.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.values.size()
    }

    /// Value at relationship position `index`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: u64) -> f64 {
        self.values.get(index)
    }

    /// A cursor positioned on nothing.
    #[must_use]
    pub fn raw_property_cursor(&self) -> PropertyCursor {
        PropertyCursor {
            values: Arc::clone(&self.values),
            index: 0,
            end: 0,
        }
    }

    #[must_use]
    pub fn size_of(&self) -> u64 {
        mem::size_of_instance::<Self>() + self.values.size_of()
    }
}

/// Reads one node's property values in target order.
#[derive(Debug, Clone)]
pub struct PropertyCursor {
    values: Arc<HugeArray<f64>>,
    index: u64,
    end: u64,
}

impl PropertyCursor {
    #[inline]
    pub fn init(&mut self, start: u64, degree: usize) {
        self.index = start;
        self.end = start + degree as u64;
    }

    #[inline]
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.index < self.end
    }

    /// Next value, or NaN once the node's values are exhausted.
    #[inline]
    pub fn next_property(&mut self) -> f64 {
        if !self.has_next() {
            return NO_PROPERTY_VALUE;
        }
        let value = self.values.get(self.index);
        self.index += 1;
        value
    }
}
