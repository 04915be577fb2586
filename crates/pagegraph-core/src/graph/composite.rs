//! # Composite Relationship Iterator
//!
//! Walks one relationship type's targets together with any number of its
//! property columns, in the column order the caller asked for.
//!
//! Requested keys the type does not store read as NaN. The property slice
//! handed to the consumer is a reused buffer, valid for that call only.

use super::relationships::SingleTypeRelationships;
use crate::adjacency::{AdjacencyCursor, CompressedAdjacencyCursor, PropertyCursor};
use crate::primitives::NO_PROPERTY_VALUE;
use crate::types::{Direction, GraphError};
use std::sync::Arc;

/// Lockstep iteration over targets and property columns of one type.
///
/// One instance per thread; use [`concurrent_copy`](Self::concurrent_copy)
/// for each additional worker.
#[derive(Debug)]
pub struct CompositeRelationshipIterator {
    relationships: Arc<SingleTypeRelationships>,
    columns: Vec<Option<usize>>,
    cursor: CompressedAdjacencyCursor,
    properties: Vec<Option<PropertyCursor>>,
    inverse: Option<(CompressedAdjacencyCursor, Vec<Option<PropertyCursor>>)>,
    buffer: Vec<f64>,
}

impl CompositeRelationshipIterator {
    pub fn new(relationships: Arc<SingleTypeRelationships>, keys: &[&str]) -> Self {
        let columns: Vec<Option<usize>> =
            keys.iter().map(|key| relationships.property_index(key)).collect();
        Self::with_columns(relationships, columns)
    }

    fn with_columns(relationships: Arc<SingleTypeRelationships>, columns: Vec<Option<usize>>) -> Self {
        let topology = relationships.topology();
        let cursor = topology.adjacency().raw_adjacency_cursor();
        let properties = columns
            .iter()
            .map(|column| column.map(|c| relationships.properties()[c].values.raw_property_cursor()))
            .collect();
        let inverse = relationships.inverse_topology().map(|inverse| {
            let cursors = columns
                .iter()
                .map(|column| {
                    column
                        .and_then(|c| relationships.inverse_property(c))
                        .map(|values| values.raw_property_cursor())
                })
                .collect();
            (inverse.adjacency().raw_adjacency_cursor(), cursors)
        });
        let buffer = vec![NO_PROPERTY_VALUE; columns.len()];
        Self {
            relationships,
            columns,
            cursor,
            properties,
            inverse,
            buffer,
        }
    }

    /// Number of properties passed to each consumer call.
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn degree(&self, node: u64) -> usize {
        self.relationships.topology().adjacency().degree(node)
    }

    /// Call `consumer(node, target, properties)` per relationship until it returns `false`.
    pub fn for_each_relationship(
        &mut self,
        node: u64,
        mut consumer: impl FnMut(u64, u64, &[f64]) -> bool,
    ) {
        let adjacency = self.relationships.topology().adjacency();
        adjacency.adjacency_cursor_reuse(&mut self.cursor, node);
        for cursor in self.properties.iter_mut().flatten() {
            adjacency.property_cursor_reuse(cursor, node);
        }
        drain(&mut self.cursor, &mut self.properties, &mut self.buffer, node, &mut consumer);
    }

    /// Like [`for_each_relationship`](Self::for_each_relationship) over the inverse topology.
    ///
    /// Undirected types are their own inverse. Fails for directed types built
    /// without an inverse index.
    pub fn for_each_inverse_relationship(
        &mut self,
        node: u64,
        mut consumer: impl FnMut(u64, u64, &[f64]) -> bool,
    ) -> Result<(), GraphError> {
        if self.relationships.direction() == Direction::Undirected {
            self.for_each_relationship(node, consumer);
            return Ok(());
        }
        let (Some(topology), Some((cursor, properties))) =
            (self.relationships.inverse_topology(), self.inverse.as_mut())
        else {
            return Err(GraphError::MissingInverseIndex(
                self.relationships.relationship_type().name().to_string(),
            ));
        };
        let adjacency = topology.adjacency();
        adjacency.adjacency_cursor_reuse(cursor, node);
        for cursor in properties.iter_mut().flatten() {
            adjacency.property_cursor_reuse(cursor, node);
        }
        drain(cursor, properties, &mut self.buffer, node, &mut consumer);
        Ok(())
    }

    /// A new iterator over the same storage with its own cursors.
    #[must_use]
    pub fn concurrent_copy(&self) -> Self {
        Self::with_columns(Arc::clone(&self.relationships), self.columns.clone())
    }
}

fn drain(
    cursor: &mut CompressedAdjacencyCursor,
    properties: &mut [Option<PropertyCursor>],
    buffer: &mut [f64],
    node: u64,
    consumer: &mut impl FnMut(u64, u64, &[f64]) -> bool,
) {
    while cursor.has_next() {
        let target = cursor.next_id();
        for (slot, property) in buffer.iter_mut().zip(properties.iter_mut()) {
            *slot = property
                .as_mut()
                .map_or(NO_PROPERTY_VALUE, PropertyCursor::next_property);
        }
        if !consumer(node, target, buffer) {
            return;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::relationships::{PropertyConfig, RelationshipsBuilder, RelationshipsConfig};
    use crate::types::Orientation;

    fn relationships(orientation: Orientation, index_inverse: bool) -> Arc<SingleTypeRelationships> {
        let mut config = RelationshipsConfig::of("R");
        config.orientation = orientation;
        config.index_inverse = index_inverse;
        config.properties = vec![PropertyConfig::of("a"), PropertyConfig::of("b")];
        let mut builder = RelationshipsBuilder::new(3, config).expect("builder");
        builder.add_with_properties(0, 2, &[1.0, 10.0]).expect("add");
        builder.add_with_properties(0, 1, &[2.0, 20.0]).expect("add");
        builder.add_with_properties(1, 2, &[3.0, 30.0]).expect("add");
        Arc::new(builder.build().expect("build"))
    }

    fn collect(iter: &mut CompositeRelationshipIterator, node: u64) -> Vec<(u64, Vec<f64>)> {
        let mut out = Vec::new();
        iter.for_each_relationship(node, |_, t, props| {
            out.push((t, props.to_vec()));
            true
        });
        out
    }

    #[test]
    fn follows_requested_key_order() {
        let mut iter = CompositeRelationshipIterator::new(relationships(Orientation::Natural, false), &["b", "a"]);
        assert_eq!(iter.property_count(), 2);
        assert_eq!(
            collect(&mut iter, 0),
            vec![(1, vec![20.0, 2.0]), (2, vec![10.0, 1.0])]
        );
        assert_eq!(iter.degree(0), 2);
    }

    #[test]
    fn missing_keys_read_as_nan() {
        let mut iter =
            CompositeRelationshipIterator::new(relationships(Orientation::Natural, false), &["a", "zzz"]);
        let rows = collect(&mut iter, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1[0], 3.0);
        assert!(rows[0].1[1].is_nan());
    }

    #[test]
    fn no_keys_yield_empty_slices() {
        let mut iter = CompositeRelationshipIterator::new(relationships(Orientation::Natural, false), &[]);
        let mut count = 0;
        iter.for_each_relationship(0, |_, _, props| {
            assert!(props.is_empty());
            count += 1;
            count < 1
        });
        assert_eq!(count, 1);
    }

    #[test]
    fn inverse_iteration() {
        let mut iter = CompositeRelationshipIterator::new(relationships(Orientation::Natural, true), &["a"]);
        let mut seen = Vec::new();
        iter.for_each_inverse_relationship(2, |node, t, props| {
            seen.push((node, t, props[0]));
            true
        })
        .expect("inverse");
        assert_eq!(seen, vec![(2, 0, 1.0), (2, 1, 3.0)]);
    }

    #[test]
    fn inverse_without_index_fails() {
        let mut iter = CompositeRelationshipIterator::new(relationships(Orientation::Natural, false), &[]);
        let err = iter
            .for_each_inverse_relationship(2, |_, _, _| true)
            .expect_err("no inverse");
        assert_eq!(err, GraphError::MissingInverseIndex("R".to_string()));

        let mut undirected =
            CompositeRelationshipIterator::new(relationships(Orientation::Undirected, false), &[]);
        assert!(undirected.for_each_inverse_relationship(2, |_, _, _| true).is_ok());
    }

    #[test]
    fn copies_iterate_independently() {
        let mut iter = CompositeRelationshipIterator::new(relationships(Orientation::Natural, false), &["a"]);
        let mut copy = iter.concurrent_copy();
        let mut from_copy = Vec::new();
        iter.for_each_relationship(0, |_, t, _| {
            copy.for_each_relationship(1, |_, inner, _| {
                from_copy.push(inner);
                true
            });
            t < 2
        });
        assert_eq!(from_copy, vec![2, 2]);
    }
}
