//! # Graph Layer
//!
//! Node spaces, relationship storage and the views algorithms read.
//!
//! ## Views
//!
//! | View | Purpose |
//! |------|---------|
//! | [`HugeGraph`] | One relationship type over the whole node space |
//! | [`NodeFilteredGraph`] | A node subset with filtered ids `[0, n')` |
//! | [`UnionGraph`] | Several types read as one multi-graph |
//!
//! All views implement [`Graph`]. A [`GraphStore`] composes them, and hands
//! out [`CompositeRelationshipIterator`]s for multi-property reads.

mod api;
mod composite;
mod filtered;
mod huge_graph;
mod id_map;
mod node_properties;
mod relationships;
mod schema;
mod store;
mod union;

pub use api::Graph;
pub use composite::CompositeRelationshipIterator;
pub use filtered::{NodeFilteredAdjacencyCursor, NodeFilteredGraph};
pub use huge_graph::{HugeGraph, NodePropertyMap};
pub use id_map::{FilteredIdMap, IdMap};
pub use node_properties::{
    DEFAULT_DOUBLE_VALUE, DEFAULT_LONG_VALUE, DefaultValue, DoubleArrayNodePropertyValues, FilteredNodePropertyValues,
    LongArrayNodePropertyValues, NodePropertyValues, OriginalNodePropertyValues,
};
pub use relationships::{
    PropertyConfig, RelationshipProperty, RelationshipsBuilder, RelationshipsConfig, SingleTypeRelationships,
    Topology,
};
pub use schema::{GraphSchema, RelationshipPropertySchema, RelationshipSchemaEntry};
pub use store::{GraphDimensions, GraphStore, GraphStoreBuilder};
pub use union::UnionGraph;
