//! # pagegraph-core
//!
//! The in-memory storage core of pagegraph - THE LAYOUT.
//!
//! This crate holds analytical graphs with billions of nodes and
//! relationships. Node-indexed data lives in paged arrays addressed by `u64`
//! ids, and every node's targets are delta-encoded into shared byte pages.
//!
//! ## Layers
//!
//! - `collections`: huge arrays, atomic arrays, bit sets, object arrays,
//!   a long-long hash map and sparse id arrays
//! - `compression`: the delta + varlong block codec
//! - `adjacency`: compressed lists, cursors and property columns
//! - `graph`: schema, id maps, graph views and the graph store
//! - `generator`: seeded synthetic graphs
//!
//! ## Architectural Constraints
//!
//! - Immutable after build: only atomic arrays are written concurrently
//! - Cursors are single-threaded; every worker takes its own copy
//! - No persistence, NO async, NO scheduler (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod adjacency;
pub mod collections;
pub mod compression;
pub mod generator;
pub mod graph;
pub mod mem;
pub mod primitives;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Aggregation, Direction, GraphError, NodeLabel, Orientation, RelationshipType, ValueType};

// =============================================================================
// RE-EXPORTS: Storage
// =============================================================================

pub use adjacency::{AdjacencyCursor, AdjacencyList, CompressedAdjacencyCursor};
pub use collections::{HugeArray, HugeAtomicArray, HugeBitSet, HugeLongLongMap, HugeObjectArray, SparseLongArray};
pub use mem::MemoryRange;
pub use primitives::{NO_PROPERTY_VALUE, NOT_FOUND};

// =============================================================================
// RE-EXPORTS: Graph Layer
// =============================================================================

pub use generator::{PropertyRange, RandomGraphConfig, RandomGraphGenerator, RelationshipDistribution};
pub use graph::{
    CompositeRelationshipIterator, DefaultValue, Graph, GraphDimensions, GraphSchema, GraphStore,
    GraphStoreBuilder, NodePropertyValues, RelationshipsBuilder, RelationshipsConfig,
};
