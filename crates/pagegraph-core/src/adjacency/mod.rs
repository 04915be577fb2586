//! # Adjacency
//!
//! Compressed per-node target lists and the cursors reading them.
//!
//! - [`AdjacencyListBuilder`]: sorts, aggregates and compresses node batches
//! - [`AdjacencyList`]: shared byte pages plus degree and offset arrays
//! - [`CompressedAdjacencyCursor`]: reusable forward reader over one list
//! - [`AdjacencyProperties`]: relationship property columns in target order

mod builder;
mod cursor;
pub(crate) mod list;
mod properties;

pub use builder::AdjacencyListBuilder;
pub use cursor::{AdjacencyCursor, CompressedAdjacencyCursor};
pub use list::{AdjacencyList, AdjacencyPages};
pub use properties::{AdjacencyProperties, PropertyCursor};
