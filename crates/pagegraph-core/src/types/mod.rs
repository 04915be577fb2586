//! # Core Types
//!
//! Identifiers, policies and the error type shared by every pagegraph module.
//!
//! This module contains:
//! - Label and relationship type identifiers (`NodeLabel`, `RelationshipType`)
//! - Projection policies (`Orientation`, `Direction`, `Aggregation`)
//! - Property value kinds (`ValueType`)
//! - Error types (`GraphError`)
//!
//! Node ids are plain `u64` values in the dense range `[0, node_count)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// LABELS & TYPES
// =============================================================================

/// A node label. A node carries zero or more labels.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeLabel(pub String);

impl NodeLabel {
    /// Label standing for "every node", used when no label filter applies.
    pub const ALL_NODES: &'static str = "__ALL__";

    #[must_use]
    pub fn of(name: &str) -> Self {
        Self(name.to_string())
    }

    #[must_use]
    pub fn all_nodes() -> Self {
        Self(Self::ALL_NODES.to_string())
    }

    #[must_use]
    pub fn is_all_nodes(&self) -> bool {
        self.0 == Self::ALL_NODES
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The type identifier of a relationship topology.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationshipType(pub String);

impl RelationshipType {
    /// Type of a view that holds no relationship type at all.
    pub const ALL_RELATIONSHIPS: &'static str = "__ALL__";

    #[must_use]
    pub fn of(name: &str) -> Self {
        Self(name.to_string())
    }

    #[must_use]
    pub fn all_relationships() -> Self {
        Self(Self::ALL_RELATIONSHIPS.to_string())
    }

    #[must_use]
    pub fn is_all_relationships(&self) -> bool {
        self.0 == Self::ALL_RELATIONSHIPS
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// PROJECTION POLICIES
// =============================================================================

/// How input relationships are laid out in a topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Orientation {
    /// Store `source -> target`.
    #[default]
    Natural,
    /// Store `target -> source`.
    Reverse,
    /// Store both directions.
    Undirected,
}

impl Orientation {
    /// Schema direction of a topology built with this orientation.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::Natural | Self::Reverse => Direction::Directed,
            Self::Undirected => Direction::Undirected,
        }
    }

    /// The orientation of the inverse index of this orientation.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Natural => Self::Reverse,
            Self::Reverse => Self::Natural,
            Self::Undirected => Self::Undirected,
        }
    }
}

impl std::str::FromStr for Orientation {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NATURAL" => Ok(Self::Natural),
            "REVERSE" => Ok(Self::Reverse),
            "UNDIRECTED" => Ok(Self::Undirected),
            other => Err(GraphError::InvalidOption {
                option: "orientation",
                value: other.to_string(),
            }),
        }
    }
}

/// Directionality of a relationship type in a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Directed,
    Undirected,
}

/// Policy applied to parallel relationships (same source and target).
///
/// `Default` resolves to `None`. Every variant except `None` collapses
/// parallel relationships into one and merges their property values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Aggregation {
    #[default]
    Default,
    /// Keep every parallel relationship.
    None,
    /// Keep the first relationship, drop the rest.
    Single,
    Sum,
    Min,
    Max,
    /// Property value becomes the number of collapsed relationships.
    Count,
}

impl Aggregation {
    /// Replace `Default` with the concrete policy it stands for.
    #[must_use]
    pub const fn resolve(self) -> Self {
        match self {
            Self::Default => Self::None,
            other => other,
        }
    }

    /// Whether parallel relationships are merged into one.
    #[must_use]
    pub const fn collapses(self) -> bool {
        !matches!(self.resolve(), Self::None)
    }
}

impl std::str::FromStr for Aggregation {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEFAULT" => Ok(Self::Default),
            "NONE" => Ok(Self::None),
            "SINGLE" => Ok(Self::Single),
            "SUM" => Ok(Self::Sum),
            "MIN" => Ok(Self::Min),
            "MAX" => Ok(Self::Max),
            "COUNT" => Ok(Self::Count),
            other => Err(GraphError::InvalidOption {
                option: "aggregation",
                value: other.to_string(),
            }),
        }
    }
}

/// Kind of a node property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    Long,
    Double,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised while building graphs or resolving graph views.
///
/// - Hot-path reads never return this type; absence is signalled by
///   [`NOT_FOUND`](crate::primitives::NOT_FOUND)
/// - Index misuse on arrays is a fault, not a `GraphError`
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    /// The same relationship type is directed in one topology and undirected in another.
    #[error(
        "Conflicting directionality for relationship types {}",
        .types.join(", ")
    )]
    ConflictingDirectionality { types: Vec<String> },

    /// `NONE` was mixed with a collapsing aggregation on one relationship type.
    #[error(
        "Conflicting relationship property aggregations, it is not allowed to mix `NONE` with aggregations."
    )]
    ConflictingAggregations,

    /// The relationship type is not present.
    #[error("Unknown relationship type: {0}")]
    UnknownRelationshipType(String),

    /// The property key is not present.
    #[error("Unknown property key: {0}")]
    UnknownPropertyKey(String),

    /// The node label is not present.
    #[error("Unknown node label: {0}")]
    UnknownNodeLabel(String),

    /// A view was asked for relationship types it does not hold.
    #[error("Unsupported relationship types {requested:?}, available: {available:?}")]
    UnsupportedRelationshipTypes {
        requested: Vec<String>,
        available: Vec<String>,
    },

    /// A union view was requested over no graphs.
    #[error("A union graph needs at least one graph")]
    EmptyUnion,

    /// A node id outside `[0, node_count)` was passed to a builder.
    #[error("Node id {node} is out of range for {node_count} nodes")]
    NodeOutOfRange { node: u64, node_count: u64 },

    /// A relationship carried a different number of property values than configured.
    #[error("Expected {expected} property values, got {actual}")]
    PropertyCountMismatch { expected: usize, actual: usize },

    /// Pre-built pages cannot hold the requested size.
    #[error("Size should be smaller than or equal to capacity {capacity}, but got size {size}")]
    CapacityExceeded { size: u64, capacity: u64 },

    /// A pre-built page does not have the length its position requires.
    #[error("Page {page} holds {len} elements, expected {expected}")]
    MisshapedPage { page: usize, len: usize, expected: String },

    /// A count does not fit the width it is stored in.
    #[error("{what} {value} does not fit in {width}")]
    CountOverflow {
        what: &'static str,
        value: u64,
        width: &'static str,
    },

    /// The key is reserved by a hash map's slot encoding.
    #[error("Key {0} is reserved and cannot be stored")]
    ReservedKey(u64),

    /// Inverse traversal was requested from a topology built without an inverse index.
    #[error("Relationship type {0} was built without an inverse index")]
    MissingInverseIndex(String),

    /// An option string could not be parsed.
    #[error("Invalid {option}: {value}")]
    InvalidOption { option: &'static str, value: String },
}

// =============================================================================
// TESTS
// =============================================================================
