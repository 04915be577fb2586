//! # Relationships
//!
//! Construction and storage of one relationship type.
//!
//! A [`RelationshipsBuilder`] buffers `(source, target, properties)` triples
//! of already-mapped node ids. `build()` groups them by source node with a
//! counting sort and feeds each node's batch to an [`AdjacencyListBuilder`].
//! The result is a [`SingleTypeRelationships`]: the topology, its property
//! columns and, optionally, the inverse topology.

use super::schema::{RelationshipPropertySchema, RelationshipSchemaEntry};
use crate::adjacency::{AdjacencyList, AdjacencyListBuilder, AdjacencyProperties};
use crate::compression::aggregation::resolve_aggregations;
use crate::mem;
use crate::primitives::NO_PROPERTY_VALUE;
use crate::types::{Aggregation, Direction, GraphError, Orientation, RelationshipType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// CONFIGURATION
// =============================================================================

fn no_property_value() -> f64 {
    NO_PROPERTY_VALUE
}

/// One relationship property of a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyConfig {
    pub key: String,
    #[serde(default)]
    pub aggregation: Aggregation,
    /// Value stored when a relationship is added without properties.
    #[serde(default = "no_property_value")]
    pub default_value: f64,
}

impl PropertyConfig {
    #[must_use]
    pub fn of(key: &str) -> Self {
        Self {
            key: key.to_string(),
            aggregation: Aggregation::Default,
            default_value: NO_PROPERTY_VALUE,
        }
    }
}

/// How one relationship type is laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipsConfig {
    pub relationship_type: RelationshipType,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub aggregation: Aggregation,
    /// Also build the topology of the opposite orientation.
    #[serde(default)]
    pub index_inverse: bool,
    #[serde(default)]
    pub properties: Vec<PropertyConfig>,
}

impl RelationshipsConfig {
    #[must_use]
    pub fn of(relationship_type: &str) -> Self {
        Self {
            relationship_type: RelationshipType::of(relationship_type),
            orientation: Orientation::Natural,
            aggregation: Aggregation::Default,
            index_inverse: false,
            properties: Vec::new(),
        }
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// A compressed adjacency list and whether it keeps parallel relationships.
#[derive(Debug, Clone)]
pub struct Topology {
    adjacency: Arc<AdjacencyList>,
    is_multi_graph: bool,
}

impl Topology {
    #[must_use]
    pub fn adjacency(&self) -> &Arc<AdjacencyList> {
        &self.adjacency
    }

    #[must_use]
    pub fn is_multi_graph(&self) -> bool {
        self.is_multi_graph
    }

    #[must_use]
    pub fn relationship_count(&self) -> u64 {
        self.adjacency.relationship_count()
    }
}

/// A property column with its policy.
#[derive(Debug, Clone)]
pub struct RelationshipProperty {
    pub key: String,
    pub values: AdjacencyProperties,
    pub default_value: f64,
    pub aggregation: Aggregation,
}

/// Everything stored for one relationship type.
#[derive(Debug)]
pub struct SingleTypeRelationships {
    relationship_type: RelationshipType,
    direction: Direction,
    topology: Topology,
    properties: Vec<RelationshipProperty>,
    inverse_topology: Option<Topology>,
    inverse_properties: Vec<AdjacencyProperties>,
}

impl SingleTypeRelationships {
    /// A type with no relationships over `node_count` nodes.
    pub fn empty(relationship_type: RelationshipType, node_count: u64) -> Self {
        Self {
            relationship_type,
            direction: Direction::Directed,
            topology: Topology {
                adjacency: Arc::new(AdjacencyList::empty(node_count)),
                is_multi_graph: false,
            },
            properties: Vec::new(),
            inverse_topology: None,
            inverse_properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn relationship_type(&self) -> &RelationshipType {
        &self.relationship_type
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub fn properties(&self) -> &[RelationshipProperty] {
        &self.properties
    }

    /// Column index of `key`.
    #[must_use]
    pub fn property_index(&self, key: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.key == key)
    }

    #[must_use]
    pub fn inverse_topology(&self) -> Option<&Topology> {
        self.inverse_topology.as_ref()
    }

    /// Column `index` of the inverse topology.
    #[must_use]
    pub fn inverse_property(&self, index: usize) -> Option<&AdjacencyProperties> {
        self.inverse_properties.get(index)
    }

    #[must_use]
    pub fn schema_entry(&self) -> RelationshipSchemaEntry {
        RelationshipSchemaEntry {
            direction: self.direction,
            properties: self
                .properties
                .iter()
                .map(|p| {
                    (
                        p.key.clone(),
                        RelationshipPropertySchema {
                            aggregation: p.aggregation,
                            default_value: p.default_value,
                        },
                    )
                })
                .collect::<BTreeMap<_, _>>(),
        }
    }

    /// Bytes of the forward and inverse adjacency lists.
    #[must_use]
    pub fn topology_size_of(&self) -> u64 {
        self.topology.adjacency.size_of()
            + self
                .inverse_topology
                .as_ref()
                .map_or(0, |t| t.adjacency.size_of())
    }

    /// Bytes of every property column, inverse columns included.
    #[must_use]
    pub fn property_size_of(&self) -> u64 {
        self.properties.iter().map(|p| p.values.size_of()).sum::<u64>()
            + self.inverse_properties.iter().map(AdjacencyProperties::size_of).sum::<u64>()
    }

    #[must_use]
    pub fn size_of(&self) -> u64 {
        mem::size_of_instance::<Self>() + self.topology_size_of() + self.property_size_of()
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Relationship triples grouped later by source.
#[derive(Debug, Default)]
struct EdgeBuffer {
    sources: Vec<u64>,
    targets: Vec<u64>,
    properties: Vec<f64>,
}

impl EdgeBuffer {
    fn push(&mut self, source: u64, target: u64, properties: &[f64]) {
        self.sources.push(source);
        self.targets.push(target);
        self.properties.extend_from_slice(properties);
    }

    fn build(
        self,
        node_count: u64,
        type_aggregation: Aggregation,
        aggregations: &[Aggregation],
    ) -> Result<(AdjacencyList, Vec<AdjacencyProperties>), GraphError> {
        let mut builder = AdjacencyListBuilder::new(node_count, type_aggregation, aggregations)?;
        let stride = aggregations.len();
        let nodes = node_count as usize;

        let mut starts = vec![0usize; nodes + 1];
        for &source in &self.sources {
            starts[source as usize + 1] += 1;
        }
        for node in 0..nodes {
            starts[node + 1] += starts[node];
        }
        let mut fill = starts.clone();
        let mut order = vec![0usize; self.sources.len()];
        for (edge, &source) in self.sources.iter().enumerate() {
            order[fill[source as usize]] = edge;
            fill[source as usize] += 1;
        }

        let mut targets = Vec::new();
        let mut properties = Vec::new();
        for node in 0..nodes {
            let batch = &order[starts[node]..starts[node + 1]];
            if batch.is_empty() {
                continue;
            }
            targets.clear();
            properties.clear();
            for &edge in batch {
                targets.push(self.targets[edge]);
                properties.extend_from_slice(&self.properties[edge * stride..(edge + 1) * stride]);
            }
            builder.add(node as u64, &mut targets, &mut properties)?;
        }
        Ok(builder.build())
    }
}

/// Endpoints of `source -> target` as stored under `orientation`.
fn oriented(orientation: Orientation, source: u64, target: u64) -> (u64, u64) {
    match orientation {
        Orientation::Natural | Orientation::Undirected => (source, target),
        Orientation::Reverse => (target, source),
    }
}

/// Collects the relationships of one type and builds its storage.
#[derive(Debug)]
pub struct RelationshipsBuilder {
    config: RelationshipsConfig,
    node_count: u64,
    aggregations: Vec<Aggregation>,
    defaults: Vec<f64>,
    is_multi_graph: bool,
    forward: EdgeBuffer,
    inverse: Option<EdgeBuffer>,
}

impl RelationshipsBuilder {
    /// Fails when the property aggregations conflict.
    pub fn new(node_count: u64, config: RelationshipsConfig) -> Result<Self, GraphError> {
        let requested: Vec<Aggregation> = config.properties.iter().map(|p| p.aggregation).collect();
        let (aggregations, collapse) = resolve_aggregations(config.aggregation, &requested)?;
        let defaults = config.properties.iter().map(|p| p.default_value).collect();
        let inverse = (config.index_inverse && config.orientation != Orientation::Undirected)
            .then(EdgeBuffer::default);
        Ok(Self {
            config,
            node_count,
            aggregations,
            defaults,
            is_multi_graph: !collapse,
            forward: EdgeBuffer::default(),
            inverse,
        })
    }

    /// Add a relationship, storing the configured defaults as its properties.
    pub fn add(&mut self, source: u64, target: u64) -> Result<(), GraphError> {
        let defaults = std::mem::take(&mut self.defaults);
        let result = self.add_with_properties(source, target, &defaults);
        self.defaults = defaults;
        result
    }

    /// Add a relationship with one value per configured property.
    pub fn add_with_properties(
        &mut self,
        source: u64,
        target: u64,
        properties: &[f64],
    ) -> Result<(), GraphError> {
        for node in [source, target] {
            if node >= self.node_count {
                return Err(GraphError::NodeOutOfRange {
                    node,
                    node_count: self.node_count,
                });
            }
        }
        if properties.len() != self.aggregations.len() {
            return Err(GraphError::PropertyCountMismatch {
                expected: self.aggregations.len(),
                actual: properties.len(),
            });
        }
        let orientation = self.config.orientation;
        let (from, to) = oriented(orientation, source, target);
        self.forward.push(from, to, properties);
        if orientation == Orientation::Undirected {
            self.forward.push(to, from, properties);
        }
        if let Some(inverse) = self.inverse.as_mut() {
            let (from, to) = oriented(orientation.inverse(), source, target);
            inverse.push(from, to, properties);
        }
        Ok(())
    }

    pub fn build(self) -> Result<SingleTypeRelationships, GraphError> {
        let Self {
            config,
            node_count,
            aggregations,
            is_multi_graph,
            forward,
            inverse,
            ..
        } = self;

        let (adjacency, columns) = forward.build(node_count, config.aggregation, &aggregations)?;
        let topology = Topology {
            adjacency: Arc::new(adjacency),
            is_multi_graph,
        };
        let (inverse_topology, inverse_properties) = match inverse {
            Some(buffer) => {
                let (adjacency, columns) =
                    buffer.build(node_count, config.aggregation, &aggregations)?;
                let topology = Topology {
                    adjacency: Arc::new(adjacency),
                    is_multi_graph,
                };
                (Some(topology), columns)
            }
            None => (None, Vec::new()),
        };

        let properties = config
            .properties
            .iter()
            .zip(aggregations.iter())
            .zip(columns)
            .map(|((property, aggregation), values)| RelationshipProperty {
                key: property.key.clone(),
                values,
                default_value: property.default_value,
                aggregation: *aggregation,
            })
            .collect();

        tracing::debug!(
            relationship_type = %config.relationship_type,
            node_count,
            relationship_count = topology.relationship_count(),
            compressed_bytes = topology.adjacency.compressed_bytes(),
            inverse = inverse_topology.is_some(),
            "built relationship type"
        );

        Ok(SingleTypeRelationships {
            relationship_type: config.relationship_type,
            direction: config.orientation.direction(),
            topology,
            properties,
            inverse_topology,
            inverse_properties,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn targets_of(relationships: &SingleTypeRelationships, node: u64) -> Vec<u64> {
        relationships
            .topology()
            .adjacency()
            .adjacency_cursor(node)
            .collect_remaining()
    }

    #[test]
    fn natural_orientation_keeps_direction() {
        let mut builder = RelationshipsBuilder::new(3, RelationshipsConfig::of("R")).expect("builder");
        builder.add(0, 2).expect("add");
        builder.add(0, 1).expect("add");
        builder.add(2, 1).expect("add");
        let rels = builder.build().expect("build");
        assert_eq!(targets_of(&rels, 0), vec![1, 2]);
        assert_eq!(targets_of(&rels, 1), Vec::<u64>::new());
        assert_eq!(rels.direction(), Direction::Directed);
        assert!(rels.topology().is_multi_graph());
    }

    #[test]
    fn reverse_orientation_swaps() {
        let mut config = RelationshipsConfig::of("R");
        config.orientation = Orientation::Reverse;
        let mut builder = RelationshipsBuilder::new(3, config).expect("builder");
        builder.add(0, 2).expect("add");
        let rels = builder.build().expect("build");
        assert_eq!(targets_of(&rels, 2), vec![0]);
        assert_eq!(rels.topology().relationship_count(), 1);
    }

    #[test]
    fn undirected_stores_both_directions() {
        let mut config = RelationshipsConfig::of("R");
        config.orientation = Orientation::Undirected;
        config.index_inverse = true;
        let mut builder = RelationshipsBuilder::new(3, config).expect("builder");
        builder.add(0, 2).expect("add");
        let rels = builder.build().expect("build");
        assert_eq!(targets_of(&rels, 0), vec![2]);
        assert_eq!(targets_of(&rels, 2), vec![0]);
        assert_eq!(rels.direction(), Direction::Undirected);
        assert!(rels.inverse_topology().is_none());
    }

    #[test]
    fn inverse_index_mirrors_forward() {
        let mut config = RelationshipsConfig::of("R");
        config.index_inverse = true;
        config.properties = vec![PropertyConfig::of("w")];
        let mut builder = RelationshipsBuilder::new(4, config).expect("builder");
        builder.add_with_properties(0, 3, &[1.5]).expect("add");
        builder.add_with_properties(1, 3, &[2.5]).expect("add");
        let rels = builder.build().expect("build");
        let inverse = rels.inverse_topology().expect("inverse");
        assert_eq!(inverse.adjacency().adjacency_cursor(3).collect_remaining(), vec![0, 1]);
        let column = rels.inverse_property(0).expect("column");
        let mut cursor = inverse.adjacency().property_cursor(column, 3);
        assert_eq!(cursor.next_property(), 1.5);
        assert_eq!(cursor.next_property(), 2.5);
    }

    #[test]
    fn reverse_inverse_index_stores_natural_direction() {
        let mut config = RelationshipsConfig::of("R");
        config.orientation = Orientation::Reverse;
        config.index_inverse = true;
        let mut builder = RelationshipsBuilder::new(4, config).expect("builder");
        builder.add(0, 3).expect("add");
        builder.add(2, 3).expect("add");
        let rels = builder.build().expect("build");
        assert_eq!(targets_of(&rels, 3), vec![0, 2]);
        let inverse = rels.inverse_topology().expect("inverse");
        assert_eq!(inverse.adjacency().adjacency_cursor(0).collect_remaining(), vec![3]);
        assert_eq!(inverse.adjacency().adjacency_cursor(2).collect_remaining(), vec![3]);
        assert_eq!(inverse.adjacency().degree(3), 0);
    }

    #[test]
    fn aggregation_collapses_and_keeps_defaults() {
        let mut config = RelationshipsConfig::of("R");
        config.aggregation = Aggregation::Max;
        config.properties = vec![PropertyConfig {
            key: "w".to_string(),
            aggregation: Aggregation::Default,
            default_value: 1.0,
        }];
        let mut builder = RelationshipsBuilder::new(2, config).expect("builder");
        builder.add_with_properties(0, 1, &[4.0]).expect("add");
        builder.add(0, 1).expect("add");
        let rels = builder.build().expect("build");
        assert!(!rels.topology().is_multi_graph());
        assert_eq!(rels.topology().relationship_count(), 1);
        let property = &rels.properties()[0];
        assert_eq!(property.aggregation, Aggregation::Max);
        assert_eq!(property.values.get(0), 4.0);
        assert_eq!(rels.property_index("w"), Some(0));
        assert_eq!(rels.schema_entry().properties["w"].default_value, 1.0);
    }

    #[test]
    fn invalid_input_is_rejected() {
        let mut config = RelationshipsConfig::of("R");
        config.properties = vec![PropertyConfig::of("w")];
        let mut builder = RelationshipsBuilder::new(2, config).expect("builder");
        assert_eq!(
            builder.add_with_properties(0, 2, &[1.0]),
            Err(GraphError::NodeOutOfRange { node: 2, node_count: 2 })
        );
        assert_eq!(
            builder.add_with_properties(0, 1, &[]),
            Err(GraphError::PropertyCountMismatch { expected: 1, actual: 0 })
        );
    }

    #[test]
    fn conflicting_property_aggregations_fail_early() {
        let mut config = RelationshipsConfig::of("R");
        config.properties = vec![
            PropertyConfig {
                key: "a".to_string(),
                aggregation: Aggregation::Sum,
                default_value: 0.0,
            },
            PropertyConfig {
                key: "b".to_string(),
                aggregation: Aggregation::None,
                default_value: 0.0,
            },
        ];
        let err = RelationshipsBuilder::new(2, config).expect_err("conflict");
        assert_eq!(err, GraphError::ConflictingAggregations);
    }
}
