//! # Random Graph Generator
//!
//! Seeded synthetic graphs for tests, benchmarks and the CLI.
//!
//! ## Distributions
//!
//! | Distribution | Out-degree | Target |
//! |--------------|------------|--------|
//! | `Uniform` | exactly the average degree | uniform |
//! | `Random` | uniform in `[0, 2 * average]` | uniform |
//! | `PowerLaw` | normal around the average | power-law, then swapped |
//!
//! For `PowerLaw` the drawn `(node, target)` pair is stored as
//! `target -> node`, so the in-degree is normal and the out-degree follows
//! the power law.
//!
//! The same config and seed always produce the same graph.

use crate::graph::{GraphStore, GraphStoreBuilder, PropertyConfig, RelationshipsBuilder, RelationshipsConfig};
use crate::primitives::NO_PROPERTY_VALUE;
use crate::types::{Aggregation, GraphError, NodeLabel, Orientation, RelationshipType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// How out-degrees and targets are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipDistribution {
    #[default]
    Uniform,
    Random,
    PowerLaw,
}

impl std::str::FromStr for RelationshipDistribution {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "UNIFORM" => Ok(Self::Uniform),
            "RANDOM" => Ok(Self::Random),
            "POWER_LAW" | "POWERLAW" => Ok(Self::PowerLaw),
            other => Err(GraphError::InvalidOption {
                option: "distribution",
                value: other.to_string(),
            }),
        }
    }
}

/// A relationship property drawn uniformly from `[min, max)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRange {
    pub key: String,
    pub min: f64,
    pub max: f64,
}

impl PropertyRange {
    fn sample(&self, rng: &mut ChaCha8Rng) -> f64 {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomGraphConfig {
    pub node_count: u64,
    pub average_degree: u64,
    pub relationship_type: RelationshipType,
    pub distribution: RelationshipDistribution,
    pub seed: u64,
    pub orientation: Orientation,
    pub aggregation: Aggregation,
    pub index_inverse: bool,
    pub allow_self_loops: bool,
    /// Node `i` gets `labels[i % labels.len()]`; empty means unlabelled.
    pub labels: Vec<NodeLabel>,
    pub relationship_property: Option<PropertyRange>,
}

impl Default for RandomGraphConfig {
    fn default() -> Self {
        Self {
            node_count: 100,
            average_degree: 10,
            relationship_type: RelationshipType::of("REL"),
            distribution: RelationshipDistribution::Uniform,
            seed: 1,
            orientation: Orientation::Natural,
            aggregation: Aggregation::Default,
            index_inverse: false,
            allow_self_loops: false,
            labels: Vec::new(),
            relationship_property: None,
        }
    }
}

// =============================================================================
// GENERATOR
// =============================================================================

#[derive(Debug)]
pub struct RandomGraphGenerator {
    config: RandomGraphConfig,
    rng: ChaCha8Rng,
}

impl RandomGraphGenerator {
    pub fn new(config: RandomGraphConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    #[must_use]
    pub fn config(&self) -> &RandomGraphConfig {
        &self.config
    }

    /// Build a store holding one relationship type.
    pub fn generate(&mut self) -> Result<GraphStore, GraphError> {
        let node_count = self.config.node_count;
        let mut store = GraphStoreBuilder::new(node_count);
        if !self.config.labels.is_empty() {
            let labels = &self.config.labels;
            for node in 0..node_count {
                store.add_label(node, labels[(node % labels.len() as u64) as usize].clone())?;
            }
        }

        let relationships_config = RelationshipsConfig {
            relationship_type: self.config.relationship_type.clone(),
            orientation: self.config.orientation,
            aggregation: self.config.aggregation,
            index_inverse: self.config.index_inverse,
            properties: self
                .config
                .relationship_property
                .iter()
                .map(|range| PropertyConfig {
                    key: range.key.clone(),
                    aggregation: self.config.aggregation,
                    default_value: NO_PROPERTY_VALUE,
                })
                .collect(),
        };
        let mut relationships = RelationshipsBuilder::new(node_count, relationships_config)?;
        self.generate_relationships(&mut relationships)?;
        store.add_relationships(relationships.build()?);

        tracing::debug!(
            node_count,
            average_degree = self.config.average_degree,
            distribution = ?self.config.distribution,
            seed = self.config.seed,
            "generated random graph"
        );
        Ok(store.build())
    }

    fn generate_relationships(&mut self, relationships: &mut RelationshipsBuilder) -> Result<(), GraphError> {
        let node_count = self.config.node_count;
        let allow_self_loops = self.config.allow_self_loops;
        if node_count == 0 {
            return Ok(());
        }
        if node_count == 1 && !allow_self_loops {
            tracing::warn!(
                node_count,
                "self-loops are disallowed on a single-node graph, skipping relationships"
            );
            return Ok(());
        }

        let mut values = Vec::with_capacity(1);
        for node in 0..node_count {
            let degree = self.degree();
            for _ in 0..degree {
                let mut target = self.target();
                while !allow_self_loops && target == node {
                    target = self.target();
                }
                values.clear();
                if let Some(range) = &self.config.relationship_property {
                    values.push(range.sample(&mut self.rng));
                }
                let (source, target) = match self.config.distribution {
                    RelationshipDistribution::PowerLaw => (target, node),
                    _ => (node, target),
                };
                relationships.add_with_properties(source, target, &values)?;
            }
        }
        Ok(())
    }

    fn degree(&mut self) -> u64 {
        let average = self.config.average_degree;
        match self.config.distribution {
            RelationshipDistribution::Uniform => average,
            RelationshipDistribution::Random => self.rng.gen_range(0..=2 * average),
            RelationshipDistribution::PowerLaw => {
                // Box-Muller
                let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
                let u2: f64 = self.rng.gen_range(0.0..1.0);
                let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
                let mean = average as f64;
                (mean + z * mean / 2.0).round().max(0.0) as u64
            }
        }
    }

    fn target(&mut self) -> u64 {
        let node_count = self.config.node_count;
        match self.config.distribution {
            RelationshipDistribution::Uniform | RelationshipDistribution::Random => {
                self.rng.gen_range(0..node_count)
            }
            RelationshipDistribution::PowerLaw => {
                let u: f64 = self.rng.gen_range(0.0..1.0);
                let drawn = ((node_count + 1) as f64).powf(u).floor() as u64;
                drawn.saturating_sub(1).min(node_count - 1)
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
