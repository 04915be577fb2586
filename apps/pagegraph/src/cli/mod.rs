//! # Pagegraph CLI Module
//!
//! This module implements the CLI interface for pagegraph.
//!
//! ## Available Commands
//!
//! - `estimate` - Memory range of a graph store of a given shape
//! - `generate` - Build a random graph and report its footprint
//! - `traverse` - Walk a random graph in parallel and check the totals

mod commands;

use crate::config::{AppConfig, GenerateDefaults, SizeUnit};
use crate::error::CliError;
use clap::{Args, Parser, Subcommand};
use pagegraph_core::{
    Aggregation, GraphDimensions, Orientation, PropertyRange, RandomGraphConfig, RelationshipDistribution,
    RelationshipType,
};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// pagegraph - paged in-memory graph storage
///
/// Estimates, builds and walks compressed analytical graphs.
#[derive(Parser, Debug)]
#[command(name = "pagegraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// TOML file with command defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Estimate the memory range of a graph store
    Estimate {
        /// Number of nodes
        #[arg(long)]
        nodes: u64,

        /// Number of stored relationships
        #[arg(long)]
        relationships: u64,

        /// Node property columns
        #[arg(long, default_value = "0")]
        node_properties: u64,

        /// Relationship property columns
        #[arg(long, default_value = "0")]
        relationship_properties: u64,

        /// Distinct node labels
        #[arg(long, default_value = "0")]
        labels: u64,

        /// Print sizes in K, M, G (binary) or KB, MB, GB (decimal)
        #[arg(long)]
        block_size_unit: Option<SizeUnit>,
    },

    /// Build a random graph and report its shape
    Generate(GenerateArgs),

    /// Walk every relationship of a random graph in parallel
    Traverse {
        #[command(flatten)]
        graph: GenerateArgs,

        /// Worker threads (defaults to the number of CPUs)
        #[arg(short, long)]
        threads: Option<usize>,
    },
}

/// Flags shared by the commands that build a random graph.
#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Number of nodes
    #[arg(long)]
    pub nodes: Option<u64>,

    /// Average out-degree
    #[arg(long)]
    pub average_degree: Option<u64>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// UNIFORM, RANDOM or POWER_LAW
    #[arg(long)]
    pub distribution: Option<RelationshipDistribution>,

    /// NATURAL, REVERSE or UNDIRECTED
    #[arg(long)]
    pub orientation: Option<Orientation>,

    /// NONE, SINGLE, SUM, MIN, MAX or COUNT
    #[arg(long)]
    pub aggregation: Option<Aggregation>,

    /// Relationship type name
    #[arg(long)]
    pub relationship_type: Option<String>,

    /// Add a relationship property with this key
    #[arg(long)]
    pub property_key: Option<String>,

    /// Allow relationships from a node to itself
    #[arg(long)]
    pub allow_self_loops: bool,
}

impl GenerateArgs {
    /// Merge flags over file defaults.
    #[must_use]
    pub fn resolve(&self, defaults: &GenerateDefaults) -> RandomGraphConfig {
        let relationship_type = self
            .relationship_type
            .as_deref()
            .unwrap_or(&defaults.relationship_type);
        let property_key = self.property_key.as_ref().or(defaults.property_key.as_ref());
        RandomGraphConfig {
            node_count: self.nodes.unwrap_or(defaults.node_count),
            average_degree: self.average_degree.unwrap_or(defaults.average_degree),
            relationship_type: RelationshipType::of(relationship_type),
            distribution: self.distribution.unwrap_or(defaults.distribution),
            seed: self.seed.unwrap_or(defaults.seed),
            orientation: self.orientation.unwrap_or(defaults.orientation),
            aggregation: self.aggregation.unwrap_or(defaults.aggregation),
            index_inverse: false,
            allow_self_loops: self.allow_self_loops,
            labels: Vec::new(),
            relationship_property: property_key.map(|key| PropertyRange {
                key: key.clone(),
                min: 0.0,
                max: 1.0,
            }),
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let json = cli.json;

    match cli.command {
        Commands::Estimate {
            nodes,
            relationships,
            node_properties,
            relationship_properties,
            labels,
            block_size_unit,
        } => {
            let dimensions = GraphDimensions {
                node_count: nodes,
                relationship_count: relationships,
                node_property_count: node_properties,
                relationship_property_count: relationship_properties,
                label_count: labels,
            };
            let unit = block_size_unit.or(config.estimate.block_size_unit);
            let report = cmd_estimate(&dimensions, unit);
            print_report(&report, json)
        }
        Commands::Generate(args) => {
            let report = cmd_generate(&args.resolve(&config.generate))?;
            print_report(&report, json)
        }
        Commands::Traverse { graph, threads } => {
            let report = cmd_traverse(&graph.resolve(&config.generate), threads)?;
            print_report(&report, json)
        }
    }
}
