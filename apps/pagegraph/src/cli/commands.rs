//! # CLI Command Implementations
//!
//! Each command returns a report; `execute` renders it as text or JSON.

use crate::config::SizeUnit;
use crate::error::CliError;
use pagegraph_core::mem;
use pagegraph_core::{
    Graph, GraphDimensions, GraphStore, HugeLongLongMap, RandomGraphConfig, RandomGraphGenerator,
};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;

/// Relative tolerance between parallel and sequential property sums.
const SUM_TOLERANCE: f64 = 1e-9;

/// Print `report` as pretty JSON or as its text form.
pub fn print_report<R: Serialize + fmt::Display>(report: &R, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

fn render(bytes: u64, unit: Option<SizeUnit>) -> String {
    unit.map_or_else(|| mem::human_readable(bytes), |unit| unit.format(bytes))
}

// =============================================================================
// ESTIMATE COMMAND
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct EstimateReport {
    pub dimensions: GraphDimensions,
    pub min_bytes: u64,
    pub max_bytes: u64,
    pub min: String,
    pub max: String,
}

impl fmt::Display for EstimateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Memory Estimate")?;
        writeln!(f, "  Nodes:                   {}", self.dimensions.node_count)?;
        writeln!(f, "  Relationships:           {}", self.dimensions.relationship_count)?;
        writeln!(f, "  Node properties:         {}", self.dimensions.node_property_count)?;
        writeln!(f, "  Relationship properties: {}", self.dimensions.relationship_property_count)?;
        writeln!(f, "  Labels:                  {}", self.dimensions.label_count)?;
        writeln!(f)?;
        writeln!(f, "  Range: {} .. {}", self.min, self.max)
    }
}

/// Memory range of a graph store with `dimensions`.
pub fn cmd_estimate(dimensions: &GraphDimensions, unit: Option<SizeUnit>) -> EstimateReport {
    let range = GraphStore::memory_estimation(dimensions);
    tracing::debug!(min = range.min, max = range.max, "estimated graph store");
    EstimateReport {
        dimensions: *dimensions,
        min_bytes: range.min,
        max_bytes: range.max,
        min: render(range.min, unit),
        max: render(range.max, unit),
    }
}

// =============================================================================
// GENERATE COMMAND
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DegreeStats {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    /// Number of distinct degrees.
    pub distinct: u64,
    /// Most frequent degree; the smaller one on ties.
    pub mode: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport {
    pub config: RandomGraphConfig,
    pub node_count: u64,
    pub relationship_count: u64,
    pub degree: DegreeStats,
    pub topology_bytes: u64,
    pub property_bytes: u64,
    pub total_bytes: u64,
}

impl fmt::Display for GenerateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Random Graph ({:?}, seed {})", self.config.distribution, self.config.seed)?;
        writeln!(f, "  Nodes:          {}", self.node_count)?;
        writeln!(f, "  Relationships:  {}", self.relationship_count)?;
        writeln!(
            f,
            "  Degree:         min {} / max {} / mean {:.2}",
            self.degree.min, self.degree.max, self.degree.mean
        )?;
        writeln!(
            f,
            "  Degree spread:  {} distinct / mode {}",
            self.degree.distinct, self.degree.mode
        )?;
        writeln!(f, "  Topology:       {}", mem::human_readable(self.topology_bytes))?;
        writeln!(f, "  Properties:     {}", mem::human_readable(self.property_bytes))?;
        writeln!(f, "  Total:          {}", mem::human_readable(self.total_bytes))
    }
}

fn generate(config: &RandomGraphConfig) -> Result<GraphStore, CliError> {
    Ok(RandomGraphGenerator::new(config.clone()).generate()?)
}

/// Build a random graph and describe it.
pub fn cmd_generate(config: &RandomGraphConfig) -> Result<GenerateReport, CliError> {
    let store = generate(config)?;
    let relationships = store.relationships(&config.relationship_type)?;
    let adjacency = relationships.topology().adjacency();

    let node_count = store.node_count();
    let degree = if node_count == 0 {
        DegreeStats::default()
    } else {
        let mut histogram = HugeLongLongMap::new();
        let (mut min, mut max, mut total) = (usize::MAX, 0, 0u64);
        for node in 0..node_count {
            let d = adjacency.degree(node);
            histogram.add_to(d as u64, 1)?;
            (min, max, total) = (min.min(d), max.max(d), total + d as u64);
        }
        let mode = histogram
            .iter()
            .max_by(|(d1, c1), (d2, c2)| c1.cmp(c2).then(d2.cmp(d1)))
            .map_or(0, |(d, _)| d as usize);
        DegreeStats {
            min,
            max,
            mean: total as f64 / node_count as f64,
            distinct: histogram.size(),
            mode,
        }
    };

    Ok(GenerateReport {
        config: config.clone(),
        node_count,
        relationship_count: store.relationship_count(),
        degree,
        topology_bytes: relationships.topology_size_of(),
        property_bytes: relationships.property_size_of(),
        total_bytes: store.size_of(),
    })
}

// =============================================================================
// TRAVERSE COMMAND
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TraverseReport {
    pub node_count: u64,
    pub relationship_count: u64,
    pub property_sum: f64,
    pub threads: usize,
}

impl fmt::Display for TraverseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parallel Traversal ({} threads)", self.threads)?;
        writeln!(f, "  Nodes:          {}", self.node_count)?;
        writeln!(f, "  Relationships:  {}", self.relationship_count)?;
        writeln!(f, "  Property sum:   {:.6}", self.property_sum)
    }
}

/// Visit every `step`-th node in `[start, end)`; relationships without a
/// property count as `1.0`.
fn walk(graph: &dyn Graph, start: u64, step: u64, end: u64) -> (u64, f64) {
    let mut count = 0u64;
    let mut sum = 0.0;
    for node in (start..end).step_by(step as usize) {
        graph.for_each_relationship_with_property(node, 1.0, &mut |_, _, value| {
            count += 1;
            sum += value;
            true
        });
    }
    (count, sum)
}

/// Walk a random graph on `threads` workers, one graph copy each, and check
/// the totals against a single-threaded walk.
pub fn cmd_traverse(config: &RandomGraphConfig, threads: Option<usize>) -> Result<TraverseReport, CliError> {
    let store = generate(config)?;
    let key = config.relationship_property.as_ref().map(|range| range.key.as_str());
    let graph = store.get_graph(&[], &[], key)?;
    let node_count = graph.node_count();
    let (sequential_count, sequential_sum) = walk(graph.as_ref(), 0, 1, node_count);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.unwrap_or(0))
        .build()?;
    let workers = pool.current_num_threads();
    let copies: Vec<Box<dyn Graph>> = (0..workers).map(|_| graph.concurrent_copy()).collect();
    let (parallel_count, parallel_sum) = pool.install(|| {
        copies
            .into_par_iter()
            .enumerate()
            .map(|(worker, copy)| walk(copy.as_ref(), worker as u64, workers as u64, node_count))
            .reduce(|| (0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1))
    });
    tracing::info!(workers, relationships = parallel_count, "parallel traversal finished");

    let tolerance = SUM_TOLERANCE * sequential_sum.abs().max(1.0);
    if parallel_count != sequential_count || (parallel_sum - sequential_sum).abs() > tolerance {
        return Err(CliError::TraversalMismatch {
            sequential_count,
            sequential_sum,
            parallel_count,
            parallel_sum,
        });
    }

    Ok(TraverseReport {
        node_count,
        relationship_count: parallel_count,
        property_sum: parallel_sum,
        threads: workers,
    })
}
