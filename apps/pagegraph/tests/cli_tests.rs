//! Tests for CLI parsing, config loading and command reports.

use clap::Parser;
use pagegraph::CliError;
use pagegraph::cli::{Cli, Commands, GenerateArgs, cmd_estimate, cmd_generate, cmd_traverse};
use pagegraph::config::{AppConfig, GenerateDefaults, SizeUnit};
use pagegraph_core::{GraphDimensions, Orientation, RelationshipDistribution};
use std::io::Write;

// =============================================================================
// PARSING TESTS
// =============================================================================

#[test]
fn test_parse_estimate() {
    let cli = Cli::try_parse_from([
        "pagegraph",
        "estimate",
        "--nodes",
        "1000",
        "--relationships",
        "5000",
        "--block-size-unit",
        "mb",
    ])
    .expect("parse");
    assert!(!cli.json);
    match cli.command {
        Commands::Estimate {
            nodes,
            relationships,
            node_properties,
            block_size_unit,
            ..
        } => {
            assert_eq!(nodes, 1000);
            assert_eq!(relationships, 5000);
            assert_eq!(node_properties, 0);
            assert_eq!(block_size_unit, Some(SizeUnit::MB));
        }
        other => unreachable!("parsed {other:?}"),
    }
}

#[test]
fn test_parse_traverse_with_global_flags() {
    let cli = Cli::try_parse_from([
        "pagegraph",
        "traverse",
        "--nodes",
        "50",
        "--distribution",
        "power_law",
        "--orientation",
        "undirected",
        "--threads",
        "3",
        "--json",
        "-v",
    ])
    .expect("parse");
    assert!(cli.json);
    assert!(cli.verbose);
    let Commands::Traverse { graph, threads } = cli.command else {
        unreachable!("expected traverse");
    };
    assert_eq!(threads, Some(3));
    assert_eq!(graph.nodes, Some(50));
    assert_eq!(graph.distribution, Some(RelationshipDistribution::PowerLaw));
    assert_eq!(graph.orientation, Some(Orientation::Undirected));
}

#[test]
fn test_parse_rejects_bad_values() {
    assert!(Cli::try_parse_from(["pagegraph", "generate", "--distribution", "zipf"]).is_err());
    assert!(
        Cli::try_parse_from([
            "pagegraph",
            "estimate",
            "--nodes",
            "1",
            "--relationships",
            "1",
            "--block-size-unit",
            "TB"
        ])
        .is_err()
    );
    assert!(Cli::try_parse_from(["pagegraph", "estimate", "--nodes", "1"]).is_err());
}

// =============================================================================
// CONFIG TESTS
// =============================================================================

#[test]
fn test_config_file_defaults_and_overrides() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(
        file,
        "[generate]\nnode_count = 64\naverage_degree = 2\nproperty_key = \"weight\"\n\n[estimate]\nblock_size_unit = \"K\""
    )
    .expect("write");

    let config = AppConfig::load(Some(file.path())).expect("load");
    assert_eq!(config.generate.node_count, 64);
    assert_eq!(config.estimate.block_size_unit, Some(SizeUnit::K));

    let args = GenerateArgs {
        average_degree: Some(5),
        ..GenerateArgs::default()
    };
    let resolved = args.resolve(&config.generate);
    assert_eq!(resolved.node_count, 64);
    assert_eq!(resolved.average_degree, 5);
    assert_eq!(
        resolved.relationship_property.as_ref().map(|p| p.key.as_str()),
        Some("weight")
    );
}

#[test]
fn test_config_errors() {
    let missing = AppConfig::load(Some(std::path::Path::new("/definitely/not/here.toml")));
    assert!(matches!(missing, Err(CliError::Io { .. })));

    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "[generate]\nnode_count = \"many\"").expect("write");
    let invalid = AppConfig::load(Some(file.path()));
    assert!(matches!(invalid, Err(CliError::Config { .. })));
}

#[test]
fn test_no_config_file_uses_defaults() {
    assert_eq!(AppConfig::load(None).expect("load"), AppConfig::default());
}

// =============================================================================
// COMMAND TESTS
// =============================================================================

#[test]
fn test_estimate_report() {
    let dimensions = GraphDimensions {
        node_count: 1_000_000,
        relationship_count: 10_000_000,
        node_property_count: 1,
        relationship_property_count: 1,
        label_count: 2,
    };
    let report = cmd_estimate(&dimensions, Some(SizeUnit::M));
    assert!(report.min_bytes <= report.max_bytes);
    assert!(report.min_bytes > 10_000_000);
    assert!(report.min.ends_with("MiB"));

    let json = serde_json::to_string(&report).expect("json");
    assert!(json.contains("\"node_count\":1000000"));
    assert!(report.to_string().contains("Range:"));
}

#[test]
fn test_generate_report() {
    let defaults = GenerateDefaults {
        node_count: 200,
        average_degree: 4,
        ..GenerateDefaults::default()
    };
    let report = cmd_generate(&GenerateArgs::default().resolve(&defaults)).expect("generate");
    assert_eq!(report.node_count, 200);
    assert_eq!(report.relationship_count, 800);
    assert_eq!(report.degree.min, 4);
    assert_eq!(report.degree.max, 4);
    assert_eq!(report.degree.mean, 4.0);
    assert_eq!(report.degree.distinct, 1);
    assert_eq!(report.degree.mode, 4);
    assert!(report.topology_bytes > 0);
    assert_eq!(report.property_bytes, 0);
    assert!(report.total_bytes >= report.topology_bytes);
}

#[test]
fn test_traverse_matches_sequential_walk() {
    let defaults = GenerateDefaults {
        node_count: 500,
        average_degree: 6,
        distribution: RelationshipDistribution::Random,
        property_key: Some("weight".to_string()),
        ..GenerateDefaults::default()
    };
    let config = GenerateArgs::default().resolve(&defaults);
    let report = cmd_traverse(&config, Some(3)).expect("traverse");
    assert_eq!(report.threads, 3);
    assert_eq!(report.node_count, 500);
    assert!(report.property_sum >= 0.0);
    assert!(report.property_sum < report.relationship_count as f64);

    let unweighted = GenerateArgs::default().resolve(&GenerateDefaults {
        node_count: 100,
        average_degree: 3,
        ..GenerateDefaults::default()
    });
    let report = cmd_traverse(&unweighted, Some(2)).expect("traverse");
    assert_eq!(report.relationship_count, 300);
    assert_eq!(report.property_sum, 300.0);
}
