//! # Configuration
//!
//! Optional TOML file with defaults for the `generate`, `traverse` and
//! `estimate` commands. Command-line flags override file values.
//!
//! ```toml
//! [generate]
//! node_count = 100000
//! average_degree = 16
//! distribution = "POWER_LAW"
//! orientation = "UNDIRECTED"
//! property_key = "weight"
//!
//! [estimate]
//! block_size_unit = "MB"
//! ```

use crate::error::CliError;
use pagegraph_core::{Aggregation, Orientation, RelationshipDistribution};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// =============================================================================
// FILE LAYOUT
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub generate: GenerateDefaults,
    pub estimate: EstimateDefaults,
}

/// Defaults for synthetic graphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateDefaults {
    pub node_count: u64,
    pub average_degree: u64,
    pub seed: u64,
    pub distribution: RelationshipDistribution,
    pub orientation: Orientation,
    pub aggregation: Aggregation,
    pub relationship_type: String,
    /// Generate a relationship property with this key, drawn from `[0, 1)`.
    pub property_key: Option<String>,
}

impl Default for GenerateDefaults {
    fn default() -> Self {
        Self {
            node_count: 10_000,
            average_degree: 10,
            seed: 42,
            distribution: RelationshipDistribution::Uniform,
            orientation: Orientation::Natural,
            aggregation: Aggregation::Default,
            relationship_type: "REL".to_string(),
            property_key: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstimateDefaults {
    /// Unit for printed sizes; binary units picked per value when unset.
    pub block_size_unit: Option<SizeUnit>,
}

impl AppConfig {
    /// Read `path`, or use the built-in defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

// =============================================================================
// SIZE UNITS
// =============================================================================

/// Unit for rendering byte sizes.
///
/// `K`, `M`, `G` are binary (1024-based); `KB`, `MB`, `GB` are decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeUnit {
    K,
    M,
    G,
    KB,
    MB,
    GB,
}

impl SizeUnit {
    #[must_use]
    pub const fn bytes(self) -> u64 {
        match self {
            Self::K => 1 << 10,
            Self::M => 1 << 20,
            Self::G => 1 << 30,
            Self::KB => 1_000,
            Self::MB => 1_000_000,
            Self::GB => 1_000_000_000,
        }
    }

    #[must_use]
    pub fn format(self, bytes: u64) -> String {
        format!("{:.2} {}", bytes as f64 / self.bytes() as f64, self)
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::K => "KiB",
            Self::M => "MiB",
            Self::G => "GiB",
            Self::KB => "KB",
            Self::MB => "MB",
            Self::GB => "GB",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for SizeUnit {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "K" => Ok(Self::K),
            "M" => Ok(Self::M),
            "G" => Ok(Self::G),
            "KB" => Ok(Self::KB),
            "MB" => Ok(Self::MB),
            "GB" => Ok(Self::GB),
            _ => Err(CliError::InvalidArgument {
                option: "block size unit",
                value: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
