//! # pagegraph - Paged Graph Storage
//!
//! The main binary for the pagegraph storage core.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            apps/pagegraph (THE BINARY)       │
//! │                                              │
//! │   ┌───────────┐          ┌───────────────┐   │
//! │   │    CLI    │          │  TOML config  │   │
//! │   │  (clap)   │          │    (toml)     │   │
//! │   └─────┬─────┘          └───────┬───────┘   │
//! │         └───────────┬────────────┘           │
//! │                     ▼                        │
//! │            ┌────────────────┐                │
//! │            │ pagegraph-core │                │
//! │            │  (THE LAYOUT)  │                │
//! │            └────────────────┘                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! pagegraph estimate --nodes 1000000000 --relationships 10000000000 --block-size-unit G
//! pagegraph generate --nodes 100000 --average-degree 16 --distribution POWER_LAW
//! pagegraph --json traverse --nodes 100000 --property-key weight --threads 8
//! ```

use clap::Parser;
use pagegraph::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // PAGEGRAPH_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("PAGEGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "pagegraph=debug,pagegraph_core=debug"
    } else {
        "pagegraph=info,pagegraph_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
