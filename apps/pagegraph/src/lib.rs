//! # pagegraph
//!
//! Command-line front end for the pagegraph storage core.
//!
//! - `cli`: clap commands and their reports
//! - `config`: TOML defaults for the commands
//! - `error`: [`CliError`]

pub mod cli;
pub mod config;
pub mod error;

pub use error::CliError;
