//! CLI module
//!
//! Command-line interface for federated searches.
//!
//! # Commands
//!
//! - `search` - Query the configured sources and print merged pages
//! - `sources` - List configured sources
//! - `validate` - Check the configuration file

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{build_registry, page_message, run_search, Runner, SearchRequest};
