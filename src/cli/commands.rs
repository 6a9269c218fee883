//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Federated educational resource search
#[derive(Parser, Debug)]
#[command(name = "edu-federate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Search configuration file (YAML or JSON)
    #[arg(short, long, global = true, default_value = "sources.yaml")]
    pub config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the configured sources and print merged pages
    Search {
        /// Search query
        #[arg(short, long)]
        query: String,

        /// Sources to search (comma-separated, empty = all)
        #[arg(short, long, value_delimiter = ',')]
        sources: Vec<String>,

        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: usize,

        /// Items per page (overrides the config file)
        #[arg(long)]
        page_size: Option<usize>,

        /// Per-source timeout in milliseconds (overrides the config file)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// List configured sources
    Sources,

    /// Validate the configuration file
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one page per line)
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_search_arguments() {
        let cli = Cli::try_parse_from([
            "edu-federate",
            "--config",
            "conf/search.yaml",
            "search",
            "--query",
            "fractions",
            "--sources",
            "khan,oer",
            "--pages",
            "3",
            "--page-size",
            "10",
            "--format",
            "pretty",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("conf/search.yaml"));
        assert!(!cli.verbose);
        match cli.command {
            Commands::Search {
                query,
                sources,
                pages,
                page_size,
                timeout_ms,
                format,
            } => {
                assert_eq!(query, "fractions");
                assert_eq!(sources, vec!["khan", "oer"]);
                assert_eq!(pages, 3);
                assert_eq!(page_size, Some(10));
                assert_eq!(timeout_ms, None);
                assert_eq!(format, OutputFormat::Pretty);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_search_defaults() {
        let cli = Cli::try_parse_from(["edu-federate", "search", "-q", "algebra"]).unwrap();

        assert_eq!(cli.config, PathBuf::from("sources.yaml"));
        match cli.command {
            Commands::Search {
                sources,
                pages,
                page_size,
                format,
                ..
            } => {
                assert!(sources.is_empty());
                assert_eq!(pages, 1);
                assert_eq!(page_size, None);
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["edu-federate", "sources", "-v", "-c", "x.json"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("x.json"));
        assert!(matches!(cli.command, Commands::Sources));
    }

    #[test_case(&["edu-federate", "search"] ; "missing query")]
    #[test_case(&["edu-federate", "search", "-q", "x", "--format", "parquet"] ; "unknown format")]
    #[test_case(&["edu-federate", "search", "-q", "x", "--pages", "many"] ; "non numeric pages")]
    #[test_case(&["edu-federate"] ; "missing subcommand")]
    fn test_rejected_arguments(args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }
}
