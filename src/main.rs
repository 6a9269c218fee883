//! edu-federate CLI
//!
//! Command-line interface for federated educational resource search

use clap::Parser;
use edu_federate::cli::{Cli, Runner};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        eprintln!("Error: {e}");
        // Invalid session options (e.g. `--page-size 0`) exit with 2
        std::process::exit(if e.is_contract_violation() { 2 } else { 1 });
    }
}
