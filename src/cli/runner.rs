//! CLI runner - executes commands

use crate::adapter::{AdapterRegistry, HttpSourceAdapter, SourceAdapter};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::SearchConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClient;
use crate::paginator::PageBatch;
use crate::session::{PaginationSession, SessionOptions};
use crate::types::ResourceItem;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Options of a single `search` invocation
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Search query
    pub query: String,
    /// Requested source ids, empty = all
    pub sources: Vec<String>,
    /// Pages to load
    pub pages: usize,
    /// Page size override
    pub page_size: Option<usize>,
    /// Timeout override in milliseconds
    pub timeout_ms: Option<u64>,
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Search {
                query,
                sources,
                pages,
                page_size,
                timeout_ms,
                format,
            } => {
                let request = SearchRequest {
                    query: query.clone(),
                    sources: sources.clone(),
                    pages: *pages,
                    page_size: *page_size,
                    timeout_ms: *timeout_ms,
                };
                self.search(&request, *format).await
            }
            Commands::Sources => self.sources(),
            Commands::Validate => self.validate(),
        }
    }

    /// Load and validate the search configuration
    fn load_config(&self) -> Result<SearchConfig> {
        let path = &self.cli.config;
        SearchConfig::load(path).with_context(|| format!("Loading '{}'", path.display()))
    }

    /// Search command: load pages and print them as they arrive
    async fn search(&self, request: &SearchRequest, format: OutputFormat) -> Result<()> {
        let config = self.load_config()?;
        let start = Instant::now();

        let mut printed = 0;
        run_search(&config, request, |number, batch| {
            printed += batch.len();
            output_message(format, &page_message(number, batch));
        })
        .await?;

        output_message(
            format,
            &log_message(
                "INFO",
                &format!(
                    "Search complete: {printed} items in {}ms",
                    start.elapsed().as_millis()
                ),
            ),
        );
        Ok(())
    }

    /// Sources command: list configured sources
    fn sources(&self) -> Result<()> {
        let config = self.load_config()?;

        let sources: Vec<Value> = config
            .sources
            .iter()
            .map(|source| {
                json!({
                    "id": source.id,
                    "title": source.display_name(),
                    "endpoint": source.endpoint(),
                    "rate_limited": source.rate_limit.is_some(),
                })
            })
            .collect();

        output_message(
            OutputFormat::Json,
            &json!({
                "type": "SOURCES",
                "sources": sources,
                "all_sources_alias": config.all_sources_alias,
            }),
        );
        Ok(())
    }

    /// Validate command
    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;

        output_message(
            OutputFormat::Json,
            &log_message(
                "INFO",
                &format!(
                    "Configuration '{}' is valid with {} sources",
                    self.cli.config.display(),
                    config.sources.len()
                ),
            ),
        );
        Ok(())
    }
}

/// Build the adapter registry for the selected sources
pub fn build_registry(
    config: &SearchConfig,
    source_ids: &[String],
    query: &str,
) -> Result<AdapterRegistry<ResourceItem>> {
    let client = Arc::new(HttpClient::with_config(config.http.to_client_config())?);

    let mut registry = AdapterRegistry::new();
    for id in source_ids {
        let source = config
            .get_source(id)
            .cloned()
            .ok_or_else(|| Error::unknown_source(id.clone()))?;
        let adapter: Arc<dyn SourceAdapter<ResourceItem>> =
            Arc::new(HttpSourceAdapter::new(source, query, Arc::clone(&client)));
        registry.register(id.clone(), adapter);
    }
    Ok(registry)
}

/// Drive a session over the configured HTTP sources
///
/// Calls `on_page` with the 1-based page number for each loaded batch and
/// stops after `request.pages` pages or when no source has more results.
/// Fails when every source failed on the first page.
pub async fn run_search<F>(
    config: &SearchConfig,
    request: &SearchRequest,
    mut on_page: F,
) -> Result<usize>
where
    F: FnMut(usize, &PageBatch<ResourceItem>),
{
    let source_ids = config.resolve_sources(&request.sources)?;
    let registry = build_registry(config, &source_ids, &request.query)?;

    let adapter: Arc<dyn SourceAdapter<ResourceItem>> = Arc::new(registry);
    let options = SessionOptions::new(source_ids, adapter)
        .with_page_size(request.page_size.unwrap_or(config.page_size))
        .with_timeout_ms(request.timeout_ms.unwrap_or(config.timeout_ms));

    let mut session = PaginationSession::new();
    session.configure(options)?;

    let mut loaded = 0;
    while loaded < request.pages {
        let batch = if loaded == 0 {
            session.load_first().await?
        } else {
            session.load_next().await?
        };
        loaded += 1;

        if batch.meta.all_sources_failed {
            warn!(sources = ?batch.meta.failed_sources, "no source could be queried");
            return Err(Error::Other(format!(
                "no source could be queried: {}",
                batch.meta.failed_sources.join(", ")
            )));
        }

        on_page(loaded, &batch);

        if !batch.meta.has_more {
            debug!(pages = loaded, "results exhausted");
            break;
        }
    }

    Ok(loaded)
}

/// JSON message for one loaded page
pub fn page_message(number: usize, batch: &PageBatch<ResourceItem>) -> Value {
    json!({
        "type": "PAGE",
        "page": number,
        "items": batch.items,
        "meta": batch.meta,
    })
}

fn log_message(level: &str, message: &str) -> Value {
    json!({
        "type": "LOG",
        "log": {
            "level": level,
            "message": message
        }
    })
}

fn output_message(format: OutputFormat, msg: &Value) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(msg).unwrap_or_default());
        }
        OutputFormat::Pretty => {
            println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
        }
    }
}
