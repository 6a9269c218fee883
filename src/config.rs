//! Search configuration
//!
//! Describes the sources a federated search fans out to, the shared HTTP
//! client settings, and the session defaults. Loaded from YAML or JSON.

use crate::adapter::expand_source_ids;
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// Default number of items per merged page
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Default per-fetch timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 8000;

// ============================================================================
// Top-Level Search Config
// ============================================================================

/// Complete search configuration loaded from YAML or JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Items per merged page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Per-fetch timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Virtual source id that expands to every configured source
    #[serde(default)]
    pub all_sources_alias: Option<String>,

    /// Shared HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Source definitions, in merge order
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl SearchConfig {
    /// Load a config file, choosing the format from its extension
    ///
    /// `.json` files are parsed as JSON, everything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                ))
            }
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Parse and validate a YAML config
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the config for values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be greater than 0"));
        }

        if self.sources.is_empty() {
            return Err(Error::config("At least one source must be configured"));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !seen.insert(source.id.as_str()) {
                return Err(Error::config(format!(
                    "Duplicate source id: {}",
                    source.id
                )));
            }
        }

        if let Some(alias) = &self.all_sources_alias {
            if seen.contains(alias.as_str()) {
                return Err(Error::invalid_value(
                    "all_sources_alias",
                    format!("'{alias}' collides with a source id"),
                ));
            }
        }

        Ok(())
    }

    /// Configured source ids in declaration order
    pub fn source_ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.id.clone()).collect()
    }

    /// Look up a source by id
    pub fn get_source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// Resolve requested ids against this config
    ///
    /// An empty request selects every source. The virtual all-sources alias
    /// expands in place; unknown ids are rejected.
    pub fn resolve_sources(&self, requested: &[String]) -> Result<Vec<String>> {
        let known = self.source_ids();
        if requested.is_empty() {
            return Ok(known);
        }

        let resolved = expand_source_ids(requested, self.all_sources_alias.as_deref(), &known);
        if let Some(unknown) = resolved.iter().find(|id| !known.contains(id)) {
            return Err(Error::unknown_source(unknown.clone()));
        }
        Ok(resolved)
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// Shared HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in milliseconds
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff configuration
    #[serde(default)]
    pub retry_backoff: BackoffConfig,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_http_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff: BackoffConfig::default(),
            user_agent: None,
            headers: HashMap::new(),
        }
    }
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    2
}

impl HttpConfig {
    /// Build the client configuration. Rate limits are applied per source,
    /// so the shared client runs without one.
    pub fn to_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_millis(self.timeout_ms))
            .max_retries(self.max_retries)
            .backoff(
                self.retry_backoff.backoff_type,
                Duration::from_millis(self.retry_backoff.initial_ms),
                Duration::from_millis(self.retry_backoff.max_ms),
            )
            .no_rate_limit();

        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        builder.build()
    }
}

/// Backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    200
}

fn default_max_ms() -> u64 {
    5000
}

/// Rate limiting configuration for one source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests per second limit
    pub requests_per_second: u32,

    /// Burst size; defaults to the per-second limit
    #[serde(default)]
    pub burst_size: Option<u32>,
}

impl RateLimitConfig {
    /// Convert into the limiter configuration
    pub fn to_limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig::new(
            self.requests_per_second,
            self.burst_size.unwrap_or(self.requests_per_second),
        )
    }
}

// ============================================================================
// Source Config
// ============================================================================

/// A page-number paginated JSON search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique source id
    pub id: String,

    /// Human-readable name
    #[serde(default)]
    pub title: Option<String>,

    /// Base URL of the provider API
    pub base_url: String,

    /// Search endpoint path appended to the base URL
    #[serde(default)]
    pub path: String,

    /// Query parameter carrying the search text
    #[serde(default = "default_query_param")]
    pub query_param: String,

    /// Query parameter carrying the 1-indexed page number
    #[serde(default = "default_page_param")]
    pub page_param: String,

    /// Query parameter carrying the page size, if the provider accepts one
    #[serde(default)]
    pub page_size_param: Option<String>,

    /// Static query parameters
    #[serde(default)]
    pub params: HashMap<String, String>,

    /// Extra headers for this source
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Dot path to the array of records; empty means the body is the array
    #[serde(default = "default_items_path")]
    pub items_path: String,

    /// Dot path to the total item count
    #[serde(default)]
    pub total_path: Option<String>,

    /// Dot path to the total page count
    #[serde(default)]
    pub total_pages_path: Option<String>,

    /// Record field mapping
    #[serde(default)]
    pub fields: FieldMapping,

    /// Per-source rate limit
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
}

fn default_query_param() -> String {
    "q".to_string()
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_items_path() -> String {
    "items".to_string()
}

impl SourceConfig {
    /// Create a source with defaults for everything but id and URL
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            base_url: base_url.into(),
            path: String::new(),
            query_param: default_query_param(),
            page_param: default_page_param(),
            page_size_param: None,
            params: HashMap::new(),
            headers: HashMap::new(),
            items_path: default_items_path(),
            total_path: None,
            total_pages_path: None,
            fields: FieldMapping::default(),
            rate_limit: None,
        }
    }

    /// Display name, falling back to the id
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }

    /// Full endpoint URL
    pub fn endpoint(&self) -> String {
        if self.path.is_empty() {
            return self.base_url.clone();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }

    fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::missing_field("sources[].id"));
        }
        if self.base_url.is_empty() {
            return Err(Error::invalid_value(
                format!("sources.{}.base_url", self.id),
                "cannot be empty",
            ));
        }
        url::Url::parse(&self.base_url).map_err(|e| {
            Error::invalid_value(format!("sources.{}.base_url", self.id), e.to_string())
        })?;
        if let Some(limit) = &self.rate_limit {
            if limit.requests_per_second == 0 {
                return Err(Error::invalid_value(
                    format!("sources.{}.rate_limit.requests_per_second", self.id),
                    "must be greater than 0",
                ));
            }
        }
        Ok(())
    }
}

/// Where to find item fields inside a provider record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Dot path to the record id
    #[serde(default = "default_id_field")]
    pub id: Option<String>,

    /// Dot path to the title
    #[serde(default = "default_title_field")]
    pub title: String,

    /// Dot path to the resource link
    #[serde(default = "default_url_field")]
    pub url: Option<String>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            id: default_id_field(),
            title: default_title_field(),
            url: default_url_field(),
        }
    }
}

#[allow(clippy::unnecessary_wraps)]
fn default_id_field() -> Option<String> {
    Some("id".to_string())
}

fn default_title_field() -> String {
    "title".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_url_field() -> Option<String> {
    Some("url".to_string())
}
