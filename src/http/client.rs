//! Shared GET client for provider search endpoints
//!
//! One client is shared by every HTTP source of a search. A request is
//! retried on connect errors, timeouts, 5xx gateway statuses and 429; any
//! other 4xx fails at once. `Retry-After` on a 429 is honoured up to the
//! configured maximum backoff. The per-fetch timeout of the paginator sits
//! above all of this, so a source that keeps retrying is still cut off.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use crate::types::BackoffType;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Settings for the shared provider client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Prefix for request paths that are not absolute URLs
    pub base_url: Option<String>,
    /// Timeout of a single attempt
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Maximum delay for backoff, also caps honoured `Retry-After` values
    pub max_backoff: Duration,
    /// How the delay grows between retries
    pub backoff_type: BackoffType,
    /// Limiter shared by every request of this client; sources normally carry their own
    pub rate_limit: Option<RateLimiterConfig>,
    /// Headers added to every provider request
    pub default_headers: HashMap<String, String>,
    /// User agent sent to providers
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(10),
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            backoff_type: BackoffType::Exponential,
            rate_limit: None,
            default_headers: HashMap::new(),
            user_agent: format!("edu-federate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Start from the defaults used for provider searches
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for [`HttpClientConfig`]
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Prefix for relative request paths
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Timeout of one attempt
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Retries after the first attempt; 0 disables retrying
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Delay growth between retries, starting at `initial` and never above `max`
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Throttle every request of the client
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Leave throttling to the per-source limiters
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Header sent with every provider request
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// User agent sent to providers
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Finish the builder
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Per-request query string, headers and overrides
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query string pairs, in insertion order
    pub query: Vec<(String, String)>,
    /// Headers on top of the client defaults
    pub headers: HashMap<String, String>,
    /// Attempt timeout overriding the client's
    pub timeout: Option<Duration>,
    /// Retry count overriding the client's
    pub max_retries: Option<u32>,
}

impl RequestConfig {
    /// Empty request options
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query string pair
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header for this request only
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Override the attempt timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the retry count
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }
}

/// Provider client with retry, backoff and optional rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Client with the given settings; fails if the TLS backend cannot start
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Settings this client was built with
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// GET `url` and decode the body as JSON
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, config: RequestConfig) -> Result<T> {
        let response = self.get(url, config).await?;
        let body = response
            .text()
            .await
            .map_err(|e| Error::decode(format!("Failed to read response body: {e}")))?;
        Ok(serde_json::from_str(&body)?)
    }

    /// GET `url`, retrying transient failures
    ///
    /// Returns the first successful response, or the error of the last attempt.
    pub async fn get(&self, url: &str, config: RequestConfig) -> Result<Response> {
        let full_url = self.build_url(url);
        let max_retries = config.max_retries.unwrap_or(self.config.max_retries);
        let timeout = config.timeout.unwrap_or(self.config.timeout);

        let mut last_error = None;
        let mut attempt = 0;

        while attempt <= max_retries {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let mut req = self.client.get(&full_url).timeout(timeout);
            for (key, value) in &self.config.default_headers {
                req = req.header(key.as_str(), value.as_str());
            }
            for (key, value) in &config.headers {
                req = req.header(key.as_str(), value.as_str());
            }
            if !config.query.is_empty() {
                req = req.query(&config.query);
            }

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = extract_retry_after(&response)
                            .map_or(self.calculate_backoff(attempt), |wait| {
                                wait.min(self.config.max_backoff)
                            });
                        if attempt < max_retries {
                            warn!(
                                url = %full_url,
                                attempt = attempt + 1,
                                wait_ms = retry_after.as_millis() as u64,
                                "provider rate limited the request"
                            );
                            tokio::time::sleep(retry_after).await;
                            attempt += 1;
                            last_error = Some(Error::RateLimited {
                                retry_after_seconds: retry_after.as_secs(),
                            });
                            continue;
                        }
                        return Err(Error::RateLimited {
                            retry_after_seconds: retry_after.as_secs(),
                        });
                    }

                    if is_retryable_status(status) && attempt < max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            url = %full_url,
                            status = status.as_u16(),
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            "provider returned a retryable status"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        last_error = Some(Error::http_status(status.as_u16(), ""));
                        continue;
                    }

                    if status.is_client_error() || status.is_server_error() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::http_status(status.as_u16(), body));
                    }

                    debug!(url = %full_url, attempt, "provider request succeeded");
                    return Ok(response);
                }
                Err(e) => {
                    let retryable = e.is_timeout() || e.is_connect();
                    if retryable && attempt < max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            url = %full_url,
                            error = %e,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            "provider request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        last_error = Some(Error::Http(e));
                        continue;
                    }

                    if e.is_timeout() {
                        return Err(Error::Timeout {
                            timeout_ms: timeout.as_millis() as u64,
                        });
                    }
                    return Err(Error::Http(e));
                }
            }
        }

        Err(last_error.unwrap_or(Error::MaxRetriesExceeded { max_retries }))
    }

    /// Resolve `path` against the base URL unless it is already absolute
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }

    /// Delay before retry number `attempt + 1`, capped at the maximum backoff
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.config.backoff_type {
            BackoffType::Constant => self.config.initial_backoff,
            BackoffType::Linear => self.config.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.config.initial_backoff.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Gateway and server statuses worth another attempt
fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 500 | 502 | 503 | 504 | 520..=524)
}

/// `Retry-After` in seconds; HTTP-date values are ignored
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .map(Duration::from_secs)
}
