//! HTTP source adapter
//!
//! Queries a page-number paginated JSON search endpoint and maps each
//! record into a [`ResourceItem`].

use super::{FetchRequest, SourceAdapter};
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RateLimiter, RequestConfig};
use crate::source::SourcePage;
use crate::types::{JsonValue, OptionStringExt, ResourceItem};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Adapter for one configured HTTP source
#[derive(Debug, Clone)]
pub struct HttpSourceAdapter {
    source: SourceConfig,
    query: String,
    client: Arc<HttpClient>,
    rate_limiter: Option<RateLimiter>,
}

impl HttpSourceAdapter {
    /// Create an adapter searching `source` for `query`
    pub fn new(source: SourceConfig, query: impl Into<String>, client: Arc<HttpClient>) -> Self {
        let rate_limiter = source
            .rate_limit
            .as_ref()
            .map(|limit| RateLimiter::new(&limit.to_limiter_config()));

        Self {
            source,
            query: query.into(),
            client,
            rate_limiter,
        }
    }

    /// The source definition
    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    /// Query parameters for one page
    pub fn request_for(&self, page: u32, page_size: usize) -> RequestConfig {
        let mut request = RequestConfig::new();
        let mut params: Vec<_> = self.source.params.iter().collect();
        params.sort();
        for (key, value) in params {
            request = request.query(key, value);
        }
        if let Some(query) = self.query.clone().none_if_empty() {
            request = request.query(&self.source.query_param, query);
        }
        request = request.query(&self.source.page_param, page.to_string());
        if let Some(size_param) = &self.source.page_size_param {
            request = request.query(size_param, page_size.to_string());
        }
        for (key, value) in &self.source.headers {
            request = request.header(key, value);
        }
        request
    }

    /// Turn a response body into a page
    ///
    /// Without a total page count the page count is derived from the total,
    /// using the provider's own page length when no size parameter is sent;
    /// without either, a full page implies there is another one.
    pub fn parse_page(
        &self,
        body: &JsonValue,
        page: u32,
        page_size: usize,
    ) -> Result<SourcePage<ResourceItem>> {
        let records = if self.source.items_path.is_empty() {
            Some(body)
        } else {
            extract_path(body, &self.source.items_path)
        };
        let records = records.and_then(JsonValue::as_array).ok_or_else(|| {
            Error::json_path(format!(
                "'{}' is not an array in response from '{}'",
                self.source.items_path, self.source.id
            ))
        })?;

        let items: Vec<ResourceItem> = records
            .iter()
            .map(|record| self.map_record(record))
            .collect();

        let total = self
            .source
            .total_path
            .as_deref()
            .and_then(|path| extract_path(body, path))
            .and_then(as_u64);

        let total_pages = self
            .source
            .total_pages_path
            .as_deref()
            .and_then(|path| extract_path(body, path))
            .and_then(as_u64)
            .map(|pages| u32::try_from(pages).unwrap_or(u32::MAX));

        let page_size_u64 = page_size.max(1) as u64;
        let (total, total_pages) = match (total, total_pages) {
            (Some(total), Some(pages)) => (total, pages),
            (Some(total), None) => {
                // A provider that never saw the requested size pages by its own.
                let page_len = if self.source.page_size_param.is_some() {
                    page_size_u64
                } else {
                    items.len() as u64
                };
                let pages = if page_len == 0 {
                    u64::from(page)
                } else {
                    total.div_ceil(page_len)
                };
                (total, u32::try_from(pages).unwrap_or(u32::MAX))
            }
            (None, pages) => {
                let seen = u64::from(page.saturating_sub(1)) * page_size_u64 + items.len() as u64;
                let pages = pages.unwrap_or(if items.len() >= page_size {
                    page.saturating_add(1)
                } else {
                    page
                });
                (seen, pages)
            }
        };

        Ok(SourcePage::new(items, total, total_pages, page))
    }

    fn map_record(&self, record: &JsonValue) -> ResourceItem {
        let fields = &self.source.fields;
        ResourceItem {
            source: self.source.id.clone(),
            id: fields
                .id
                .as_deref()
                .and_then(|path| extract_path(record, path))
                .and_then(as_string),
            title: extract_path(record, &fields.title)
                .and_then(as_string)
                .unwrap_or_default(),
            url: fields
                .url
                .as_deref()
                .and_then(|path| extract_path(record, path))
                .and_then(as_string),
            raw: record.clone(),
        }
    }
}

#[async_trait]
impl SourceAdapter<ResourceItem> for HttpSourceAdapter {
    async fn fetch_page(&self, request: FetchRequest) -> Result<SourcePage<ResourceItem>> {
        let cancelled = || Error::Cancelled {
            source_id: request.source_id.clone(),
        };

        if let Some(limiter) = &self.rate_limiter {
            if !limiter.wait_or_cancel(&request.cancel).await {
                return Err(cancelled());
            }
        }

        let endpoint = self.source.endpoint();
        let config = self.request_for(request.page, request.page_size);
        debug!(source = %self.source.id, page = request.page, "fetching source page");

        let body: JsonValue = tokio::select! {
            biased;
            () = request.cancel.cancelled() => return Err(cancelled()),
            result = self.client.get_json::<JsonValue>(&endpoint, config) => result?,
        };

        self.parse_page(&body, request.page, request.page_size)
    }
}

/// Look up a dot-separated path in a JSON value
///
/// A leading `$.` is ignored and numeric segments index into arrays.
pub fn extract_path<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        current = match current {
            JsonValue::Object(map) => map.get(part)?,
            JsonValue::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn as_u64(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Array(items) => items.first().and_then(as_string),
        _ => None,
    }
}
