//! Source adapters
//!
//! An adapter wraps one external search provider and fetches a single page
//! at a time. The paginator only ever talks to adapters through
//! [`SourceAdapter`].
//!
//! # Overview
//!
//! - `SourceAdapter` - Async single-page fetch contract
//! - `FnAdapter` - Adapter backed by an async closure
//! - `AdapterRegistry` - Keyed map of adapters, dispatching on source id
//! - `HttpSourceAdapter` - Page-number JSON endpoint over the HTTP client
//! - `expand_source_ids` - Virtual "all sources" id expansion

mod http;
mod registry;

pub use http::{extract_path, HttpSourceAdapter};
pub use registry::AdapterRegistry;

use crate::error::Result;
use crate::source::SourcePage;
use async_trait::async_trait;
use std::collections::HashSet;
use std::future::Future;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

/// A single-page fetch request handed to an adapter
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Source to query
    pub source_id: String,
    /// 1-indexed page number
    pub page: u32,
    /// Requested items per page
    pub page_size: usize,
    /// Fires when the caller no longer needs the result
    pub cancel: CancellationToken,
}

/// Contract every source adapter satisfies
///
/// Implementations fetch exactly one page and report the provider's totals.
/// Any error is treated by the paginator as a failure of that source alone.
#[async_trait]
pub trait SourceAdapter<T>: Send + Sync {
    /// Fetch one page from a source
    async fn fetch_page(&self, request: FetchRequest) -> Result<SourcePage<T>>;
}

/// Adapter backed by an async function
///
/// ```rust
/// use edu_federate::adapter::{FetchRequest, FnAdapter};
/// use edu_federate::source::SourcePage;
///
/// let adapter = FnAdapter::new(|req: FetchRequest| async move {
///     Ok(SourcePage::new(vec![format!("{}-{}", req.source_id, req.page)], 1, 1, req.page))
/// });
/// ```
pub struct FnAdapter<T, F> {
    fetch: F,
    _item: PhantomData<fn() -> T>,
}

impl<T, F, Fut> FnAdapter<T, F>
where
    F: Fn(FetchRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<SourcePage<T>>> + Send,
{
    /// Wrap a fetch function
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<T, F, Fut> SourceAdapter<T> for FnAdapter<T, F>
where
    T: Send,
    F: Fn(FetchRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<SourcePage<T>>> + Send,
{
    async fn fetch_page(&self, request: FetchRequest) -> Result<SourcePage<T>> {
        (self.fetch)(request).await
    }
}

/// Expand the virtual all-sources id into the concrete ids
///
/// `all_alias` is replaced in place by every id in `known`. Duplicates are
/// dropped, keeping the first occurrence, so the result is a valid
/// `source_ids` list for a session.
pub fn expand_source_ids<S: AsRef<str>>(
    requested: &[S],
    all_alias: Option<&str>,
    known: &[String],
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut expanded = Vec::new();

    for id in requested {
        let id = id.as_ref();
        if Some(id) == all_alias {
            for known_id in known {
                if seen.insert(known_id.clone()) {
                    expanded.push(known_id.clone());
                }
            }
        } else if seen.insert(id.to_string()) {
            expanded.push(id.to_string());
        }
    }

    expanded
}
