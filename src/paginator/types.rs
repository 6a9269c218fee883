//! Paginator types
//!
//! Configuration, aggregate state, and per-round output of the
//! multi-source paginator.

use crate::adapter::SourceAdapter;
use crate::config::{DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_MS};
use crate::error::{Error, Result};
use crate::source::SourcePaginationState;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Configuration for a multi-source paginator
pub struct MultiSourceConfig<T> {
    /// Sources in merge order
    pub source_ids: Vec<String>,
    /// Adapter used for every fetch; dispatch by id happens inside it
    pub adapter: Arc<dyn SourceAdapter<T>>,
    /// Items per merged page
    pub page_size: usize,
    /// Per-fetch timeout
    pub timeout: Duration,
    /// Parent token; every fetch gets a child of it
    pub cancel: CancellationToken,
}

impl<T> MultiSourceConfig<T> {
    /// Create a config with the default page size and timeout
    pub fn new<S: Into<String>>(
        source_ids: impl IntoIterator<Item = S>,
        adapter: Arc<dyn SourceAdapter<T>>,
    ) -> Self {
        Self {
            source_ids: source_ids.into_iter().map(Into::into).collect(),
            adapter,
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            cancel: CancellationToken::new(),
        }
    }

    /// Set page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set per-fetch timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the parent cancellation token
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Reject configs the paginator cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be greater than 0"));
        }
        if self.source_ids.is_empty() {
            return Err(Error::invalid_value(
                "source_ids",
                "at least one source is required",
            ));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = self.source_ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(Error::invalid_value(
                "source_ids",
                format!("duplicate source id '{duplicate}'"),
            ));
        }
        Ok(())
    }
}

impl<T> Clone for MultiSourceConfig<T> {
    fn clone(&self) -> Self {
        Self {
            source_ids: self.source_ids.clone(),
            adapter: Arc::clone(&self.adapter),
            page_size: self.page_size,
            timeout: self.timeout,
            cancel: self.cancel.clone(),
        }
    }
}

impl<T> std::fmt::Debug for MultiSourceConfig<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiSourceConfig")
            .field("source_ids", &self.source_ids)
            .field("page_size", &self.page_size)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Pagination progress across every source of a session
///
/// Sources keep the order they were configured in; the set of ids never
/// changes after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiSourcePaginationState<T> {
    pub(crate) sources: Vec<SourcePaginationState<T>>,
    pub(crate) total_shown: usize,
    pub(crate) aggregate_total: u64,
}

impl<T> MultiSourcePaginationState<T> {
    /// Fresh state with every source at page 1
    pub fn new<S: AsRef<str>>(source_ids: &[S]) -> Self {
        Self {
            sources: source_ids
                .iter()
                .map(|id| SourcePaginationState::new(id.as_ref()))
                .collect(),
            total_shown: 0,
            aggregate_total: 0,
        }
    }

    /// Per-source states in configured order
    pub fn sources(&self) -> &[SourcePaginationState<T>] {
        &self.sources
    }

    /// State of one source
    pub fn get(&self, source_id: &str) -> Option<&SourcePaginationState<T>> {
        self.sources.iter().find(|s| s.source_id() == source_id)
    }

    /// Items delivered so far in this session
    pub fn total_shown(&self) -> usize {
        self.total_shown
    }

    /// Sum of last known totals of sources that are live or have reported
    pub fn aggregate_total(&self) -> u64 {
        self.aggregate_total
    }

    /// Whether any source can still contribute items
    pub fn has_more(&self) -> bool {
        self.sources.iter().any(SourcePaginationState::is_available)
    }

    /// Whether no round has touched this state yet
    pub fn is_pristine(&self) -> bool {
        self.total_shown == 0
            && self.sources.iter().all(|s| {
                s.is_active() && !s.has_reported() && s.buffer().is_empty() && s.next_page() == 1
            })
    }

    /// Whether the tracked ids are exactly `source_ids`, in order
    pub fn tracks<S: AsRef<str>>(&self, source_ids: &[S]) -> bool {
        self.sources.len() == source_ids.len()
            && self
                .sources
                .iter()
                .zip(source_ids)
                .all(|(state, id)| state.source_id() == id.as_ref())
    }

    pub(crate) fn compute_aggregate_total(sources: &[SourcePaginationState<T>]) -> u64 {
        sources
            .iter()
            .filter(|s| s.counts_toward_total())
            .map(SourcePaginationState::server_total)
            .sum()
    }
}

/// Summary of the session after a round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    /// Aggregate total reported by live or previously reporting sources
    pub total: u64,
    /// Items delivered so far, this round included
    pub shown: usize,
    /// Whether another round can produce items
    pub has_more: bool,
    /// Sources that failed or timed out during this round
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_sources: Vec<String>,
    /// Every source failed on the first round of the session
    ///
    /// Distinguishes "no source could be queried" from "no matches".
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub all_sources_failed: bool,
}

/// Items delivered by one load, with the session summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageBatch<T> {
    /// Interleaved items
    pub items: Vec<T>,
    /// Session summary after this load
    pub meta: PageMeta,
}

impl<T> PageBatch<T> {
    /// Number of items in the batch
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Output of one paginator round
#[derive(Debug, Clone)]
pub struct RoundResult<T> {
    /// Items and summary for the caller
    pub batch: PageBatch<T>,
    /// State to pass into the next round
    pub next_state: MultiSourcePaginationState<T>,
}

impl<T> RoundResult<T> {
    /// Split into batch and next state
    pub fn into_parts(self) -> (PageBatch<T>, MultiSourcePaginationState<T>) {
        (self.batch, self.next_state)
    }
}
