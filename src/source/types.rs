//! Source pagination types
//!
//! `SourcePaginationState` is a value type: transitions take `self` and
//! hand back the next state.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One page of results returned by a source adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePage<T> {
    /// Items on this page, in provider order
    pub items: Vec<T>,
    /// Total number of matching items reported by the source
    pub total: u64,
    /// Total number of pages reported by the source
    pub total_pages: u32,
    /// The 1-indexed page these items belong to
    pub page: u32,
}

impl<T> SourcePage<T> {
    /// Create a page
    pub fn new(items: Vec<T>, total: u64, total_pages: u32, page: u32) -> Self {
        Self {
            items,
            total,
            total_pages,
            page,
        }
    }

    /// An empty page reporting no results at all
    pub fn empty(page: u32) -> Self {
        Self::new(Vec::new(), 0, 0, page)
    }
}

/// Fetch progress and undelivered items for a single source
///
/// Invariant: an inactive source never has more pages.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePaginationState<T> {
    source_id: String,
    next_page: u32,
    buffer: VecDeque<T>,
    has_more_pages: bool,
    active: bool,
    server_total: u64,
    has_reported: bool,
}

impl<T> SourcePaginationState<T> {
    /// Initial state: page 1, empty buffer, live, assumed to have pages
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            next_page: 1,
            buffer: VecDeque::new(),
            has_more_pages: true,
            active: true,
            server_total: 0,
            has_reported: false,
        }
    }

    /// Source identifier
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Next 1-indexed page to request
    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    /// Fetched items not yet delivered
    pub fn buffer(&self) -> &VecDeque<T> {
        &self.buffer
    }

    /// Number of buffered items
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the source reported more pages than were requested
    pub fn has_more_pages(&self) -> bool {
        self.has_more_pages
    }

    /// Whether the source is still live in this session
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Last known total reported by the source
    pub fn server_total(&self) -> u64 {
        self.server_total
    }

    /// Whether the source ever answered with a page
    pub fn has_reported(&self) -> bool {
        self.has_reported
    }

    /// Whether this source can still contribute items
    pub fn is_available(&self) -> bool {
        self.active && (!self.buffer.is_empty() || self.has_more_pages)
    }

    /// Whether this source should be fetched before a round of `page_size`
    pub fn needs_fetch(&self, page_size: usize) -> bool {
        self.active && self.has_more_pages && self.buffer.len() < page_size
    }

    /// Whether this source's total should count toward the aggregate
    pub fn counts_toward_total(&self) -> bool {
        self.active || self.has_reported
    }

    /// Remove up to `count` items from the head of the buffer
    #[must_use]
    pub fn take_items(mut self, count: usize) -> (Vec<T>, Self) {
        let count = count.min(self.buffer.len());
        let items = self.buffer.drain(..count).collect();
        (items, self)
    }

    /// Fold a successful fetch into the state
    ///
    /// Items are appended behind anything still buffered. A source that
    /// has already been deactivated stays deactivated and ignores the page.
    #[must_use]
    pub fn apply_fetch_success(mut self, page: SourcePage<T>) -> Self {
        if !self.active {
            return self;
        }
        self.buffer.extend(page.items);
        self.next_page = page.page.saturating_add(1);
        self.has_more_pages = page.page < page.total_pages;
        self.server_total = page.total;
        self.has_reported = true;
        self
    }

    /// Permanently deactivate the source, keeping its buffer consumable
    #[must_use]
    pub fn apply_fetch_failure(mut self) -> Self {
        self.active = false;
        self.has_more_pages = false;
        self
    }

    /// Stop paging this source without deactivating it
    #[must_use]
    pub fn mark_exhausted(mut self) -> Self {
        self.has_more_pages = false;
        self
    }
}
