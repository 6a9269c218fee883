//! Pagination session
//!
//! Caller-facing controller for "load first page" / "load more" over a set
//! of sources. The session owns the pagination state between calls and
//! hands it to the paginator for each round.
//!
//! # Example
//!
//! ```rust,ignore
//! use edu_federate::session::{PaginationSession, SessionOptions};
//!
//! let mut session = PaginationSession::new();
//! session.configure(SessionOptions::new(["khan", "oer"], adapter).with_page_size(10))?;
//!
//! let first = session.load_first().await?;
//! while session.has_more() {
//!     let more = session.load_next().await?;
//! }
//! ```

use crate::adapter::SourceAdapter;
use crate::config::{DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_MS};
use crate::error::{Error, Result};
use crate::paginator::{
    MultiSourceConfig, MultiSourcePaginationState, MultiSourcePaginator, PageBatch,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Options accepted by [`PaginationSession::configure`]
pub struct SessionOptions<T> {
    /// Sources in merge order
    pub source_ids: Vec<String>,
    /// Adapter serving every source
    pub adapter: Arc<dyn SourceAdapter<T>>,
    /// Items per page, 20 when unset
    pub page_size: Option<usize>,
    /// Per-fetch timeout in milliseconds, 8000 when unset
    pub timeout_ms: Option<u64>,
    /// Parent token for every fetch of the session
    pub cancel: Option<CancellationToken>,
}

impl<T> SessionOptions<T> {
    /// Options with default page size and timeout
    pub fn new<S: Into<String>>(
        source_ids: impl IntoIterator<Item = S>,
        adapter: Arc<dyn SourceAdapter<T>>,
    ) -> Self {
        Self {
            source_ids: source_ids.into_iter().map(Into::into).collect(),
            adapter,
            page_size: None,
            timeout_ms: None,
            cancel: None,
        }
    }

    /// Set page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Set per-fetch timeout
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Set the parent cancellation token
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn into_config(self) -> MultiSourceConfig<T> {
        let config = MultiSourceConfig::new(self.source_ids, self.adapter)
            .with_page_size(self.page_size.unwrap_or(DEFAULT_PAGE_SIZE))
            .with_timeout(Duration::from_millis(
                self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            ));
        match self.cancel {
            Some(cancel) => config.with_cancel_token(cancel),
            None => config,
        }
    }
}

impl<T> std::fmt::Debug for SessionOptions<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOptions")
            .field("source_ids", &self.source_ids)
            .field("page_size", &self.page_size)
            .field("timeout_ms", &self.timeout_ms)
            .finish_non_exhaustive()
    }
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// `configure` has not been called
    Unconfigured,
    /// Configured, nothing loaded since the last reset
    Configured,
    /// At least one page loaded
    Loaded,
}

struct Active<T> {
    paginator: MultiSourcePaginator<T>,
    state: MultiSourcePaginationState<T>,
    loaded: bool,
}

/// Merged, incrementally loadable result stream over several sources
///
/// Loads take `&mut self`, so a load cannot start while another is still
/// pending on the same session.
pub struct PaginationSession<T> {
    active: Option<Active<T>>,
}

impl<T> Default for PaginationSession<T> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<T> PaginationSession<T>
where
    T: Clone + Send + 'static,
{
    /// Create an unconfigured session
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)initialize the session with a fresh state
    ///
    /// Valid from any phase. Invalid options leave the previous
    /// configuration in place.
    pub fn configure(&mut self, options: SessionOptions<T>) -> Result<()> {
        let paginator = MultiSourcePaginator::new(options.into_config())?;
        let state = paginator.initial_state();

        let config = paginator.config();
        info!(
            sources = ?config.source_ids,
            page_size = config.page_size,
            timeout_ms = config.timeout.as_millis() as u64,
            "pagination session configured"
        );

        self.active = Some(Active {
            paginator,
            state,
            loaded: false,
        });
        Ok(())
    }

    /// Discard progress and load the first page
    pub async fn load_first(&mut self) -> Result<PageBatch<T>> {
        self.reset();
        self.load_next().await
    }

    /// Load the next page from the current state
    ///
    /// Before any [`load_first`](Self::load_first) this is an implicit
    /// first load.
    pub async fn load_next(&mut self) -> Result<PageBatch<T>> {
        let active = self.active.as_mut().ok_or(Error::NotConfigured)?;

        // The stored state only advances once the round completes, so a
        // dropped load leaves the session where it was.
        let (batch, next_state) = active
            .paginator
            .load_next_page(active.state.clone())
            .await?
            .into_parts();

        active.state = next_state;
        active.loaded = true;
        Ok(batch)
    }

    /// Restore every source to its initial state, keeping the configuration
    pub fn reset(&mut self) {
        if let Some(active) = self.active.as_mut() {
            debug!("pagination session reset");
            active.state = active.paginator.initial_state();
            active.loaded = false;
        }
    }

    /// Whether another load can produce items
    pub fn has_more(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.state.has_more())
    }
}

impl<T> PaginationSession<T> {
    /// Current lifecycle phase
    pub fn phase(&self) -> SessionPhase {
        match &self.active {
            None => SessionPhase::Unconfigured,
            Some(active) if active.loaded => SessionPhase::Loaded,
            Some(_) => SessionPhase::Configured,
        }
    }

    /// Whether `configure` has succeeded
    pub fn is_configured(&self) -> bool {
        self.active.is_some()
    }

    /// Current pagination state
    pub fn state(&self) -> Option<&MultiSourcePaginationState<T>> {
        self.active.as_ref().map(|a| &a.state)
    }

    /// Configured sources in merge order
    pub fn source_ids(&self) -> &[String] {
        self.active
            .as_ref()
            .map(|a| a.paginator.config().source_ids.as_slice())
            .unwrap_or_default()
    }
}

impl<T> std::fmt::Debug for PaginationSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationSession")
            .field("phase", &self.phase())
            .field("source_ids", &self.source_ids())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
