//! Multi-source paginator
//!
//! Runs one round across all sources of a session.
//!
//! # Round
//!
//! 1. Fetch, concurrently, every live source whose buffer is below the page
//!    size and which still has pages. Each fetch gets its own timeout.
//! 2. Wait for every issued fetch. A failed or timed-out fetch deactivates
//!    that source only.
//! 3. Fold each outcome into the state of the source that issued it.
//! 4. Interleave the buffers in configured order, bounded by the page size.
//! 5. Drop what was delivered from each buffer and compute the summary.
//!
//! The paginator holds no state between rounds: each round is a function of
//! the config and the state passed in.

mod types;

pub use types::{MultiSourceConfig, MultiSourcePaginationState, PageBatch, PageMeta, RoundResult};

use crate::adapter::FetchRequest;
use crate::error::{Error, Result};
use crate::interleave::interleave;
use crate::source::{SourcePage, SourcePaginationState};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// Drives pagination rounds for one configuration
#[derive(Debug, Clone)]
pub struct MultiSourcePaginator<T> {
    config: MultiSourceConfig<T>,
}

impl<T> MultiSourcePaginator<T> {
    /// Create a paginator, validating the config
    pub fn new(config: MultiSourceConfig<T>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The paginator configuration
    pub fn config(&self) -> &MultiSourceConfig<T> {
        &self.config
    }

    /// A fresh state for the configured sources
    pub fn initial_state(&self) -> MultiSourcePaginationState<T> {
        MultiSourcePaginationState::new(&self.config.source_ids)
    }
}

impl<T> MultiSourcePaginator<T>
where
    T: Clone + Send + 'static,
{

    /// Produce the next merged batch from `state`
    ///
    /// Source failures never surface as errors here; they deactivate the
    /// source and show up in [`PageMeta::failed_sources`]. The only error is
    /// a state that does not track the configured sources.
    pub async fn load_next_page(
        &self,
        state: MultiSourcePaginationState<T>,
    ) -> Result<RoundResult<T>> {
        let config = &self.config;
        if !state.tracks(&config.source_ids) {
            return Err(Error::config(
                "pagination state does not match the configured sources",
            ));
        }

        let first_round = state.is_pristine();
        let MultiSourcePaginationState {
            sources,
            total_shown,
            ..
        } = state;

        let outcomes = self.fetch_round(&sources).await;
        let issued = outcomes.iter().filter(|o| o.is_some()).count();

        let mut failed_sources = Vec::new();
        let mut updated = Vec::with_capacity(sources.len());
        for (source, outcome) in sources.into_iter().zip(outcomes) {
            let source = match outcome {
                None => source,
                Some(Ok(page)) => {
                    debug!(
                        source = source.source_id(),
                        page = page.page,
                        items = page.items.len(),
                        total = page.total,
                        total_pages = page.total_pages,
                        "source page fetched"
                    );
                    source.apply_fetch_success(page)
                }
                Some(Err(err)) => {
                    warn!(source = source.source_id(), error = %err, "source failed, deactivating");
                    failed_sources.push(source.source_id().to_string());
                    source.apply_fetch_failure()
                }
            };
            updated.push(source);
        }

        // Nothing beyond page_size can be drawn from any single buffer.
        let buffers: Vec<Vec<T>> = updated
            .iter()
            .map(|s| s.buffer().iter().take(config.page_size).cloned().collect())
            .collect();
        let merged = interleave(&buffers, config.page_size);

        let sources: Vec<SourcePaginationState<T>> = updated
            .into_iter()
            .zip(&merged.consumed)
            .map(|(source, &taken)| source.take_items(taken).1)
            .collect();

        let aggregate_total = MultiSourcePaginationState::compute_aggregate_total(&sources);
        let next_state = MultiSourcePaginationState {
            sources,
            total_shown: total_shown + merged.items.len(),
            aggregate_total,
        };

        let all_sources_failed = first_round && failed_sources.len() == next_state.sources.len();
        let meta = PageMeta {
            total: aggregate_total,
            shown: next_state.total_shown,
            has_more: next_state.has_more(),
            failed_sources,
            all_sources_failed,
        };

        debug!(
            fetched = issued,
            failed = meta.failed_sources.len(),
            emitted = merged.items.len(),
            shown = meta.shown,
            total = meta.total,
            has_more = meta.has_more,
            "pagination round complete"
        );

        Ok(RoundResult {
            batch: PageBatch {
                items: merged.items,
                meta,
            },
            next_state,
        })
    }

    /// Fetch every source that needs replenishing, concurrently
    ///
    /// The result is aligned with `sources`: `None` where no fetch was
    /// issued, otherwise the settled outcome of that source's fetch.
    async fn fetch_round(
        &self,
        sources: &[SourcePaginationState<T>],
    ) -> Vec<Option<Result<SourcePage<T>>>> {
        let config = &self.config;
        let fetches = sources.iter().map(|source| {
            let request = source.needs_fetch(config.page_size).then(|| FetchRequest {
                source_id: source.source_id().to_string(),
                page: source.next_page(),
                page_size: config.page_size,
                cancel: config.cancel.child_token(),
            });
            let adapter = Arc::clone(&config.adapter);
            let timeout = config.timeout;

            async move {
                let request = request?;
                let source_id = request.source_id.clone();
                let cancel = request.cancel.clone();

                let outcome = match tokio::time::timeout(timeout, adapter.fetch_page(request)).await
                {
                    Ok(result) => result,
                    Err(_) => {
                        cancel.cancel();
                        Err(Error::SourceTimeout {
                            source_id,
                            timeout_ms: timeout.as_millis() as u64,
                        })
                    }
                };
                Some(outcome)
            }
        });

        join_all(fetches).await
    }
}

#[cfg(test)]
mod tests;
