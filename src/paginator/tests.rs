//! Tests for the multi-source paginator

use super::*;
use crate::adapter::SourceAdapter;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Scripted Adapter
// ============================================================================

#[derive(Debug, Clone)]
enum Behavior {
    /// `count` items named `{PREFIX}{n}`, `page_len` per page
    Catalog {
        prefix: &'static str,
        count: usize,
        page_len: usize,
        delay: Duration,
    },
    /// Catalog that errors from `page` onwards
    FailFrom {
        prefix: &'static str,
        count: usize,
        page_len: usize,
        page: u32,
    },
    /// Never answers
    Hang,
    /// Reports no results at all
    Empty,
}

fn catalog(prefix: &'static str, count: usize, page_len: usize) -> Behavior {
    Behavior::Catalog {
        prefix,
        count,
        page_len,
        delay: Duration::ZERO,
    }
}

fn catalog_page(prefix: &str, count: usize, page_len: usize, page: u32) -> SourcePage<String> {
    let start = (page as usize - 1) * page_len;
    let end = (start + page_len).min(count);
    let items = (start..end).map(|n| format!("{prefix}{}", n + 1)).collect();
    let total_pages = count.div_ceil(page_len) as u32;
    SourcePage::new(items, count as u64, total_pages, page)
}

#[derive(Default)]
struct ScriptedAdapter {
    behaviors: HashMap<String, Behavior>,
    calls: Mutex<Vec<(String, u32)>>,
    tokens: Mutex<Vec<(String, CancellationToken)>>,
}

impl ScriptedAdapter {
    fn new(behaviors: &[(&str, Behavior)]) -> Arc<Self> {
        Arc::new(Self {
            behaviors: behaviors
                .iter()
                .map(|(id, b)| ((*id).to_string(), b.clone()))
                .collect(),
            ..Default::default()
        })
    }

    fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_for(&self, source_id: &str) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter(|(id, _)| id == source_id)
            .map(|(_, page)| page)
            .collect()
    }

    fn token_for(&self, source_id: &str) -> CancellationToken {
        self.tokens
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| id == source_id)
            .map(|(_, token)| token.clone())
            .unwrap()
    }
}

#[async_trait]
impl SourceAdapter<String> for ScriptedAdapter {
    async fn fetch_page(&self, request: FetchRequest) -> Result<SourcePage<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((request.source_id.clone(), request.page));
        self.tokens
            .lock()
            .unwrap()
            .push((request.source_id.clone(), request.cancel.clone()));

        match self.behaviors.get(&request.source_id).cloned() {
            Some(Behavior::Catalog {
                prefix,
                count,
                page_len,
                delay,
            }) => {
                tokio::time::sleep(delay).await;
                Ok(catalog_page(prefix, count, page_len, request.page))
            }
            Some(Behavior::FailFrom {
                prefix,
                count,
                page_len,
                page,
            }) => {
                if request.page >= page {
                    Err(Error::source(&request.source_id, "upstream 500"))
                } else {
                    Ok(catalog_page(prefix, count, page_len, request.page))
                }
            }
            Some(Behavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(Error::source(&request.source_id, "hung"))
            }
            Some(Behavior::Empty) => Ok(SourcePage::empty(request.page)),
            None => Err(Error::unknown_source(request.source_id)),
        }
    }
}

fn paginator(
    adapter: &Arc<ScriptedAdapter>,
    source_ids: &[&str],
    page_size: usize,
) -> MultiSourcePaginator<String> {
    let adapter: Arc<dyn SourceAdapter<String>> = adapter.clone();
    MultiSourcePaginator::new(
        MultiSourceConfig::new(source_ids.iter().copied(), adapter)
            .with_page_size(page_size)
            .with_timeout(Duration::from_millis(8000)),
    )
    .unwrap()
}

fn buffer_of(state: &MultiSourcePaginationState<String>, id: &str) -> Vec<String> {
    state.get(id).unwrap().buffer().iter().cloned().collect()
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_config_defaults() {
    let adapter: Arc<dyn SourceAdapter<String>> = ScriptedAdapter::new(&[]);
    let config = MultiSourceConfig::new(["a", "b"], adapter);
    assert_eq!(config.page_size, 20);
    assert_eq!(config.timeout, Duration::from_millis(8000));
    assert_eq!(config.source_ids, vec!["a", "b"]);
}

#[test]
fn test_config_validation() {
    let adapter: Arc<dyn SourceAdapter<String>> = ScriptedAdapter::new(&[]);

    let zero = MultiSourceConfig::new(["a"], adapter.clone()).with_page_size(0);
    assert!(matches!(
        MultiSourcePaginator::new(zero),
        Err(Error::InvalidConfigValue { .. })
    ));

    let empty = MultiSourceConfig::new(Vec::<String>::new(), adapter.clone());
    assert!(empty.validate().is_err());

    let duplicate = MultiSourceConfig::new(["a", "b", "a"], adapter);
    let err = duplicate.validate().unwrap_err();
    assert!(err.to_string().contains("duplicate source id 'a'"));
}

#[tokio::test]
async fn test_state_for_other_sources_is_rejected() {
    let adapter = ScriptedAdapter::new(&[("a", catalog("A", 3, 3))]);
    let paginator = paginator(&adapter, &["a"], 4);

    let foreign = MultiSourcePaginationState::new(&["b"]);
    assert!(paginator.load_next_page(foreign).await.is_err());
    assert!(adapter.calls().is_empty());
}

// ============================================================================
// Round Scenarios
// ============================================================================

#[tokio::test]
async fn test_first_round_interleaves_two_sources() {
    let adapter = ScriptedAdapter::new(&[("a", catalog("A", 3, 3)), ("b", catalog("B", 10, 5))]);
    let paginator = paginator(&adapter, &["a", "b"], 4);

    let (batch, state) = paginator
        .load_next_page(paginator.initial_state())
        .await
        .unwrap()
        .into_parts();

    assert_eq!(batch.items, vec!["A1", "B1", "A2", "B2"]);
    assert_eq!(batch.meta.total, 13);
    assert_eq!(batch.meta.shown, 4);
    assert!(batch.meta.has_more);
    assert!(batch.meta.failed_sources.is_empty());
    assert!(!batch.meta.all_sources_failed);

    let a = state.get("a").unwrap();
    assert!(!a.has_more_pages());
    assert_eq!(buffer_of(&state, "a"), vec!["A3"]);

    let b = state.get("b").unwrap();
    assert!(b.has_more_pages());
    assert_eq!(b.next_page(), 2);
    assert_eq!(buffer_of(&state, "b"), vec!["B3", "B4", "B5"]);
}

#[tokio::test]
async fn test_rounds_drain_until_exhausted() {
    let adapter = ScriptedAdapter::new(&[("a", catalog("A", 3, 3)), ("b", catalog("B", 10, 5))]);
    let paginator = paginator(&adapter, &["a", "b"], 4);

    let mut state = paginator.initial_state();
    let mut rounds = Vec::new();
    let mut delivered = 0;
    loop {
        let (batch, next) = paginator.load_next_page(state).await.unwrap().into_parts();
        delivered += batch.len();
        assert_eq!(next.total_shown(), delivered);
        assert!(next.total_shown() as u64 <= next.aggregate_total());
        state = next;
        let has_more = batch.meta.has_more;
        rounds.push(batch.items);
        if !has_more {
            break;
        }
    }

    assert_eq!(
        rounds,
        vec![
            vec!["A1", "B1", "A2", "B2"],
            vec!["A3", "B3", "B4", "B5"],
            vec!["B6", "B7", "B8", "B9"],
            vec!["B10"],
        ]
    );
    assert_eq!(state.total_shown(), 13);
    assert_eq!(state.aggregate_total(), 13);
    assert_eq!(adapter.calls_for("a"), vec![1]);
    assert_eq!(adapter.calls_for("b"), vec![1, 2]);

    // An exhausted session keeps answering with empty batches.
    let (batch, _) = paginator.load_next_page(state).await.unwrap().into_parts();
    assert!(batch.is_empty());
    assert!(!batch.meta.has_more);
    assert_eq!(batch.meta.shown, 13);
}

#[tokio::test]
async fn test_sources_with_enough_buffer_are_not_refetched() {
    let adapter = ScriptedAdapter::new(&[("a", catalog("A", 40, 10)), ("b", catalog("B", 40, 10))]);
    let paginator = paginator(&adapter, &["a", "b"], 4);

    let (_, state) = paginator
        .load_next_page(paginator.initial_state())
        .await
        .unwrap()
        .into_parts();
    assert_eq!(state.get("a").unwrap().buffered(), 8);

    let (batch, state) = paginator.load_next_page(state).await.unwrap().into_parts();
    assert_eq!(batch.items, vec!["A3", "B3", "A4", "B4"]);
    assert_eq!(adapter.calls().len(), 2);
    assert_eq!(state.get("a").unwrap().buffered(), 6);
}

#[tokio::test]
async fn test_zero_total_pages_source_is_exhausted_after_first_fetch() {
    let adapter = ScriptedAdapter::new(&[("empty", Behavior::Empty), ("b", catalog("B", 2, 2))]);
    let paginator = paginator(&adapter, &["empty", "b"], 4);

    let (batch, state) = paginator
        .load_next_page(paginator.initial_state())
        .await
        .unwrap()
        .into_parts();

    assert_eq!(batch.items, vec!["B1", "B2"]);
    assert_eq!(batch.meta.total, 2);
    assert!(!batch.meta.has_more);

    let empty = state.get("empty").unwrap();
    assert!(empty.is_active());
    assert!(!empty.has_more_pages());
    assert_eq!(adapter.calls_for("empty"), vec![1]);
}

// ============================================================================
// Failure Handling
// ============================================================================

#[tokio::test]
async fn test_partial_failure_degrades_gracefully() {
    let failing = Behavior::FailFrom {
        prefix: "A",
        count: 5,
        page_len: 5,
        page: 1,
    };
    let adapter = ScriptedAdapter::new(&[("a", failing), ("b", catalog("B", 6, 3))]);
    let paginator = paginator(&adapter, &["a", "b"], 4);

    let (batch, state) = paginator
        .load_next_page(paginator.initial_state())
        .await
        .unwrap()
        .into_parts();

    assert_eq!(batch.items, vec!["B1", "B2", "B3"]);
    assert_eq!(batch.meta.failed_sources, vec!["a"]);
    assert!(!batch.meta.all_sources_failed);
    assert_eq!(batch.meta.total, 6);
    assert!(batch.meta.has_more);

    let a = state.get("a").unwrap();
    assert!(!a.is_active());
    assert!(!a.has_more_pages());
}

#[tokio::test]
async fn test_failed_source_is_never_fetched_again() {
    let failing = Behavior::FailFrom {
        prefix: "A",
        count: 50,
        page_len: 5,
        page: 1,
    };
    let adapter = ScriptedAdapter::new(&[("a", failing), ("b", catalog("B", 50, 5))]);
    let paginator = paginator(&adapter, &["a", "b"], 4);

    let mut state = paginator.initial_state();
    for round in 0..6 {
        let (batch, next) = paginator.load_next_page(state).await.unwrap().into_parts();
        let a = next.get("a").unwrap();
        assert!(!a.is_active());
        assert!(!a.has_more_pages());
        if round > 0 {
            assert!(batch.meta.failed_sources.is_empty());
        }
        state = next;
    }

    assert_eq!(adapter.calls_for("a"), vec![1]);
}

#[tokio::test]
async fn test_buffer_of_failed_source_is_still_delivered() {
    let failing = Behavior::FailFrom {
        prefix: "A",
        count: 10,
        page_len: 5,
        page: 2,
    };
    let adapter = ScriptedAdapter::new(&[("a", failing)]);
    let paginator = paginator(&adapter, &["a"], 4);

    let (batch, state) = paginator
        .load_next_page(paginator.initial_state())
        .await
        .unwrap()
        .into_parts();
    assert_eq!(batch.items, vec!["A1", "A2", "A3", "A4"]);

    let (batch, state) = paginator.load_next_page(state).await.unwrap().into_parts();
    assert_eq!(batch.items, vec!["A5"]);
    assert_eq!(batch.meta.failed_sources, vec!["a"]);
    assert!(!batch.meta.all_sources_failed);
    assert_eq!(batch.meta.total, 10);
    assert!(!batch.meta.has_more);
    assert_eq!(state.total_shown(), 5);
}

#[tokio::test]
async fn test_all_sources_failing_on_first_round_is_flagged() {
    let fail = |prefix| Behavior::FailFrom {
        prefix,
        count: 5,
        page_len: 5,
        page: 1,
    };
    let adapter = ScriptedAdapter::new(&[("a", fail("A")), ("b", fail("B"))]);
    let paginator = paginator(&adapter, &["a", "b"], 4);

    let (batch, state) = paginator
        .load_next_page(paginator.initial_state())
        .await
        .unwrap()
        .into_parts();

    assert!(batch.is_empty());
    assert_eq!(batch.meta.total, 0);
    assert_eq!(batch.meta.shown, 0);
    assert!(!batch.meta.has_more);
    assert!(batch.meta.all_sources_failed);
    assert!(!state.has_more());
}

#[tokio::test]
async fn test_zero_matches_is_not_flagged_as_failure() {
    let adapter = ScriptedAdapter::new(&[("a", Behavior::Empty), ("b", Behavior::Empty)]);
    let paginator = paginator(&adapter, &["a", "b"], 4);

    let (batch, _) = paginator
        .load_next_page(paginator.initial_state())
        .await
        .unwrap()
        .into_parts();

    assert!(batch.is_empty());
    assert!(!batch.meta.has_more);
    assert!(!batch.meta.all_sources_failed);
}

#[tokio::test(start_paused = true)]
async fn test_single_source_timeout_resolves_empty() {
    let adapter = ScriptedAdapter::new(&[("slow", Behavior::Hang)]);
    let paginator = paginator(&adapter, &["slow"], 4);

    let (batch, state) = paginator
        .load_next_page(paginator.initial_state())
        .await
        .unwrap()
        .into_parts();

    assert!(batch.items.is_empty());
    assert_eq!(batch.meta.total, 0);
    assert_eq!(batch.meta.shown, 0);
    assert!(!batch.meta.has_more);
    assert_eq!(batch.meta.failed_sources, vec!["slow"]);
    assert!(!state.get("slow").unwrap().is_active());

    // The timed-out fetch is told to stop.
    assert!(adapter.token_for("slow").is_cancelled());
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_fetches_run_concurrently() {
    let slow = |prefix| Behavior::Catalog {
        prefix,
        count: 2,
        page_len: 2,
        delay: Duration::from_secs(5),
    };
    let adapter = ScriptedAdapter::new(&[("a", slow("A")), ("b", slow("B")), ("c", slow("C"))]);
    let paginator = paginator(&adapter, &["a", "b", "c"], 6);

    let started = tokio::time::Instant::now();
    let (batch, _) = paginator
        .load_next_page(paginator.initial_state())
        .await
        .unwrap()
        .into_parts();

    assert_eq!(batch.len(), 6);
    assert!(started.elapsed() < Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_does_not_abort_siblings() {
    let adapter = ScriptedAdapter::new(&[
        ("slow", Behavior::Hang),
        (
            "ok",
            Behavior::Catalog {
                prefix: "K",
                count: 2,
                page_len: 2,
                delay: Duration::from_secs(7),
            },
        ),
    ]);
    let paginator = paginator(&adapter, &["slow", "ok"], 4);

    let started = tokio::time::Instant::now();
    let (batch, _) = paginator
        .load_next_page(paginator.initial_state())
        .await
        .unwrap()
        .into_parts();

    assert_eq!(batch.items, vec!["K1", "K2"]);
    assert_eq!(batch.meta.failed_sources, vec!["slow"]);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(8));
    assert!(elapsed < Duration::from_secs(9));
}

#[tokio::test(start_paused = true)]
async fn test_merge_order_ignores_completion_order() {
    let delayed = |prefix, secs| Behavior::Catalog {
        prefix,
        count: 2,
        page_len: 2,
        delay: Duration::from_secs(secs),
    };
    let adapter = ScriptedAdapter::new(&[("a", delayed("A", 3)), ("b", delayed("B", 1))]);
    let paginator = paginator(&adapter, &["a", "b"], 4);

    let (batch, _) = paginator
        .load_next_page(paginator.initial_state())
        .await
        .unwrap()
        .into_parts();

    assert_eq!(batch.items, vec!["A1", "B1", "A2", "B2"]);
}

#[tokio::test]
async fn test_parent_cancellation_reaches_fetches() {
    let adapter = ScriptedAdapter::new(&[("a", catalog("A", 2, 2))]);
    let parent = CancellationToken::new();
    let dyn_adapter: Arc<dyn SourceAdapter<String>> = adapter.clone();
    let paginator = MultiSourcePaginator::new(
        MultiSourceConfig::new(["a"], dyn_adapter).with_cancel_token(parent.clone()),
    )
    .unwrap();

    paginator
        .load_next_page(paginator.initial_state())
        .await
        .unwrap();

    let token = adapter.token_for("a");
    assert!(!token.is_cancelled());
    parent.cancel();
    assert!(token.is_cancelled());
}
