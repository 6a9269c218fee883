//! Tests for the pagination session

use super::*;
use crate::adapter::{FetchRequest, FnAdapter};
use crate::source::SourcePage;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Every source serves `count` items named `{source}-{n}`, `page_len` per page
fn numbered_adapter(count: usize, page_len: usize) -> Arc<dyn SourceAdapter<String>> {
    Arc::new(FnAdapter::new(move |req: FetchRequest| async move {
        let start = (req.page as usize - 1) * page_len;
        let end = (start + page_len).min(count);
        let items = (start..end)
            .map(|n| format!("{}-{}", req.source_id, n + 1))
            .collect();
        Ok(SourcePage::new(
            items,
            count as u64,
            count.div_ceil(page_len) as u32,
            req.page,
        ))
    }))
}

fn configured(count: usize, page_len: usize, page_size: usize) -> PaginationSession<String> {
    let mut session = PaginationSession::new();
    session
        .configure(
            SessionOptions::new(["a", "b"], numbered_adapter(count, page_len))
                .with_page_size(page_size),
        )
        .unwrap();
    session
}

#[test]
fn test_options_defaults() {
    let options = SessionOptions::new(["a"], numbered_adapter(1, 1));
    assert_eq!(options.page_size, None);
    assert_eq!(options.timeout_ms, None);

    let config = options.into_config();
    assert_eq!(config.page_size, 20);
    assert_eq!(config.timeout, Duration::from_millis(8000));
}

#[test]
fn test_unconfigured_session() {
    let session: PaginationSession<String> = PaginationSession::new();
    assert!(!session.is_configured());
    assert!(!session.has_more());
    assert!(session.state().is_none());
    assert!(session.source_ids().is_empty());
    assert_eq!(session.phase(), SessionPhase::Unconfigured);
}

#[tokio::test]
async fn test_loads_before_configure_are_rejected() {
    let mut session: PaginationSession<String> = PaginationSession::new();

    let err = session.load_first().await.unwrap_err();
    assert!(matches!(err, Error::NotConfigured));
    assert!(err.is_contract_violation());
    assert!(matches!(
        session.load_next().await,
        Err(Error::NotConfigured)
    ));

    // Misuse does not poison the session.
    session
        .configure(SessionOptions::new(["a"], numbered_adapter(2, 2)))
        .unwrap();
    assert_eq!(session.load_first().await.unwrap().items, vec!["a-1", "a-2"]);
}

#[test]
fn test_configure_rejects_invalid_options() {
    let mut session: PaginationSession<String> = PaginationSession::new();
    let err = session
        .configure(SessionOptions::new(["a"], numbered_adapter(1, 1)).with_page_size(0))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
    assert!(!session.is_configured());

    session
        .configure(SessionOptions::new(["a"], numbered_adapter(1, 1)))
        .unwrap();
    assert!(session
        .configure(SessionOptions::new(Vec::<String>::new(), numbered_adapter(1, 1)))
        .is_err());
    // The earlier configuration survives.
    assert_eq!(session.source_ids(), ["a".to_string()]);
}

#[tokio::test]
async fn test_load_first_then_next_until_exhausted() {
    let mut session = configured(5, 5, 4);
    assert_eq!(session.phase(), SessionPhase::Configured);
    assert!(session.has_more());

    let first = session.load_first().await.unwrap();
    assert_eq!(first.items, vec!["a-1", "b-1", "a-2", "b-2"]);
    assert_eq!(first.meta.total, 10);
    assert_eq!(session.phase(), SessionPhase::Loaded);

    let mut all = first.items;
    while session.has_more() {
        all.extend(session.load_next().await.unwrap().items);
    }

    assert_eq!(all.len(), 10);
    assert_eq!(session.state().unwrap().total_shown(), 10);

    let after = session.load_next().await.unwrap();
    assert!(after.is_empty());
    assert!(!after.meta.has_more);
}

#[tokio::test]
async fn test_load_next_without_load_first_is_implicit_first_load() {
    let mut implicit = configured(5, 5, 4);
    let mut explicit = configured(5, 5, 4);

    assert_eq!(
        implicit.load_next().await.unwrap(),
        explicit.load_first().await.unwrap()
    );
}

#[tokio::test]
async fn test_load_first_discards_progress() {
    let mut session = configured(6, 3, 2);

    let first = session.load_first().await.unwrap();
    session.load_next().await.unwrap();
    assert_eq!(session.state().unwrap().total_shown(), 4);

    let again = session.load_first().await.unwrap();
    assert_eq!(again, first);
    assert_eq!(session.state().unwrap().total_shown(), 2);
}

#[tokio::test]
async fn test_reset_keeps_configuration() {
    let mut session = configured(6, 3, 2);
    session.load_first().await.unwrap();

    session.reset();
    assert_eq!(session.phase(), SessionPhase::Configured);
    assert!(session.state().unwrap().is_pristine());
    assert_eq!(session.source_ids(), ["a".to_string(), "b".to_string()]);
    assert!(session.has_more());
}

#[tokio::test]
async fn test_reconfigure_replaces_sources() {
    let mut session = configured(6, 3, 2);
    session.load_first().await.unwrap();

    session
        .configure(SessionOptions::new(["c"], numbered_adapter(1, 1)))
        .unwrap();
    assert_eq!(session.phase(), SessionPhase::Configured);

    let batch = session.load_next().await.unwrap();
    assert_eq!(batch.items, vec!["c-1"]);
    assert!(!session.has_more());
}

#[tokio::test]
async fn test_buffered_sources_skip_fetch_across_loads() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fetches);
    let adapter: Arc<dyn SourceAdapter<String>> =
        Arc::new(FnAdapter::new(move |req: FetchRequest| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let items = (1..=10).map(|n| format!("{}{n}", req.page)).collect();
                Ok(SourcePage::new(items, 30, 3, req.page))
            }
        }));

    let mut session = PaginationSession::new();
    session
        .configure(SessionOptions::new(["only"], adapter).with_page_size(3))
        .unwrap();

    session.load_first().await.unwrap();
    session.load_next().await.unwrap();
    session.load_next().await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    // One item left in the buffer, below page size.
    session.load_next().await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_option_is_applied() {
    let adapter: Arc<dyn SourceAdapter<String>> =
        Arc::new(FnAdapter::new(|req: FetchRequest| async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(SourcePage::new(vec!["late".to_string()], 1, 1, req.page))
        }));

    let mut session = PaginationSession::new();
    session
        .configure(SessionOptions::new(["slow"], adapter).with_timeout_ms(100))
        .unwrap();

    let batch = session.load_first().await.unwrap();
    assert!(batch.is_empty());
    assert!(batch.meta.all_sources_failed);
    assert!(!session.has_more());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_load_keeps_progress() {
    let adapter: Arc<dyn SourceAdapter<String>> =
        Arc::new(FnAdapter::new(|req: FetchRequest| async move {
            if req.page >= 2 {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            let start = (req.page as usize - 1) * 2;
            let items = (start..start + 2).map(|n| format!("a-{}", n + 1)).collect();
            Ok(SourcePage::new(items, 6, 3, req.page))
        }));

    let mut session = PaginationSession::new();
    session
        .configure(SessionOptions::new(["a"], adapter).with_page_size(2))
        .unwrap();

    let first = session.load_first().await.unwrap();
    assert_eq!(first.items, vec!["a-1", "a-2"]);

    let abandoned = tokio::time::timeout(Duration::from_secs(1), session.load_next()).await;
    assert!(abandoned.is_err());

    let state = session.state().unwrap();
    assert_eq!(state.total_shown(), 2);
    assert_eq!(state.get("a").unwrap().next_page(), 2);

    let next = session.load_next().await.unwrap();
    assert_eq!(next.items, vec!["a-3", "a-4"]);
    assert_eq!(next.meta.shown, 4);
}
