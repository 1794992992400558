//! End-to-end paging engine tests: trigger on the render path, fetch on a
//! background thread, merge on the pumping (UI) thread.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use pagelist_core::{FetchError, LoadGate, UiDispatcher};
use pagelist_foundation::{
    AdmissionPolicy, LoadState, PagingConfig, PagingEngine, RowKind, StaleResultPolicy,
};
use pagelist_testing::{pump_for, pump_until, CountingGate, ScriptedFetcher};

const TIMEOUT: Duration = Duration::from_secs(5);

fn page(range: std::ops::Range<u64>) -> Result<Vec<u64>, FetchError> {
    Ok(range.collect())
}

struct ById;
impl AdmissionPolicy<u64> for ById {
    fn is_duplicate(&self, incoming: &u64, existing: &u64) -> bool {
        incoming == existing
    }
}

#[test]
fn full_page_round_trip_keeps_more() {
    let dispatcher = UiDispatcher::new();
    let fetcher = Arc::new(ScriptedFetcher::new(vec![page(0..20)]));
    let engine = PagingEngine::new(dispatcher.clone(), fetcher.clone());

    let changes = Rc::new(Cell::new(0));
    let shared = Rc::clone(&changes);
    engine.add_change_listener(Rc::new(move || shared.set(shared.get() + 1)));

    assert!(engine.prefetch_if_needed(0));
    assert_eq!(engine.load_state(), LoadState::Loading);

    assert!(pump_until(&dispatcher, TIMEOUT, || {
        engine.load_state() == LoadState::Idle
    }));
    assert_eq!(engine.content_count(), 20);
    assert_eq!(engine.loaded_count(), 20);
    assert!(engine.has_more());
    assert_eq!(fetcher.calls(), vec![(0, 20)]);
    assert_eq!(changes.get(), 1);
}

#[test]
fn short_page_ends_paging() {
    let dispatcher = UiDispatcher::new();
    let fetcher = Arc::new(ScriptedFetcher::new(vec![page(0..5)]));
    let engine = PagingEngine::new(dispatcher.clone(), fetcher);

    assert!(engine.prefetch_if_needed(0));
    assert!(pump_until(&dispatcher, TIMEOUT, || {
        engine.load_state() == LoadState::Idle
    }));

    assert!(!engine.has_more());
    assert_eq!(engine.content_count(), 5);
    // The More row has disappeared from the virtual count.
    assert_eq!(engine.row_count(), 5);
    assert_eq!(engine.row_kind(5), None);
}

#[test]
fn empty_page_is_end_of_data_not_an_error() {
    let dispatcher = UiDispatcher::new();
    let fetcher = Arc::new(ScriptedFetcher::<u64>::new(vec![Ok(Vec::new())]));
    let engine = PagingEngine::new(dispatcher.clone(), fetcher);

    assert!(engine.prefetch_if_needed(0));
    assert!(pump_until(&dispatcher, TIMEOUT, || {
        engine.load_state() == LoadState::Idle
    }));
    assert!(!engine.has_more());
    assert_eq!(engine.loaded_count(), 0);
}

#[test]
fn failure_blocks_until_unblock() {
    let dispatcher = UiDispatcher::new();
    let fetcher = Arc::new(ScriptedFetcher::new(vec![
        Err(FetchError::new("backend unreachable")),
        page(0..20),
    ]));
    let engine = PagingEngine::new(dispatcher.clone(), fetcher.clone());

    assert!(engine.prefetch_if_needed(0));
    assert!(pump_until(&dispatcher, TIMEOUT, || {
        engine.load_state() == LoadState::Blocked
    }));

    // Store untouched, More row retained as the retry affordance.
    assert_eq!(engine.content_count(), 0);
    assert!(engine.has_more());
    assert_eq!(engine.row_kind(0), Some(RowKind::More));

    // Automatic prefetch is suspended while blocked.
    assert!(!engine.prefetch_if_needed(0));
    pump_for(&dispatcher, Duration::from_millis(20));
    assert_eq!(fetcher.call_count(), 1);

    // The explicit retry path: unblock, then trigger again.
    engine.unblock();
    assert!(engine.prefetch_if_needed(0));
    assert!(pump_until(&dispatcher, TIMEOUT, || {
        engine.content_count() == 20
    }));
    assert_eq!(fetcher.call_count(), 2);
}

#[test]
fn repeated_triggers_dispatch_exactly_one_fetch() {
    let dispatcher = UiDispatcher::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new(vec![page(0..20)]).with_latency(Duration::from_millis(30)),
    );
    let engine = PagingEngine::new(dispatcher.clone(), fetcher.clone());

    assert!(engine.prefetch_if_needed(0));
    for _ in 0..50 {
        assert!(!engine.prefetch_if_needed(0));
    }

    assert!(pump_until(&dispatcher, TIMEOUT, || {
        engine.content_count() == 20
    }));
    assert_eq!(fetcher.call_count(), 1);
}

#[test]
fn prefetch_fires_at_the_preload_threshold() {
    let dispatcher = UiDispatcher::new();
    let fetcher = Arc::new(ScriptedFetcher::new(vec![page(20..40)]));
    let engine = PagingEngine::new(dispatcher.clone(), fetcher.clone());
    engine.set_data((0..20).collect());

    // Default preload count is 5: position 13 is still too early.
    assert!(!engine.prefetch_if_needed(13));
    assert_eq!(fetcher.call_count(), 0);

    // Position 14 == content - 1 - preload: exactly one dispatch.
    assert!(engine.prefetch_if_needed(14));
    assert!(pump_until(&dispatcher, TIMEOUT, || {
        engine.content_count() == 40
    }));
    // Cursor paging: the second page starts at the loaded count.
    assert_eq!(fetcher.calls(), vec![(20, 20)]);
}

#[test]
fn duplicates_shrink_the_store_but_not_the_cursor() {
    let dispatcher = UiDispatcher::new();
    // Second page overlaps the first by five items.
    let fetcher = Arc::new(ScriptedFetcher::new(vec![page(0..20), page(15..35)]));
    let engine = PagingEngine::new(dispatcher.clone(), fetcher.clone());
    engine.set_admission_policy(Rc::new(ById));

    assert!(engine.prefetch_if_needed(0));
    assert!(pump_until(&dispatcher, TIMEOUT, || {
        engine.content_count() == 20
    }));

    assert!(engine.prefetch_if_needed(19));
    assert!(pump_until(&dispatcher, TIMEOUT, || {
        engine.load_state() == LoadState::Idle && engine.loaded_count() == 40
    }));

    // 0..35 unique values stored, 40 loaded.
    assert_eq!(engine.content_count(), 35);
    assert!(engine.content_count() <= engine.loaded_count());
    // The next fetch would resume from the cursor, not the store size.
    assert_eq!(fetcher.calls(), vec![(0, 20), (20, 20)]);
}

#[test]
fn item_limit_caps_request_size_and_removes_more_row() {
    let dispatcher = UiDispatcher::new();
    let fetcher = Arc::new(ScriptedFetcher::new(vec![page(0..20), page(20..30)]));
    let engine = PagingEngine::with_config(
        dispatcher.clone(),
        fetcher.clone(),
        PagingConfig::new().with_item_limit(30),
    );

    assert!(engine.prefetch_if_needed(0));
    assert!(pump_until(&dispatcher, TIMEOUT, || {
        engine.content_count() == 20
    }));

    assert!(engine.prefetch_if_needed(19));
    assert!(pump_until(&dispatcher, TIMEOUT, || {
        engine.content_count() == 30
    }));
    // Second request was clamped to the remaining headroom.
    assert_eq!(fetcher.calls(), vec![(0, 20), (20, 10)]);

    // At the ceiling: no More row, no further triggers.
    assert_eq!(engine.row_count(), 30);
    assert!(!engine.prefetch_if_needed(29));
}

#[test]
fn stale_result_discarded_after_set_data() {
    let dispatcher = UiDispatcher::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new(vec![page(0..20)]).with_latency(Duration::from_millis(30)),
    );
    let engine = PagingEngine::with_config(
        dispatcher.clone(),
        fetcher,
        PagingConfig::new().with_stale_results(StaleResultPolicy::Discard),
    );

    assert!(engine.prefetch_if_needed(0));
    // Replace the store while the fetch is still in flight.
    engine.set_data(vec![100, 101, 102]);

    assert!(pump_until(&dispatcher, TIMEOUT, || {
        engine.load_state() == LoadState::Idle
    }));
    pump_for(&dispatcher, Duration::from_millis(50));

    // The late page never reached the replacement store.
    assert_eq!(engine.content_count(), 3);
    assert_eq!(engine.loaded_count(), 3);
}

#[test]
fn stale_result_merged_by_default() {
    let dispatcher = UiDispatcher::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new(vec![page(0..20)]).with_latency(Duration::from_millis(30)),
    );
    let engine = PagingEngine::new(dispatcher.clone(), fetcher);

    assert!(engine.prefetch_if_needed(0));
    engine.set_data(vec![100, 101, 102]);

    assert!(pump_until(&dispatcher, TIMEOUT, || {
        engine.content_count() == 23
    }));
    // Replacement data plus the late page, cursor advanced by both.
    assert_eq!(engine.loaded_count(), 23);
}

#[test]
fn closed_gate_delays_then_fetch_proceeds() {
    let dispatcher = UiDispatcher::new();
    let fetcher = Arc::new(ScriptedFetcher::new(vec![page(0..20)]));
    let mut config = PagingConfig::new();
    config.max_ready_polls = 2;
    config.ready_poll_interval = Duration::from_millis(1);
    let engine = PagingEngine::with_config(dispatcher.clone(), fetcher.clone(), config);

    let gate = Arc::new(CountingGate::never_ready());
    engine.set_load_gate(Arc::clone(&gate) as Arc<dyn LoadGate>);

    assert!(engine.prefetch_if_needed(0));
    assert!(pump_until(&dispatcher, TIMEOUT, || {
        engine.content_count() == 20
    }));

    // Initial query plus max_ready_polls retries, then proceed anyway.
    assert_eq!(gate.polls(), 3);
    assert_eq!(fetcher.call_count(), 1);
}

#[test]
fn gate_opening_releases_the_fetch_early() {
    let dispatcher = UiDispatcher::new();
    let fetcher = Arc::new(ScriptedFetcher::new(vec![page(0..20)]));
    let mut config = PagingConfig::new();
    config.ready_poll_interval = Duration::from_millis(1);
    let engine = PagingEngine::with_config(dispatcher.clone(), fetcher, config);

    let gate = Arc::new(CountingGate::closed_for(2));
    engine.set_load_gate(Arc::clone(&gate) as Arc<dyn LoadGate>);

    assert!(engine.prefetch_if_needed(0));
    assert!(pump_until(&dispatcher, TIMEOUT, || {
        engine.content_count() == 20
    }));
    // Two closed queries, then the open one released the fetch.
    assert_eq!(gate.polls(), 3);
}
