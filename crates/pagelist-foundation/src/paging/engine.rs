//! The paging engine.
//!
//! Owns the loaded-item store and the load state machine, triggers
//! background fetches from the render path, and merges results back on the
//! UI thread through the dispatcher. All mutation happens on the owning
//! thread; background fetch tasks only ever see the fetcher, the readiness
//! gate, and a `Send` dispatcher handle.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::thread;

use pagelist_core::{FetchError, LoadGate, PageFetcher, UiDispatcher};
use web_time::Instant;

use super::admission::{AdmissionPolicy, AdmitAll};
use super::config::{PagingConfig, StaleResultPolicy};
use super::row_kind::{resolve_row_kind, RowKind};

/// Load state of the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    /// No fetch in flight; automatic prefetching is allowed.
    #[default]
    Idle,
    /// Exactly one fetch is in flight; further triggers are no-ops.
    Loading,
    /// A fetch failed. Automatic prefetching stays suspended until
    /// [`PagingEngine::unblock`] is called.
    Blocked,
}

/// Result of one dispatched fetch, marshalled back to the UI thread.
struct FetchOutcome<T> {
    generation: u64,
    request_size: usize,
    result: Result<Vec<T>, FetchError>,
}

struct EngineInner<T> {
    items: Vec<T>,
    /// Every item ever returned by a successful fetch, including items the
    /// admission policy rejected. This is the backend paging cursor.
    loaded_count: usize,
    load_state: LoadState,
    has_more: bool,
    /// Bumped by `set_data`; lets the stale-result policy recognize fetches
    /// dispatched against a replaced store.
    generation: u64,
    config: PagingConfig,
    admission: Rc<dyn AdmissionPolicy<T>>,
    fetcher: Arc<dyn PageFetcher<T>>,
    gate: Option<Arc<dyn LoadGate>>,
    listeners: Vec<(u64, Rc<dyn Fn()>)>,
    next_listener_id: u64,
}

impl<T> EngineInner<T> {
    fn content_rows(&self) -> usize {
        self.items.len().min(self.config.item_limit())
    }

    fn shows_more_row(&self) -> bool {
        self.has_more && self.content_rows() < self.config.item_limit() && self.config.more_enabled
    }

    fn needs_bottom_padding(&self) -> bool {
        !self.items.is_empty()
            && self
                .config
                .bottom_overlay_height
                .is_some_and(|height| height > 0.0)
    }

    fn should_prefetch(&self, position: usize) -> bool {
        let content = self.items.len();
        position + 1 + self.config.preload_count >= content
            && content < self.config.item_limit()
            && self.has_more
            && self.config.more_enabled
            && self.load_state == LoadState::Idle
    }

    /// Runs `page` through the admission policy and appends survivors.
    /// Returns the number of items admitted.
    fn append_admitted(&mut self, page: Vec<T>) -> usize {
        let admission = Rc::clone(&self.admission);
        let mut added = 0;
        for item in page {
            if admission.filter(&item) {
                continue;
            }
            let duplicate = self
                .items
                .iter()
                .any(|existing| admission.is_duplicate(&item, existing));
            if !duplicate {
                self.items.push(item);
                added += 1;
            }
        }
        added
    }

    fn listener_snapshot(&self) -> Vec<Rc<dyn Fn()>> {
        self.listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect()
    }
}

/// Pagination-aware adapter core.
///
/// Cheap to clone; clones share the same store. The engine is bound to the
/// thread that owns its [`UiDispatcher`] and is deliberately not `Send`.
///
/// The render path reports each row it materializes via
/// [`prefetch_if_needed`](Self::prefetch_if_needed); the engine dispatches a
/// background fetch once the position creeps within `preload_count` rows of
/// the end, with at most one fetch in flight.
pub struct PagingEngine<T> {
    inner: Rc<RefCell<EngineInner<T>>>,
    dispatcher: UiDispatcher,
}

impl<T> Clone for PagingEngine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<T: Send + 'static> PagingEngine<T> {
    /// Creates an engine with the default configuration and an admit-all
    /// admission policy.
    pub fn new(dispatcher: UiDispatcher, fetcher: Arc<dyn PageFetcher<T>>) -> Self {
        Self::with_config(dispatcher, fetcher, PagingConfig::default())
    }

    pub fn with_config(
        dispatcher: UiDispatcher,
        fetcher: Arc<dyn PageFetcher<T>>,
        config: PagingConfig,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(EngineInner {
                items: Vec::new(),
                loaded_count: 0,
                load_state: LoadState::Idle,
                has_more: true,
                generation: 0,
                config,
                admission: Rc::new(AdmitAll),
                fetcher,
                gate: None,
                listeners: Vec::new(),
                next_listener_id: 0,
            })),
            dispatcher,
        }
    }

    /// Replaces the admission policy. Applies to future admissions only.
    pub fn set_admission_policy(&self, policy: Rc<dyn AdmissionPolicy<T>>) {
        self.inner.borrow_mut().admission = policy;
    }

    /// Installs a readiness gate polled before each fetch is issued.
    pub fn set_load_gate(&self, gate: Arc<dyn LoadGate>) {
        self.inner.borrow_mut().gate = Some(gate);
    }

    // ── Row virtualization ──────────────────────────────────────────────

    /// Virtual row count: content rows (capped at the item limit), plus the
    /// More row while more data is loadable, plus the bottom-padding row
    /// when configured and the store is non-empty.
    pub fn row_count(&self) -> usize {
        let inner = self.inner.borrow();
        inner.content_rows()
            + usize::from(inner.shows_more_row())
            + usize::from(inner.needs_bottom_padding())
    }

    /// Resolves the kind of row at `position`; `None` past the row count.
    pub fn row_kind(&self, position: usize) -> Option<RowKind> {
        let inner = self.inner.borrow();
        resolve_row_kind(
            position,
            inner.content_rows(),
            inner.shows_more_row(),
            inner.needs_bottom_padding(),
        )
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn content_count(&self) -> usize {
        self.inner.borrow().items.len()
    }

    /// Total items returned by successful fetches, rejected ones included.
    pub fn loaded_count(&self) -> usize {
        self.inner.borrow().loaded_count
    }

    pub fn has_more(&self) -> bool {
        self.inner.borrow().has_more
    }

    pub fn load_state(&self) -> LoadState {
        self.inner.borrow().load_state
    }

    pub fn config(&self) -> PagingConfig {
        self.inner.borrow().config.clone()
    }

    /// Runs `f` against the item at `index`, if stored.
    pub fn with_item<R>(&self, index: usize, f: impl FnOnce(&T) -> R) -> Option<R> {
        let inner = self.inner.borrow();
        inner.items.get(index).map(f)
    }

    // ── Configuration ───────────────────────────────────────────────────

    /// Sets the item ceiling; rejects the reserved unlimited sentinel and
    /// reports whether the limit changed.
    pub fn set_item_limit(&self, limit: usize) -> bool {
        let changed = self.inner.borrow_mut().config.set_item_limit(limit);
        if changed {
            self.notify_changed();
        }
        changed
    }

    /// Enables or disables the More row and automatic loading.
    pub fn set_more_enabled(&self, enabled: bool) {
        self.inner.borrow_mut().config.more_enabled = enabled;
        self.notify_changed();
    }

    // ── Load state ──────────────────────────────────────────────────────

    /// Clears a Blocked state back to Idle so automatic prefetch resumes.
    /// No-op in any other state.
    pub fn unblock(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.load_state == LoadState::Blocked {
            inner.load_state = LoadState::Idle;
        }
    }

    /// Render-path trigger: call with each row position as it is
    /// materialized. Dispatches a background fetch when the position is
    /// within `preload_count` rows of the end and the engine is Idle with
    /// more data expected. Returns whether a fetch was dispatched.
    ///
    /// The Loading check-and-set happens under a single borrow, so repeated
    /// triggers while a fetch is in flight are no-ops.
    pub fn prefetch_if_needed(&self, position: usize) -> bool {
        let (start, request_size, generation) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.should_prefetch(position) {
                return false;
            }
            inner.load_state = LoadState::Loading;
            let request_size = inner
                .config
                .increment
                .min(inner.config.item_limit() - inner.items.len());
            (inner.loaded_count, request_size, inner.generation)
        };
        self.dispatch_fetch(start, request_size, generation);
        true
    }

    /// Replacement path: clears the store, admits `items` through the same
    /// admission gate, and resets the paging cursor. `has_more` is
    /// recomputed from whether a full first page was supplied.
    pub fn set_data(&self, items: Vec<T>) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.generation += 1;
            let supplied = items.len();
            inner.items.clear();
            inner.append_admitted(items);
            inner.loaded_count = supplied;
            inner.has_more = supplied >= inner.config.increment;
        }
        self.notify_changed();
    }

    // ── Change notification ─────────────────────────────────────────────

    /// Registers a listener invoked after every store or state change that
    /// affects rendering. Returns an id for removal.
    pub fn add_change_listener(&self, listener: Rc<dyn Fn()>) -> u64 {
        let mut inner = self.inner.borrow_mut();
        inner.next_listener_id += 1;
        let id = inner.next_listener_id;
        inner.listeners.push((id, listener));
        id
    }

    pub fn remove_change_listener(&self, id: u64) {
        self.inner
            .borrow_mut()
            .listeners
            .retain(|(listener_id, _)| *listener_id != id);
    }

    fn notify_changed(&self) {
        let listeners = self.inner.borrow().listener_snapshot();
        for listener in listeners {
            listener();
        }
    }

    // ── Background fetch ────────────────────────────────────────────────

    fn dispatch_fetch(&self, start: usize, request_size: usize, generation: u64) {
        log::debug!("req {} + {}", start, request_size);

        // The continuation must not keep the engine alive, so it holds a
        // weak reference and quietly drops the result if the engine is gone.
        let weak = Rc::downgrade(&self.inner);
        let cont_id = self
            .dispatcher
            .register_continuation(move |outcome: FetchOutcome<T>| {
                Self::complete_fetch(&weak, outcome);
            });

        let (fetcher, gate, max_polls, interval) = {
            let inner = self.inner.borrow();
            (
                Arc::clone(&inner.fetcher),
                inner.gate.clone(),
                inner.config.max_ready_polls,
                inner.config.ready_poll_interval,
            )
        };
        let handle = self.dispatcher.handle();

        thread::spawn(move || {
            if let Some(gate) = gate {
                let started = Instant::now();
                let mut polls = 0;
                while !gate.ready_for_load(start, request_size) {
                    if polls >= max_polls {
                        log::warn!(
                            "load gate still closed after {} polls ({:?}); proceeding",
                            polls,
                            started.elapsed()
                        );
                        break;
                    }
                    polls += 1;
                    thread::sleep(interval);
                }
            }
            let result = fetcher.fetch(start, request_size);
            handle.post_invoke(
                cont_id,
                FetchOutcome {
                    generation,
                    request_size,
                    result,
                },
            );
        });
    }

    fn complete_fetch(weak: &Weak<RefCell<EngineInner<T>>>, outcome: FetchOutcome<T>) {
        let Some(inner_rc) = weak.upgrade() else {
            return;
        };
        {
            let mut inner = inner_rc.borrow_mut();
            let stale = outcome.generation != inner.generation;
            if stale && inner.config.stale_results == StaleResultPolicy::Discard {
                log::debug!("discarding stale page (gen {})", outcome.generation);
                if inner.load_state == LoadState::Loading {
                    inner.load_state = LoadState::Idle;
                }
            } else {
                match outcome.result {
                    Ok(page) => {
                        let response_size = page.len();
                        if response_size > 0 {
                            inner.loaded_count += response_size;
                            inner.append_admitted(page);
                        }
                        inner.has_more = response_size >= outcome.request_size;
                        inner.load_state = LoadState::Idle;
                        log::debug!("rsp {}, cnt {}", response_size, inner.items.len());
                    }
                    Err(err) => {
                        // Keep the More row visible as the retry affordance
                        // and suspend loading until an explicit unblock.
                        log::warn!("{}", err);
                        inner.load_state = LoadState::Blocked;
                        inner.has_more = true;
                    }
                }
            }
        }
        let listeners = inner_rc.borrow().listener_snapshot();
        for listener in listeners {
            listener();
        }
    }
}
