//! Test doubles for the pagelist adapter core.
//!
//! Scripted fetchers, counting readiness gates, recording row handles, and
//! a dispatcher pump that stands in for the host UI loop, shared by the
//! library test suites.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use pagelist_core::{FetchError, LoadGate, PageFetcher, UiDispatcher};
use pagelist_foundation::RowHandle;

/// Serves pre-scripted pages in order and records every fetch call.
///
/// Once the script is exhausted, returns empty pages (normal end-of-data).
pub struct ScriptedFetcher<T> {
    pages: Mutex<VecDeque<Result<Vec<T>, FetchError>>>,
    calls: Mutex<Vec<(usize, usize)>>,
    latency: Option<Duration>,
}

impl<T> ScriptedFetcher<T> {
    pub fn new(pages: Vec<Result<Vec<T>, FetchError>>) -> Self {
        Self {
            pages: Mutex::new(pages.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    /// Adds a fixed delay to every fetch, to widen race windows under test.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// `(start, request_size)` of every fetch call so far, in order.
    pub fn calls(&self) -> Vec<(usize, usize)> {
        self.calls.lock().expect("calls poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls poisoned").len()
    }
}

impl<T: Send> PageFetcher<T> for ScriptedFetcher<T> {
    fn fetch(&self, start: usize, request_size: usize) -> Result<Vec<T>, FetchError> {
        self.calls
            .lock()
            .expect("calls poisoned")
            .push((start, request_size));
        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }
        self.pages
            .lock()
            .expect("pages poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Readiness gate that stays closed for the first `closed_polls` queries.
///
/// Use `closed_polls = usize::MAX` for a gate that never opens, to exercise
/// the bounded-wait-then-proceed path.
pub struct CountingGate {
    closed_polls: usize,
    polls: AtomicUsize,
}

impl CountingGate {
    pub fn closed_for(closed_polls: usize) -> Self {
        Self {
            closed_polls,
            polls: AtomicUsize::new(0),
        }
    }

    pub fn never_ready() -> Self {
        Self::closed_for(usize::MAX)
    }

    /// Total readiness queries observed.
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

impl LoadGate for CountingGate {
    fn ready_for_load(&self, _start: usize, _request_size: usize) -> bool {
        let seen = self.polls.fetch_add(1, Ordering::SeqCst);
        seen >= self.closed_polls
    }
}

/// Row handle that counts image begin/cancel calls.
pub struct RecordingRowHandle {
    key: u64,
    begins: Cell<usize>,
    cancels: Cell<usize>,
}

impl RecordingRowHandle {
    pub fn new(key: u64) -> Rc<Self> {
        Rc::new(Self {
            key,
            begins: Cell::new(0),
            cancels: Cell::new(0),
        })
    }

    pub fn begin_count(&self) -> usize {
        self.begins.get()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.get()
    }
}

impl RowHandle for RecordingRowHandle {
    fn recycle_key(&self) -> u64 {
        self.key
    }

    fn begin_image_load(&self) {
        self.begins.set(self.begins.get() + 1);
    }

    fn cancel_image_load(&self) {
        self.cancels.set(self.cancels.get() + 1);
    }
}

/// Drains the dispatcher until `pred` holds or `timeout` elapses.
///
/// Stand-in for the host UI loop in tests: background fetch results only
/// land when the owning thread pumps the queue. Returns whether `pred`
/// became true.
pub fn pump_until(
    dispatcher: &UiDispatcher,
    timeout: Duration,
    mut pred: impl FnMut() -> bool,
) -> bool {
    let started = Instant::now();
    loop {
        dispatcher.run_pending();
        if pred() {
            return true;
        }
        if started.elapsed() > timeout {
            log::warn!("pump_until timed out after {:?}", timeout);
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

/// Pumps the dispatcher for a fixed duration, then returns.
///
/// Used to assert that something does *not* happen within a window.
pub fn pump_for(dispatcher: &UiDispatcher, window: Duration) {
    let started = Instant::now();
    while started.elapsed() < window {
        dispatcher.run_pending();
        thread::sleep(Duration::from_millis(1));
    }
}
