//! Paging configuration.

use std::time::Duration;

/// Default number of items requested per load-more fetch.
pub const DEFAULT_INCREMENT: usize = 20;

/// Default preload lead: a fetch is triggered this many rows before the end.
pub const DEFAULT_PRELOAD_COUNT: usize = 5;

/// Default item ceiling — effectively unbounded.
///
/// `usize::MAX` itself is reserved as the "unlimited" sentinel and is never
/// storable as an explicit limit, so the ceiling check stays unambiguous.
pub const ITEM_COUNT_LIMIT: usize = usize::MAX - 1;

const DEFAULT_MAX_READY_POLLS: u32 = 300;
const DEFAULT_READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What to do with a fetch that resolves after `set_data` replaced the store.
///
/// There is no cooperative cancellation of an in-flight fetch, so the result
/// always arrives; this policy decides whether it is merged or dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StaleResultPolicy {
    /// Merge the late result into the replacement store (legacy behavior).
    #[default]
    Merge,
    /// Drop results dispatched before the most recent `set_data`.
    Discard,
}

/// Tunables for a [`PagingEngine`](super::PagingEngine).
#[derive(Clone, Debug)]
pub struct PagingConfig {
    /// Items requested per load-more fetch.
    pub increment: usize,
    /// Rows before the end at which prefetching starts.
    pub preload_count: usize,
    /// Whether the More row (and automatic loading) is enabled.
    pub more_enabled: bool,
    /// Height of the synthetic bottom spacer row; `None` disables it.
    pub bottom_overlay_height: Option<f32>,
    /// Policy for fetches that outlive a `set_data` replacement.
    pub stale_results: StaleResultPolicy,
    /// Readiness-gate poll cap before a fetch proceeds anyway.
    pub max_ready_polls: u32,
    /// Sleep between readiness-gate polls.
    pub ready_poll_interval: Duration,
    item_limit: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            increment: DEFAULT_INCREMENT,
            preload_count: DEFAULT_PRELOAD_COUNT,
            more_enabled: true,
            bottom_overlay_height: None,
            stale_results: StaleResultPolicy::default(),
            max_ready_polls: DEFAULT_MAX_READY_POLLS,
            ready_poll_interval: DEFAULT_READY_POLL_INTERVAL,
            item_limit: ITEM_COUNT_LIMIT,
        }
    }
}

impl PagingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current item ceiling.
    pub fn item_limit(&self) -> usize {
        self.item_limit
    }

    /// Sets the item ceiling.
    ///
    /// Rejects the reserved unlimited sentinel (`usize::MAX`) and leaves the
    /// limit unchanged in that case.
    pub fn set_item_limit(&mut self, limit: usize) -> bool {
        if limit == usize::MAX {
            log::error!("item limit must be less than usize::MAX");
            return false;
        }
        self.item_limit = limit;
        true
    }

    /// Builder-style variant of [`set_item_limit`](Self::set_item_limit);
    /// invalid limits are ignored.
    pub fn with_item_limit(mut self, limit: usize) -> Self {
        self.set_item_limit(limit);
        self
    }

    pub fn with_increment(mut self, increment: usize) -> Self {
        self.increment = increment;
        self
    }

    pub fn with_preload_count(mut self, preload_count: usize) -> Self {
        self.preload_count = preload_count;
        self
    }

    pub fn with_bottom_overlay_height(mut self, height: f32) -> Self {
        self.bottom_overlay_height = Some(height);
        self
    }

    pub fn with_stale_results(mut self, policy: StaleResultPolicy) -> Self {
        self.stale_results = policy;
        self
    }
}
