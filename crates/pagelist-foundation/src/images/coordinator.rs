//! Coordinates image loading with view recycling and scroll state.
//!
//! Rows report in as they are bound and recycled; the coordinator issues the
//! matching image begin/cancel calls and, when a fling settles, batch-
//! refreshes every still-displayed row. Owned by the UI thread alongside the
//! engine, so plain `&mut` methods suffice.

use std::rc::Rc;

use smallvec::SmallVec;

use super::row_handle::RowHandle;

/// Typical number of rows visible at once; sizes the inline displayed set.
const DEFAULT_DISPLAYED_ROWS: usize = 8;

/// Scroll state of the hosting list view, as reported by the UI toolkit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollState {
    #[default]
    Idle,
    /// The user is dragging.
    TouchScroll,
    /// Momentum scrolling; image refreshes are deferred by default.
    Fling,
}

/// Tracks displayed rows and drives their image-load lifecycle.
pub struct ImageLifecycleCoordinator {
    displayed: SmallVec<[Rc<dyn RowHandle>; DEFAULT_DISPLAYED_ROWS]>,
    scroll_state: ScrollState,
    refresh_on_fling: bool,
    images_enabled: bool,
}

impl Default for ImageLifecycleCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageLifecycleCoordinator {
    pub fn new() -> Self {
        Self {
            displayed: SmallVec::new(),
            scroll_state: ScrollState::Idle,
            refresh_on_fling: false,
            images_enabled: true,
        }
    }

    /// When `true`, images are also (re)loaded while the list is flinging.
    /// Defaults to `false`: during a fast fling most rows are recycled
    /// before their images would finish anyway.
    pub fn set_refresh_on_fling(&mut self, refresh: bool) {
        self.refresh_on_fling = refresh;
    }

    /// Suppresses all image loading when set to `false`.
    pub fn set_images_enabled(&mut self, enabled: bool) {
        self.images_enabled = enabled;
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll_state
    }

    /// Number of rows currently tracked as displayed.
    pub fn displayed_count(&self) -> usize {
        self.displayed.len()
    }

    /// Whether images should be (re)loaded given the current scroll state.
    pub fn should_refresh_image(&self) -> bool {
        self.scroll_state != ScrollState::Fling || self.refresh_on_fling
    }

    /// A row was bound: track it and start its image load.
    ///
    /// Re-binding an already-tracked key does not duplicate the entry but
    /// still restarts the load.
    pub fn on_row_bound(&mut self, handle: Rc<dyn RowHandle>) {
        let key = handle.recycle_key();
        if !self.displayed.iter().any(|h| h.recycle_key() == key) {
            self.displayed.push(Rc::clone(&handle));
        }
        if self.images_enabled {
            handle.begin_image_load();
        }
    }

    /// A row was recycled: stop tracking it and cancel its image load.
    /// No-op for keys that were never bound.
    pub fn on_row_recycled(&mut self, key: u64) {
        let Some(index) = self
            .displayed
            .iter()
            .position(|handle| handle.recycle_key() == key)
        else {
            return;
        };
        let handle = self.displayed.remove(index);
        // Cancel only; pushing replacement bitmaps at recycle time is what
        // makes fast scrolling visibly stutter.
        handle.cancel_image_load();
    }

    /// The toolkit reported a scroll-state transition.
    ///
    /// Settling out of a fling (into Idle or TouchScroll) batch-refreshes
    /// every displayed row, since their loads were deferred or cancelled
    /// while flinging.
    pub fn on_scroll_state_changed(&mut self, new_state: ScrollState) {
        let old_state = self.scroll_state;
        self.scroll_state = new_state;
        if old_state == ScrollState::Fling
            && matches!(new_state, ScrollState::Idle | ScrollState::TouchScroll)
        {
            self.refresh_displayed_images();
        }
    }

    /// Re-issues `begin_image_load` for every displayed row.
    ///
    /// Iterates a snapshot so handlers that bind or recycle rows from inside
    /// the load callback cannot invalidate the iteration.
    pub fn refresh_displayed_images(&self) {
        if !self.images_enabled {
            return;
        }
        let snapshot: Vec<Rc<dyn RowHandle>> = self.displayed.iter().cloned().collect();
        for handle in snapshot {
            handle.begin_image_load();
        }
    }
}
