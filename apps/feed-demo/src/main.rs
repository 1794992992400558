//! Headless feed demo.
//!
//! Drives the paging engine with a fake tweet backend: a simulated scroll
//! walks the virtual rows, prefetches pages on a background thread, binds
//! and recycles row handles through the image coordinator, and finishes
//! with a fling-settle image refresh. Run with `RUST_LOG=debug` to watch
//! the fetch traffic.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pagelist_core::{FetchError, PageFetcher, UiDispatcher};
use pagelist_foundation::{
    AdmissionPolicy, ImageLifecycleCoordinator, LoadState, PagingConfig, PagingEngine, RowHandle,
    RowKind, ScrollState,
};

/// How many rows the fake viewport keeps bound at once.
const VIEWPORT_ROWS: usize = 8;

/// Total tweets the fake backend holds; not a multiple of the page size,
/// so the final page comes back short and paging terminates naturally.
const BACKEND_TOTAL: usize = 57;

#[derive(Clone)]
struct Tweet {
    id: u64,
    author: String,
    text: String,
}

/// Fake backend with deterministic latency. Every ninth entry re-serves the
/// previous tweet (a "retweet"), so the dedup policy has work to do and the
/// store ends up smaller than the loaded count.
struct TweetBackend;

fn backend_entry(n: usize) -> Tweet {
    let id = if n % 9 == 8 { n - 1 } else { n } as u64;
    Tweet {
        id,
        author: format!("@user{}", id % 7),
        text: format!("tweet #{}", id),
    }
}

impl PageFetcher<Tweet> for TweetBackend {
    fn fetch(&self, start: usize, request_size: usize) -> Result<Vec<Tweet>, FetchError> {
        thread::sleep(Duration::from_millis(25));
        let end = (start + request_size).min(BACKEND_TOTAL);
        Ok((start..end).map(backend_entry).collect())
    }
}

struct DedupById;

impl AdmissionPolicy<Tweet> for DedupById {
    fn is_duplicate(&self, incoming: &Tweet, existing: &Tweet) -> bool {
        incoming.id == existing.id
    }
}

/// Row handle that stands in for an avatar-loading view holder.
struct TweetRow {
    id: u64,
    loads: Cell<usize>,
}

impl RowHandle for TweetRow {
    fn recycle_key(&self) -> u64 {
        self.id
    }

    fn begin_image_load(&self) {
        self.loads.set(self.loads.get() + 1);
        log::debug!("avatar load #{} for tweet {}", self.loads.get(), self.id);
    }

    fn cancel_image_load(&self) {
        log::debug!("avatar load cancelled for tweet {}", self.id);
    }
}

fn pump_while_loading(dispatcher: &UiDispatcher, engine: &PagingEngine<Tweet>) {
    while engine.load_state() == LoadState::Loading {
        dispatcher.run_pending();
        thread::sleep(Duration::from_millis(1));
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let dispatcher = UiDispatcher::new();
    let engine = PagingEngine::with_config(
        dispatcher.clone(),
        Arc::new(TweetBackend),
        PagingConfig::new().with_bottom_overlay_height(48.0),
    );
    engine.set_admission_policy(Rc::new(DedupById));
    let mut coordinator = ImageLifecycleCoordinator::new();

    // Simulated scroll: bind each row as it comes on screen, recycle rows
    // that leave the viewport, and let the render path trigger prefetches.
    coordinator.on_scroll_state_changed(ScrollState::TouchScroll);
    let mut bound: VecDeque<Rc<TweetRow>> = VecDeque::new();
    let mut position = 0;
    while position < engine.row_count() {
        match engine.row_kind(position) {
            Some(RowKind::Content(index)) => {
                let row = engine
                    .with_item(index, |tweet| {
                        log::info!("row {:>3}: {} {}", position, tweet.author, tweet.text);
                        Rc::new(TweetRow {
                            id: tweet.id,
                            loads: Cell::new(0),
                        })
                    })
                    .expect("content row index out of range");
                coordinator.on_row_bound(row.clone());
                bound.push_back(row);
                if bound.len() > VIEWPORT_ROWS {
                    let recycled = bound.pop_front().expect("viewport window empty");
                    coordinator.on_row_recycled(recycled.recycle_key());
                }
            }
            Some(RowKind::More) => log::info!("row {:>3}: [loading more…]", position),
            Some(RowKind::BottomPadding) => log::info!("row {:>3}: [bottom spacer]", position),
            None => break,
        }
        engine.prefetch_if_needed(position);
        pump_while_loading(&dispatcher, &engine);
        position += 1;
    }

    log::info!(
        "feed settled: {} tweets stored, {} loaded from backend, has_more={}",
        engine.content_count(),
        engine.loaded_count(),
        engine.has_more()
    );

    // A fling that settles back to idle re-issues the avatar loads for
    // every row still on screen.
    coordinator.on_scroll_state_changed(ScrollState::Fling);
    coordinator.on_scroll_state_changed(ScrollState::Idle);
    log::info!(
        "fling settled: refreshed avatars for {} visible rows",
        coordinator.displayed_count()
    );
}
