//! Runtime plumbing for the pagelist adapter core.
//!
//! This crate owns the pieces that cross the UI/background boundary:
//! the single-threaded task queue ([`UiDispatcher`]) that delivers fetch
//! results back onto the owning thread, the opaque fetch capability traits
//! ([`PageFetcher`], [`LoadGate`]) supplied by the embedding application,
//! and the [`FetchError`] failure type.

pub mod collections;
mod dispatcher;
mod error;
mod fetcher;

pub use dispatcher::{ContinuationId, DispatcherHandle, UiDispatcher, WakeScheduler};
pub use error::FetchError;
pub use fetcher::{LoadGate, PageFetcher};
