//! Paging-aware list adapter foundation.
//!
//! Builds the adapter core on top of `pagelist-core`'s runtime plumbing:
//! the [`PagingEngine`](paging::PagingEngine) that loads list data
//! incrementally on background threads, the synthetic More / bottom-padding
//! row virtualization, and the [`ImageLifecycleCoordinator`](images::ImageLifecycleCoordinator)
//! that ties image loading to view recycling and scroll state.

pub mod images;
pub mod paging;

pub use images::{ImageLifecycleCoordinator, RowHandle, ScrollState};
pub use paging::{
    AdmissionPolicy, AdmitAll, LoadState, PagingConfig, PagingEngine, RowKind, StaleResultPolicy,
};
