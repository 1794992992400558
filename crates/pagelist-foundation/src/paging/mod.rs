//! Incremental paging for list adapters.
//!
//! [`PagingEngine`] owns the loaded-item store and the load state machine,
//! dispatches at most one background fetch at a time, and merges results on
//! the UI thread through the dispatcher. Row-count virtualization (content
//! rows plus the synthetic More and bottom-padding rows) is resolved by the
//! pure functions in [`row_kind`].

mod admission;
mod config;
mod engine;
mod row_kind;

pub use admission::{AdmissionPolicy, AdmitAll};
pub use config::{
    PagingConfig, StaleResultPolicy, DEFAULT_INCREMENT, DEFAULT_PRELOAD_COUNT, ITEM_COUNT_LIMIT,
};
pub use engine::{LoadState, PagingEngine};
pub use row_kind::{resolve_row_kind, RowKind};
