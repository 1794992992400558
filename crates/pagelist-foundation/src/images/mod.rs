//! Image-load lifecycle tied to view recycling and scroll state.

mod coordinator;
mod row_handle;

pub use coordinator::{ImageLifecycleCoordinator, ScrollState};
pub use row_handle::RowHandle;
