//! Hash collections used by the dispatcher's continuation registry.
//!
//! Defaults to `rustc-hash` for cheap `u64` keys; the `std-hash` feature
//! swaps in the standard library hasher for hosts that require it.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::HashMap;
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use rustc_hash::FxHashMap as HashMap;
}
