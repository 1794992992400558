//! Fetch capability traits supplied by the embedding application.

use crate::FetchError;

/// Opaque "fetch a page" capability.
///
/// `fetch` is a blocking call and is always invoked on a background thread,
/// never on the UI thread. `start` is a cursor position counting every item
/// ever returned by earlier successful fetches (including items the adapter
/// later rejected as duplicates), so backends can page by offset.
///
/// Returning fewer items than `request_size` — including an empty vec —
/// signals normal end-of-data. Failures are reported as [`FetchError`].
pub trait PageFetcher<T>: Send + Sync {
    fn fetch(&self, start: usize, request_size: usize) -> Result<Vec<T>, FetchError>;
}

impl<T, F> PageFetcher<T> for F
where
    F: Fn(usize, usize) -> Result<Vec<T>, FetchError> + Send + Sync,
{
    fn fetch(&self, start: usize, request_size: usize) -> Result<Vec<T>, FetchError> {
        self(start, request_size)
    }
}

/// Readiness gate consulted before a fetch is issued.
///
/// The background task polls this a bounded number of times and then
/// proceeds regardless, so a gate that never opens delays a fetch but cannot
/// starve it.
pub trait LoadGate: Send + Sync {
    fn ready_for_load(&self, start: usize, request_size: usize) -> bool {
        let _ = (start, request_size);
        true
    }
}
